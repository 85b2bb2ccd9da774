//! Workbook globals parsing and the stream-to-model driver.

use crate::cfb::binary::{read_u16_le, read_u32_le};
use crate::error::{Error, Result};
use crate::sheet::Workbook;

use super::records::{self, BiffVersion, BofRecord, RecordIter};
use super::strings;
use super::worksheet;

/// One BOUNDSHEET entry: a sheet name and the absolute offset of the
/// sheet's BOF record within the workbook stream.
#[derive(Debug, Clone)]
pub struct BoundSheet {
    pub name: String,
    pub offset: u32,
}

/// Everything the globals substream contributes to decoding sheets.
#[derive(Debug)]
pub struct WorkbookGlobals {
    pub version: BiffVersion,
    pub codepage: u16,
    pub bound_sheets: Vec<BoundSheet>,
    pub shared_strings: Vec<String>,
}

/// Parse the globals substream: from offset 0 up to its EOF.
///
/// Collects the BIFF version, the code page, every BOUNDSHEET in order, and
/// the first shared string table together with the CONTINUE records that
/// spill it. Unknown record ids are skipped.
pub fn parse_globals(stream: &[u8]) -> Result<WorkbookGlobals> {
    let mut version = BiffVersion::Biff8;
    let mut codepage = 1252u16;
    let mut bound_sheets = Vec::new();
    let mut sst_segments: Vec<&[u8]> = Vec::new();
    let mut in_sst_spill = false;
    let mut saw_bof = false;

    for record in RecordIter::new(stream) {
        if in_sst_spill {
            if record.sid == records::CONTINUE {
                sst_segments.push(record.data);
                continue;
            }
            in_sst_spill = false;
        }

        match record.sid {
            records::BOF if !saw_bof => {
                version = BofRecord::parse(record.data)?.version;
                saw_bof = true;
            }
            records::CODEPAGE if record.data.len() >= 2 => {
                let cp = read_u16_le(record.data, 0)?;
                // 1200 marks UTF-16 workbooks; their compressed bytes still
                // decode like Windows-1252.
                codepage = if cp == 1200 { 1252 } else { cp };
            }
            records::BOUNDSHEET => {
                bound_sheets.push(parse_boundsheet(record.data, version, codepage)?);
            }
            records::SST if sst_segments.is_empty() => {
                sst_segments.push(record.data);
                in_sst_spill = true;
            }
            records::EOF => break,
            _ => {}
        }
    }

    let shared_strings = if sst_segments.is_empty() {
        Vec::new()
    } else {
        strings::parse_sst(&sst_segments, codepage)?
    };

    Ok(WorkbookGlobals {
        version,
        codepage,
        bound_sheets,
        shared_strings,
    })
}

fn parse_boundsheet(data: &[u8], version: BiffVersion, codepage: u16) -> Result<BoundSheet> {
    if data.len() < 6 {
        return Err(Error::Parse(format!("BOUNDSHEET record of {} bytes", data.len())));
    }

    let offset = read_u32_le(data, 0)?;
    // data[4] = visibility state, data[5] = sheet type; both irrelevant here
    let name = match version {
        BiffVersion::Biff5 => strings::parse_biff5_short_string(&data[6..], codepage)?,
        BiffVersion::Biff8 => strings::parse_biff8_string(&data[6..], codepage)?,
    };

    Ok(BoundSheet { name, offset })
}

/// Decode a whole workbook stream into the in-memory model.
pub fn parse_workbook(stream: &[u8]) -> Result<Workbook> {
    let globals = parse_globals(stream)?;
    log::debug!(
        "workbook globals: {:?}, {} sheets, {} shared strings",
        globals.version,
        globals.bound_sheets.len(),
        globals.shared_strings.len()
    );

    let mut workbook = Workbook::default();
    for bound in &globals.bound_sheets {
        let sheet = worksheet::parse_sheet(stream, bound, &globals)?;
        workbook.sheets.push(sheet);
    }
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sid: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&sid.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn globals_bof(version: u16) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&version.to_le_bytes());
        payload.extend_from_slice(&records::BOF_WORKBOOK_GLOBALS.to_le_bytes());
        payload.extend_from_slice(&[0u8; 4]);
        record(records::BOF, &payload)
    }

    fn boundsheet5(offset: u32, name: &str) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&offset.to_le_bytes());
        payload.push(0); // visible
        payload.push(0); // worksheet
        payload.push(name.len() as u8);
        payload.extend_from_slice(name.as_bytes());
        record(records::BOUNDSHEET, &payload)
    }

    #[test]
    fn collects_bound_sheets_in_order() {
        let mut stream = globals_bof(0x0500);
        stream.extend_from_slice(&boundsheet5(100, "First"));
        stream.extend_from_slice(&boundsheet5(200, "Second"));
        stream.extend_from_slice(&record(records::EOF, &[]));

        let globals = parse_globals(&stream).unwrap();
        assert_eq!(globals.version, BiffVersion::Biff5);
        assert_eq!(globals.bound_sheets.len(), 2);
        assert_eq!(globals.bound_sheets[0].name, "First");
        assert_eq!(globals.bound_sheets[0].offset, 100);
        assert_eq!(globals.bound_sheets[1].name, "Second");
    }

    #[test]
    fn biff8_boundsheet_name() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&300u32.to_le_bytes());
        payload.extend_from_slice(&[0, 0]);
        payload.extend_from_slice(&4u16.to_le_bytes());
        payload.push(0x00);
        payload.extend_from_slice(b"Data");

        let mut stream = globals_bof(0x0600);
        stream.extend_from_slice(&record(records::BOUNDSHEET, &payload));
        stream.extend_from_slice(&record(records::EOF, &[]));

        let globals = parse_globals(&stream).unwrap();
        assert_eq!(globals.version, BiffVersion::Biff8);
        assert_eq!(globals.bound_sheets[0].name, "Data");
        assert_eq!(globals.bound_sheets[0].offset, 300);
    }

    #[test]
    fn stitches_sst_continue_records() {
        // 2 strings; the second spills into a CONTINUE mid-characters.
        let mut sst = Vec::new();
        sst.extend_from_slice(&2u32.to_le_bytes());
        sst.extend_from_slice(&2u32.to_le_bytes());
        sst.extend_from_slice(&2u16.to_le_bytes());
        sst.push(0x00);
        sst.extend_from_slice(b"ab");
        sst.extend_from_slice(&6u16.to_le_bytes());
        sst.push(0x00);
        sst.extend_from_slice(b"cde");

        let mut cont = vec![0x00u8];
        cont.extend_from_slice(b"fgh");

        let mut stream = globals_bof(0x0600);
        stream.extend_from_slice(&record(records::SST, &sst));
        stream.extend_from_slice(&record(records::CONTINUE, &cont));
        stream.extend_from_slice(&record(records::EOF, &[]));

        let globals = parse_globals(&stream).unwrap();
        assert_eq!(globals.shared_strings, vec!["ab".to_string(), "cdefgh".to_string()]);
    }

    #[test]
    fn unknown_records_are_skipped() {
        let mut stream = globals_bof(0x0600);
        stream.extend_from_slice(&record(0x0FFF, &[1, 2, 3]));
        stream.extend_from_slice(&record(records::EOF, &[]));
        assert!(parse_globals(&stream).is_ok());
    }

    #[test]
    fn empty_stream_yields_empty_globals() {
        let globals = parse_globals(&[]).unwrap();
        assert!(globals.bound_sheets.is_empty());
        assert!(globals.shared_strings.is_empty());
    }
}
