//! Per-sheet cell decoding.
//!
//! Starting from a sheet's BOF offset, decodes the cell records of that
//! substream into the sparse grid. All numeric encodings surface as
//! [`CellValue::Number`]; anything the reader does not implement is skipped.

use crate::cfb::binary::{read_f64_le, read_u16_le, read_u32_le};
use crate::error::{Error, Result};
use crate::sheet::{Cell, CellValue, Sheet};

use super::records::{self, decode_rk, BiffVersion, BofRecord, DimensionsRecord, RecordIter};
use super::strings;
use super::workbook::{BoundSheet, WorkbookGlobals};

/// Decode the substream at `bound.offset` into a sheet.
pub fn parse_sheet(stream: &[u8], bound: &BoundSheet, globals: &WorkbookGlobals) -> Result<Sheet> {
    let offset = bound.offset as usize;
    if offset >= stream.len() {
        return Err(Error::Parse(format!(
            "sheet `{}` offset {offset} is outside the workbook stream",
            bound.name
        )));
    }

    let mut iter = RecordIter::new(stream);
    iter.seek(offset);

    let Some(first) = iter.next() else {
        return Err(Error::Parse(format!("sheet `{}` has no records", bound.name)));
    };
    if first.sid != records::BOF {
        return Err(Error::Parse(format!(
            "sheet `{}` offset does not point at a BOF record",
            bound.name
        )));
    }
    BofRecord::parse(first.data)?;

    let mut sheet = Sheet::new(bound.name.clone());
    for record in iter {
        match record.sid {
            records::EOF => break,
            records::DIMENSIONS => {
                // Advisory only; the grid stays sparse either way
                if let Ok(dims) = DimensionsRecord::parse(record.data) {
                    log::debug!(
                        "sheet `{}` used range: rows {}..{}, cols {}..{}",
                        bound.name,
                        dims.first_row,
                        dims.last_row,
                        dims.first_col,
                        dims.last_col
                    );
                }
            }
            records::NUMBER => {
                let (row, col) = cell_position(record.data)?;
                let value = read_f64_le(record.data, 6)?;
                sheet.insert(Cell::new(row, col, CellValue::Number(value)));
            }
            records::RK => {
                let (row, col) = cell_position(record.data)?;
                let rk = read_u32_le(record.data, 6)?;
                sheet.insert(Cell::new(row, col, CellValue::Number(decode_rk(rk))));
            }
            records::LABEL => {
                let (row, col) = cell_position(record.data)?;
                let name_data = record
                    .data
                    .get(6..)
                    .ok_or_else(|| Error::Parse("LABEL record has no string".into()))?;
                let text = parse_label(name_data, globals)?;
                sheet.insert(Cell::new(row, col, CellValue::Text(text)));
            }
            records::LABELSST => {
                let (row, col) = cell_position(record.data)?;
                let index = read_u32_le(record.data, 6)? as usize;
                match globals.shared_strings.get(index) {
                    Some(text) => {
                        sheet.insert(Cell::new(row, col, CellValue::Text(text.clone())));
                    }
                    None => log::warn!(
                        "sheet `{}`: LABELSST index {index} outside table of {}, skipping cell",
                        bound.name,
                        globals.shared_strings.len()
                    ),
                }
            }
            records::MULRK => decode_mulrk(record.data, &mut sheet)?,
            records::FORMULA => {
                let (row, col) = cell_position(record.data)?;
                if let Some(value) = cached_formula_number(record.data)? {
                    sheet.insert(Cell::new(row, col, CellValue::Number(value)));
                }
            }
            // Formatting-only cells carry no value
            records::BLANK | records::MULBLANK => {}
            _ => {}
        }
    }

    Ok(sheet)
}

/// The `row | col` prefix every cell record starts with.
fn cell_position(data: &[u8]) -> Result<(u32, u32)> {
    let row = read_u16_le(data, 0)?;
    let col = read_u16_le(data, 2)?;
    Ok((row as u32, col as u32))
}

fn parse_label(data: &[u8], globals: &WorkbookGlobals) -> Result<String> {
    match globals.version {
        BiffVersion::Biff5 => strings::parse_biff5_short_string(data, globals.codepage),
        BiffVersion::Biff8 => strings::parse_biff8_string(data, globals.codepage),
    }
}

/// MULRK: `row | firstCol | {xf, rk}* | lastCol`, one cell per pair.
fn decode_mulrk(data: &[u8], sheet: &mut Sheet) -> Result<()> {
    if data.len() < 6 {
        return Err(Error::Parse(format!("MULRK record of {} bytes", data.len())));
    }

    let row = read_u16_le(data, 0)? as u32;
    let first_col = read_u16_le(data, 2)? as u32;
    let pairs = (data.len() - 6) / 6;

    let last_col = read_u16_le(data, data.len() - 2)? as u32;
    if last_col.saturating_sub(first_col) + 1 != pairs as u32 {
        log::warn!(
            "MULRK pair count {pairs} disagrees with column range {first_col}..={last_col}"
        );
    }

    for i in 0..pairs {
        // Skip the 2-byte xf of each pair
        let rk = read_u32_le(data, 4 + i * 6 + 2)?;
        let col = first_col + i as u32;
        sheet.insert(Cell::new(row, col, CellValue::Number(decode_rk(rk))));
    }
    Ok(())
}

/// The cached result of a FORMULA record, when it is a usable number.
///
/// Non-numeric results store 0xFFFF in bytes 6..8 of the cached field with a
/// type discriminant in byte 0; those and non-finite doubles yield `None`.
fn cached_formula_number(data: &[u8]) -> Result<Option<f64>> {
    if data.len() < 14 {
        return Err(Error::Parse(format!("FORMULA record of {} bytes", data.len())));
    }

    let cached = &data[6..14];
    if cached[6] == 0xFF && cached[7] == 0xFF {
        return Ok(None);
    }

    let value = read_f64_le(cached, 0)?;
    Ok(value.is_finite().then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biff::records::{BOF, BOF_WORKSHEET, EOF, FORMULA, LABEL, LABELSST, MULRK, NUMBER, RK};

    fn record(sid: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&sid.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn sheet_bof() -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0x0500u16.to_le_bytes());
        payload.extend_from_slice(&BOF_WORKSHEET.to_le_bytes());
        payload.extend_from_slice(&[0u8; 4]);
        record(BOF, &payload)
    }

    fn cell_prefix(row: u16, col: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&row.to_le_bytes());
        out.extend_from_slice(&col.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // xf
        out
    }

    fn globals(version: BiffVersion, shared: Vec<String>) -> WorkbookGlobals {
        WorkbookGlobals {
            version,
            codepage: 1252,
            bound_sheets: Vec::new(),
            shared_strings: shared,
        }
    }

    fn parse(stream: &[u8], globals: &WorkbookGlobals) -> Sheet {
        let bound = BoundSheet {
            name: "T".to_string(),
            offset: 0,
        };
        parse_sheet(stream, &bound, globals).unwrap()
    }

    #[test]
    fn decodes_number_rk_and_label_cells() {
        let mut stream = sheet_bof();

        let mut number = cell_prefix(0, 0);
        number.extend_from_slice(&42.5f64.to_le_bytes());
        stream.extend_from_slice(&record(NUMBER, &number));

        let mut rk = cell_prefix(0, 1);
        rk.extend_from_slice(&0x3FF0_0001u32.to_le_bytes()); // 1.0 / 100
        stream.extend_from_slice(&record(RK, &rk));

        let mut label = cell_prefix(1, 0);
        label.push(2);
        label.extend_from_slice(b"ok");
        stream.extend_from_slice(&record(LABEL, &label));

        stream.extend_from_slice(&record(EOF, &[]));

        let sheet = parse(&stream, &globals(BiffVersion::Biff5, vec![]));
        assert_eq!(sheet.value(0, 0), Some(&CellValue::Number(42.5)));
        assert_eq!(sheet.value(0, 1), Some(&CellValue::Number(0.01)));
        assert_eq!(sheet.value(1, 0), Some(&CellValue::Text("ok".into())));
    }

    #[test]
    fn labelsst_resolves_and_skips_out_of_range() {
        let mut stream = sheet_bof();

        let mut ok = cell_prefix(0, 0);
        ok.extend_from_slice(&1u32.to_le_bytes());
        stream.extend_from_slice(&record(LABELSST, &ok));

        let mut bad = cell_prefix(0, 1);
        bad.extend_from_slice(&9u32.to_le_bytes());
        stream.extend_from_slice(&record(LABELSST, &bad));

        stream.extend_from_slice(&record(EOF, &[]));

        let shared = vec!["zero".to_string(), "one".to_string()];
        let sheet = parse(&stream, &globals(BiffVersion::Biff8, shared));
        assert_eq!(sheet.value(0, 0), Some(&CellValue::Text("one".into())));
        assert_eq!(sheet.value(0, 1), None);
    }

    #[test]
    fn mulrk_spreads_over_columns() {
        let mut stream = sheet_bof();

        // Row 3, columns 2..=4: integers 1, 2, 3
        let mut mulrk = Vec::new();
        mulrk.extend_from_slice(&3u16.to_le_bytes());
        mulrk.extend_from_slice(&2u16.to_le_bytes());
        for value in [1i32, 2, 3] {
            mulrk.extend_from_slice(&0u16.to_le_bytes()); // xf
            mulrk.extend_from_slice(&(((value << 2) as u32) | 0x2).to_le_bytes());
        }
        mulrk.extend_from_slice(&4u16.to_le_bytes());
        stream.extend_from_slice(&record(MULRK, &mulrk));
        stream.extend_from_slice(&record(EOF, &[]));

        let sheet = parse(&stream, &globals(BiffVersion::Biff8, vec![]));
        assert_eq!(sheet.value(3, 2), Some(&CellValue::Number(1.0)));
        assert_eq!(sheet.value(3, 3), Some(&CellValue::Number(2.0)));
        assert_eq!(sheet.value(3, 4), Some(&CellValue::Number(3.0)));
        assert_eq!(sheet.value(3, 5), None);
    }

    #[test]
    fn formula_cached_number_and_skipped_discriminants() {
        let mut stream = sheet_bof();

        // Numeric cached result
        let mut numeric = cell_prefix(0, 0);
        numeric.extend_from_slice(&7.25f64.to_le_bytes());
        numeric.extend_from_slice(&[0u8; 6]); // flags + chn
        stream.extend_from_slice(&record(FORMULA, &numeric));

        // String discriminant: byte 0 = 0, bytes 6..7 = 0xFFFF
        let mut string_result = cell_prefix(0, 1);
        string_result.extend_from_slice(&[0x00, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
        string_result.extend_from_slice(&[0u8; 6]);
        stream.extend_from_slice(&record(FORMULA, &string_result));

        stream.extend_from_slice(&record(EOF, &[]));

        let sheet = parse(&stream, &globals(BiffVersion::Biff8, vec![]));
        assert_eq!(sheet.value(0, 0), Some(&CellValue::Number(7.25)));
        assert_eq!(sheet.value(0, 1), None);
    }

    #[test]
    fn bad_offset_is_rejected() {
        let globals = globals(BiffVersion::Biff8, vec![]);
        let bound = BoundSheet {
            name: "T".to_string(),
            offset: 999,
        };
        let stream = sheet_bof();
        assert!(matches!(
            parse_sheet(&stream, &bound, &globals),
            Err(Error::Parse(_))
        ));

        let not_bof = record(EOF, &[]);
        let bound0 = BoundSheet {
            name: "T".to_string(),
            offset: 0,
        };
        assert!(matches!(
            parse_sheet(&not_bof, &bound0, &globals),
            Err(Error::Parse(_))
        ));
    }
}
