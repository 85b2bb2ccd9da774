//! Worksheet record writers and the sheet-stream builder.

use std::io::Write;

use crate::biff::records;
use crate::biff::strings::encode_windows1252_lossy;
use crate::error::Result;
use crate::sheet::SheetData;

use super::{write_bof, write_eof, write_record_header};

/// Default row height: 255 twips with the default-height flag semantics
/// Excel expects for unstyled rows.
const DEFAULT_ROW_HEIGHT: u16 = 0x00FF;

/// LABEL payloads carry a u8 length, capping text at 255 bytes.
const MAX_LABEL_BYTES: usize = 255;

/// Build one sheet's BIFF5 substream: BOF, DIMENSIONS, the ROW directory,
/// the cells in row-major order, EOF.
///
/// Row 0 holds the headers; data rows follow. Every cell goes through the
/// string policy: values parsing as finite doubles (with `,` accepted as the
/// decimal separator) become NUMBER records, everything else LABEL.
pub fn build_worksheet_stream(sheet: &SheetData) -> Result<Vec<u8>> {
    let width = sheet.headers.len() as u16;
    let row_count = 1 + sheet.rows.len() as u16;

    let mut buf = Vec::new();
    write_bof(&mut buf, records::BOF_WORKSHEET)?;
    write_dimensions(&mut buf, row_count, width)?;

    for row in 0..row_count {
        write_row(&mut buf, row, width)?;
    }

    write_string_cells(&mut buf, 0, &sheet.headers)?;
    for (i, row) in sheet.rows.iter().enumerate() {
        write_string_cells(&mut buf, 1 + i as u16, row)?;
    }

    write_eof(&mut buf)?;
    Ok(buf)
}

fn write_string_cells<W: Write>(writer: &mut W, row: u16, values: &[String]) -> Result<()> {
    for (col, value) in values.iter().enumerate() {
        let col = col as u16;
        match parse_cell_number(value) {
            Some(number) => write_number(writer, row, col, number)?,
            None => write_label(writer, row, col, value)?,
        }
    }
    Ok(())
}

/// The number a cell string represents, if any. A comma is accepted as the
/// decimal separator; infinities and NaN stay text.
pub fn parse_cell_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Write DIMENSIONS (0x0200): the used range with exclusive maxima.
fn write_dimensions<W: Write>(writer: &mut W, row_count: u16, width: u16) -> Result<()> {
    write_record_header(writer, records::DIMENSIONS, 10)?;
    writer.write_all(&0u16.to_le_bytes())?;
    writer.write_all(&row_count.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?;
    writer.write_all(&width.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?; // reserved
    Ok(())
}

/// Write ROW (0x0208) for a default-height row spanning the used columns.
fn write_row<W: Write>(writer: &mut W, row: u16, width: u16) -> Result<()> {
    write_record_header(writer, records::ROW, 16)?;
    writer.write_all(&row.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?; // first used column
    writer.write_all(&width.to_le_bytes())?; // last used column, exclusive
    writer.write_all(&DEFAULT_ROW_HEIGHT.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?; // option flags
    Ok(())
}

/// Write NUMBER (0x0203): row, col, default XF, IEEE 754 double.
fn write_number<W: Write>(writer: &mut W, row: u16, col: u16, value: f64) -> Result<()> {
    write_record_header(writer, records::NUMBER, 14)?;
    writer.write_all(&row.to_le_bytes())?;
    writer.write_all(&col.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?; // xf
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Write LABEL (0x0204) with a u8-prefixed Windows-1252 string.
fn write_label<W: Write>(writer: &mut W, row: u16, col: u16, value: &str) -> Result<()> {
    let bytes = encode_windows1252_lossy(value, MAX_LABEL_BYTES);
    write_record_header(writer, records::LABEL, 6 + 1 + bytes.len() as u16)?;
    writer.write_all(&row.to_le_bytes())?;
    writer.write_all(&col.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?; // xf
    writer.write_all(&[bytes.len() as u8])?;
    writer.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biff::records::{Record, RecordIter};

    fn sheet() -> SheetData {
        SheetData::new(
            "S1",
            vec!["A".to_string(), "B".to_string()],
            vec![
                vec!["hi".to_string(), "42".to_string()],
                vec!["x".to_string(), "3,14".to_string()],
            ],
        )
    }

    fn sids(stream: &[u8]) -> Vec<u16> {
        RecordIter::new(stream).map(|r| r.sid).collect()
    }

    #[test]
    fn number_policy() {
        assert_eq!(parse_cell_number("42"), Some(42.0));
        assert_eq!(parse_cell_number(" 3,14 "), Some(3.14));
        assert_eq!(parse_cell_number("-1e3"), Some(-1000.0));
        assert_eq!(parse_cell_number("hi"), None);
        assert_eq!(parse_cell_number(""), None);
        assert_eq!(parse_cell_number("inf"), None);
        assert_eq!(parse_cell_number("NaN"), None);
        assert_eq!(parse_cell_number("1,2,3"), None);
    }

    #[test]
    fn stream_record_order() {
        let stream = build_worksheet_stream(&sheet()).unwrap();
        assert_eq!(
            sids(&stream),
            vec![
                records::BOF,
                records::DIMENSIONS,
                records::ROW,
                records::ROW,
                records::ROW,
                records::LABEL,
                records::LABEL,
                records::LABEL,
                records::NUMBER,
                records::LABEL,
                records::NUMBER,
                records::EOF,
            ]
        );
    }

    #[test]
    fn dimensions_cover_grid() {
        let stream = build_worksheet_stream(&sheet()).unwrap();
        let dims: Record<'_> = RecordIter::new(&stream)
            .find(|r| r.sid == records::DIMENSIONS)
            .unwrap();
        assert_eq!(dims.data.len(), 10);
        assert_eq!(u16::from_le_bytes([dims.data[2], dims.data[3]]), 3); // rows: header + 2
        assert_eq!(u16::from_le_bytes([dims.data[6], dims.data[7]]), 2); // cols
    }

    #[test]
    fn label_truncates_to_255_bytes() {
        let long = "x".repeat(300);
        let data = SheetData::new("S", vec![long], vec![]);
        let stream = build_worksheet_stream(&data).unwrap();
        let label = RecordIter::new(&stream)
            .find(|r| r.sid == records::LABEL)
            .unwrap();
        assert_eq!(label.data[6], 255);
        assert_eq!(label.data.len(), 6 + 1 + 255);
    }
}
