//! Workbook globals writers and the full-stream builder.

use std::io::Write;

use crate::biff::records;
use crate::biff::strings::encode_windows1252_lossy;
use crate::error::Result;
use crate::sheet::SheetData;

use super::worksheet::build_worksheet_stream;
use super::{write_bof, write_eof, write_record_header};

/// Windows-1252, the code page every string in the stream is encoded with.
const CODEPAGE_1252: u16 = 0x04E4;

/// Sheet names are stored with a u8 length; BIFF5 allows at most 31 bytes.
const MAX_SHEET_NAME_BYTES: usize = 31;

/// Build the complete workbook stream for one sheet.
///
/// The globals substream is emitted with a zero placeholder in its
/// BOUNDSHEET record; once the worksheet substream is appended, the byte
/// position where it landed is patched into that offset field.
pub fn build_workbook_stream(sheet: &SheetData) -> Result<Vec<u8>> {
    let worksheet = build_worksheet_stream(sheet)?;

    let mut buf = Vec::new();
    write_bof(&mut buf, records::BOF_WORKBOOK_GLOBALS)?;
    write_codepage(&mut buf)?;
    write_window1(&mut buf)?;
    write_font(&mut buf, "Arial", 10)?;
    write_default_xf(&mut buf)?;
    let offset_field = write_boundsheet_placeholder(&mut buf, &sheet.name)?;
    write_eof(&mut buf)?;

    let sheet_bof_offset = buf.len() as u32;
    buf.extend_from_slice(&worksheet);
    buf[offset_field..offset_field + 4].copy_from_slice(&sheet_bof_offset.to_le_bytes());

    Ok(buf)
}

/// Write CODEPAGE (0x0042).
fn write_codepage<W: Write>(writer: &mut W) -> Result<()> {
    write_record_header(writer, records::CODEPAGE, 2)?;
    writer.write_all(&CODEPAGE_1252.to_le_bytes())?;
    Ok(())
}

/// Write WINDOW1 (0x003D): default workbook window geometry, one selected
/// tab, tab bar at ratio 600.
fn write_window1<W: Write>(writer: &mut W) -> Result<()> {
    write_record_header(writer, records::WINDOW1, 18)?;
    writer.write_all(&0u16.to_le_bytes())?; // x position
    writer.write_all(&0u16.to_le_bytes())?; // y position
    writer.write_all(&0x3000u16.to_le_bytes())?; // width
    writer.write_all(&0x1E00u16.to_le_bytes())?; // height
    writer.write_all(&0x0038u16.to_le_bytes())?; // option flags
    writer.write_all(&0u16.to_le_bytes())?; // active sheet
    writer.write_all(&0u16.to_le_bytes())?; // first visible tab
    writer.write_all(&1u16.to_le_bytes())?; // selected tab count
    writer.write_all(&600u16.to_le_bytes())?; // tab bar ratio
    Ok(())
}

/// Write FONT (0x0031) for an upright font at the given point size.
fn write_font<W: Write>(writer: &mut W, name: &str, points: u16) -> Result<()> {
    let name_bytes = encode_windows1252_lossy(name, u8::MAX as usize);
    write_record_header(writer, records::FONT, 14 + 1 + name_bytes.len() as u16)?;
    writer.write_all(&(points * 20).to_le_bytes())?; // height in twips
    writer.write_all(&0u16.to_le_bytes())?; // attribute flags
    writer.write_all(&0x7FFFu16.to_le_bytes())?; // automatic color
    writer.write_all(&400u16.to_le_bytes())?; // weight: normal
    writer.write_all(&0u16.to_le_bytes())?; // no super/subscript
    writer.write_all(&[0u8])?; // no underline
    writer.write_all(&[0u8])?; // family: any
    writer.write_all(&[0u8])?; // charset: ANSI
    writer.write_all(&[0u8])?; // reserved
    writer.write_all(&[name_bytes.len() as u8])?;
    writer.write_all(&name_bytes)?;
    Ok(())
}

/// Write the single default XF (0x00E0) every cell record references.
fn write_default_xf<W: Write>(writer: &mut W) -> Result<()> {
    write_record_header(writer, records::XF, 16)?;
    writer.write_all(&0u16.to_le_bytes())?; // font index
    writer.write_all(&0u16.to_le_bytes())?; // format index
    writer.write_all(&0x0001u16.to_le_bytes())?; // locked, cell XF
    writer.write_all(&[0u8; 10])?; // alignment, borders, fill: defaults
    Ok(())
}

/// Write BOUNDSHEET (0x0085) with a zero offset, returning the absolute
/// buffer position of the 4-byte offset field for later patching.
fn write_boundsheet_placeholder(buf: &mut Vec<u8>, name: &str) -> Result<usize> {
    let name_bytes = encode_windows1252_lossy(name, MAX_SHEET_NAME_BYTES);
    write_record_header(buf, records::BOUNDSHEET, 4 + 2 + 1 + name_bytes.len() as u16)?;

    let offset_field = buf.len();
    buf.extend_from_slice(&0u32.to_le_bytes()); // patched after append
    buf.push(0); // visible
    buf.push(0); // worksheet
    buf.push(name_bytes.len() as u8);
    buf.extend_from_slice(&name_bytes);
    Ok(offset_field)
}
