//! BIFF5 record writers and stream builders.
//!
//! Record layout: 2-byte id, 2-byte payload length, payload. The worksheet
//! builder emits one sheet's substream; the workbook builder wraps it in the
//! globals substream and back-patches the BOUNDSHEET offset once the sheet's
//! position is known.

use std::io::Write;

use crate::error::Result;

/// Workbook globals writers and the full-stream builder
pub mod workbook;

/// Worksheet record writers and the sheet-stream builder
pub mod worksheet;

/// Write a record header.
#[inline]
pub(crate) fn write_record_header<W: Write>(writer: &mut W, sid: u16, data_len: u16) -> Result<()> {
    writer.write_all(&sid.to_le_bytes())?;
    writer.write_all(&data_len.to_le_bytes())?;
    Ok(())
}

/// Write BOF (0x0809) for a BIFF5 substream.
///
/// BIFF5 BOF carries 8 bytes: version, substream type, build id, build year.
pub(crate) fn write_bof<W: Write>(writer: &mut W, substream_type: u16) -> Result<()> {
    write_record_header(writer, super::records::BOF, 8)?;
    writer.write_all(&0x0500u16.to_le_bytes())?;
    writer.write_all(&substream_type.to_le_bytes())?;
    writer.write_all(&0x0DBBu16.to_le_bytes())?;
    writer.write_all(&0x07CCu16.to_le_bytes())?;
    Ok(())
}

/// Write EOF (0x000A).
pub(crate) fn write_eof<W: Write>(writer: &mut W) -> Result<()> {
    write_record_header(writer, super::records::EOF, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bof_layout() {
        let mut buf = Vec::new();
        write_bof(&mut buf, 0x0005).unwrap();
        assert_eq!(&buf[0..2], &[0x09, 0x08]);
        assert_eq!(&buf[2..4], &[8, 0]);
        assert_eq!(&buf[4..6], &[0x00, 0x05]); // BIFF5 version
        assert_eq!(&buf[6..8], &[0x05, 0x00]); // globals substream
    }

    #[test]
    fn eof_layout() {
        let mut buf = Vec::new();
        write_eof(&mut buf).unwrap();
        assert_eq!(buf, vec![0x0A, 0x00, 0x00, 0x00]);
    }
}
