//! BIFF record ids, the record cursor, and fixed-layout record parsers.

use crate::cfb::binary::{read_u16_le, read_u32_le};
use crate::error::{Error, Result};

// ── Stream structure ────────────────────────────────────────────────────
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// ── Workbook globals ────────────────────────────────────────────────────
pub const BOUNDSHEET: u16 = 0x0085;
pub const SST: u16 = 0x00FC;
pub const CODEPAGE: u16 = 0x0042;
pub const WINDOW1: u16 = 0x003D;
pub const FONT: u16 = 0x0031;
pub const XF: u16 = 0x00E0;

// ── Sheet structure ─────────────────────────────────────────────────────
pub const DIMENSIONS: u16 = 0x0200;
pub const ROW: u16 = 0x0208;

// ── Cell records ────────────────────────────────────────────────────────
pub const NUMBER: u16 = 0x0203;
pub const RK: u16 = 0x027E;
pub const LABEL: u16 = 0x0204;
pub const LABELSST: u16 = 0x00FD;
pub const MULRK: u16 = 0x00BD;
pub const FORMULA: u16 = 0x0006;
pub const BLANK: u16 = 0x0201;
pub const MULBLANK: u16 = 0x00BE;

// ── BOF substream types ─────────────────────────────────────────────────
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_WORKSHEET: u16 = 0x0010;

/// One record: id, payload slice, and the record's absolute start offset.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub sid: u16,
    pub data: &'a [u8],
    /// Offset of the 4-byte record header within the stream
    pub offset: usize,
}

/// Cursor over a BIFF stream held in memory.
///
/// Yields records in file order; a truncated trailing record ends iteration
/// cleanly. `seek` supports the absolute jumps BOUNDSHEET offsets describe.
#[derive(Debug)]
pub struct RecordIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        RecordIter { data, pos: 0 }
    }

    /// Reposition the cursor to an absolute stream offset.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        let header_end = self.pos.checked_add(4)?;
        if header_end > self.data.len() {
            return None;
        }

        let sid = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        let len = u16::from_le_bytes([self.data[self.pos + 2], self.data[self.pos + 3]]) as usize;

        let data_end = header_end.checked_add(len)?;
        if data_end > self.data.len() {
            // Partial record tail: treat as a clean end of the stream.
            return None;
        }

        let record = Record {
            sid,
            data: &self.data[header_end..data_end],
            offset: self.pos,
        };
        self.pos = data_end;
        Some(record)
    }
}

/// BIFF stream versions the reader distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiffVersion {
    Biff5,
    Biff8,
}

impl BiffVersion {
    /// Interpret the version field of a BOF payload. Anything unrecognized
    /// is treated as BIFF8, the most permissive decoding.
    pub fn from_bof(version: u16) -> Self {
        match version {
            0x0500 => BiffVersion::Biff5,
            0x0600 => BiffVersion::Biff8,
            other => {
                log::debug!("unrecognized BOF version 0x{other:04X}, assuming BIFF8");
                BiffVersion::Biff8
            }
        }
    }
}

/// BOF payload: stream version and substream type.
#[derive(Debug, Clone, Copy)]
pub struct BofRecord {
    pub version: BiffVersion,
    pub substream: u16,
}

impl BofRecord {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::Parse(format!("BOF record of {} bytes", data.len())));
        }
        let version = read_u16_le(data, 0)?;
        let substream = read_u16_le(data, 2)?;
        Ok(BofRecord {
            version: BiffVersion::from_bof(version),
            substream,
        })
    }
}

/// DIMENSIONS payload: the sheet's used range, exclusive maxima.
///
/// BIFF5 stores four u16 fields; BIFF8 widens the rows to u32.
#[derive(Debug, Clone, Copy)]
pub struct DimensionsRecord {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

impl DimensionsRecord {
    pub fn parse(data: &[u8]) -> Result<Self> {
        match data.len() {
            10 => Ok(DimensionsRecord {
                first_row: read_u16_le(data, 0)? as u32,
                last_row: read_u16_le(data, 2)? as u32,
                first_col: read_u16_le(data, 4)?,
                last_col: read_u16_le(data, 6)?,
            }),
            14 => Ok(DimensionsRecord {
                first_row: read_u32_le(data, 0)?,
                last_row: read_u32_le(data, 4)?,
                first_col: read_u16_le(data, 8)?,
                last_col: read_u16_le(data, 10)?,
            }),
            n => Err(Error::Parse(format!("DIMENSIONS record of {n} bytes"))),
        }
    }
}

/// Decode an RK packed number.
///
/// Bit 0 requests a final division by 100; bit 1 selects the integer
/// encoding. Integers occupy the high 30 bits as a signed value; floats
/// occupy the high 30 bits of an IEEE 754 double whose low 34 bits are zero.
pub fn decode_rk(rk: u32) -> f64 {
    let mult100 = rk & 0x1 != 0;
    let is_int = rk & 0x2 != 0;

    let mut value = if is_int {
        ((rk as i32) >> 2) as f64
    } else {
        f64::from_bits(((rk & 0xFFFF_FFFC) as u64) << 32)
    };

    if mult100 {
        value /= 100.0;
    }
    value
}
