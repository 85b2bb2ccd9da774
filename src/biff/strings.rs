//! BIFF string decoding and the writer's Windows-1252 encoding.
//!
//! 8-bit ("compressed") characters are decoded through the workbook code
//! page. Shared-string payloads may spill across CONTINUE records, and a
//! continuation that starts mid-string opens with a fresh option-flags byte
//! whose compression bit can differ from the one the string started with.

use encoding_rs::WINDOWS_1252;

use crate::cfb::binary::read_u16_le;
use crate::error::{Error, Result};

// String option flags (BIFF8)
const FLAG_HIGH_BYTE: u8 = 0x01;
const FLAG_EXT: u8 = 0x04;
const FLAG_RICH_TEXT: u8 = 0x08;

/// Decode 8-bit characters through a Windows code page.
///
/// Only Windows-1252 is wired up; other code pages fall back to a lossless
/// byte-to-char mapping so ASCII content still comes through.
pub fn decode_text(bytes: &[u8], codepage: u16) -> String {
    match codepage {
        1252 => WINDOWS_1252.decode(bytes).0.into_owned(),
        other => {
            log::warn!("unsupported code page {other}, decoding bytes as Latin-1");
            bytes.iter().copied().map(char::from).collect()
        }
    }
}

/// Encode a string as Windows-1252, replacing unmappable characters with
/// `?` and truncating to at most `max_bytes` bytes.
pub fn encode_windows1252_lossy(s: &str, max_bytes: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len().min(max_bytes));
    for c in s.chars() {
        if out.len() >= max_bytes {
            break;
        }
        out.push(windows1252_byte(c).unwrap_or(b'?'));
    }
    out
}

/// The Windows-1252 byte for a character, if one exists.
///
/// The 0x80..=0x9F range holds printable characters instead of C1 controls;
/// everything else coincides with Latin-1.
fn windows1252_byte(c: char) -> Option<u8> {
    match c {
        '\u{0}'..='\u{7F}' => Some(c as u8),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        'ƒ' => Some(0x83),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '†' => Some(0x86),
        '‡' => Some(0x87),
        'ˆ' => Some(0x88),
        '‰' => Some(0x89),
        'Š' => Some(0x8A),
        '‹' => Some(0x8B),
        'Œ' => Some(0x8C),
        'Ž' => Some(0x8E),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '˜' => Some(0x98),
        '™' => Some(0x99),
        'š' => Some(0x9A),
        '›' => Some(0x9B),
        'œ' => Some(0x9C),
        'ž' => Some(0x9E),
        'Ÿ' => Some(0x9F),
        '\u{A0}'..='\u{FF}' => Some(c as u8),
        _ => None,
    }
}

/// BIFF5 short string: u8 length prefix, 8-bit characters.
pub fn parse_biff5_short_string(data: &[u8], codepage: u16) -> Result<String> {
    let Some((&len, rest)) = data.split_first() else {
        return Err(Error::Parse("short string is empty".into()));
    };
    let bytes = rest
        .get(..len as usize)
        .ok_or_else(|| Error::Parse("short string is truncated".into()))?;
    Ok(decode_text(bytes, codepage))
}

/// BIFF8 flagged string: u16 character count, option flags, then characters
/// one or two bytes wide. Used for BOUNDSHEET names and LABEL payloads.
pub fn parse_biff8_string(data: &[u8], codepage: u16) -> Result<String> {
    if data.len() < 3 {
        return Err(Error::Parse("flagged string is truncated".into()));
    }
    let cch = read_u16_le(data, 0)? as usize;
    let flags = data[2];
    decode_chars(&data[3..], cch, flags & FLAG_HIGH_BYTE != 0, codepage)
}

fn decode_chars(bytes: &[u8], cch: usize, wide: bool, codepage: u16) -> Result<String> {
    let char_bytes = if wide {
        cch.checked_mul(2)
            .ok_or_else(|| Error::Parse("string length overflow".into()))?
    } else {
        cch
    };
    let chars = bytes
        .get(..char_bytes)
        .ok_or_else(|| Error::Parse("string characters are truncated".into()))?;

    Ok(if wide {
        let units: Vec<u16> = chars
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        decode_text(chars, codepage)
    })
}

/// Parse a shared string table from its stitched record payloads: the SST
/// payload followed by its CONTINUE payloads, in stream order.
///
/// Produces exactly `uniqueCount` strings or fails.
pub fn parse_sst(segments: &[&[u8]], codepage: u16) -> Result<Vec<String>> {
    let mut cursor = SegmentCursor::new(segments);

    let total_refs = cursor.read_u32()?;
    let unique = cursor.read_u32()? as usize;
    log::debug!("SST: {unique} unique strings, {total_refs} references");

    let mut strings = Vec::with_capacity(unique.min(4096));
    for _ in 0..unique {
        strings.push(cursor.read_string(codepage)?);
    }
    Ok(strings)
}

/// Cursor over the payload segments of a CONTINUE-spilled record.
struct SegmentCursor<'a> {
    segments: &'a [&'a [u8]],
    seg: usize,
    pos: usize,
}

impl<'a> SegmentCursor<'a> {
    fn new(segments: &'a [&'a [u8]]) -> Self {
        SegmentCursor {
            segments,
            seg: 0,
            pos: 0,
        }
    }

    fn remaining_in_segment(&self) -> usize {
        self.segments
            .get(self.seg)
            .map(|s| s.len().saturating_sub(self.pos))
            .unwrap_or(0)
    }

    fn next_segment(&mut self) -> Result<()> {
        self.seg += 1;
        self.pos = 0;
        if self.seg >= self.segments.len() {
            return Err(Error::Parse("shared string table is truncated".into()));
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        loop {
            if let Some(segment) = self.segments.get(self.seg) {
                if self.pos < segment.len() {
                    let byte = segment[self.pos];
                    self.pos += 1;
                    return Ok(byte);
                }
                self.next_segment()?;
            } else {
                return Err(Error::Parse("shared string table is truncated".into()));
            }
        }
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes([self.read_u8()?, self.read_u8()?]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes([
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
        ]))
    }

    fn take_from_segment(&mut self, n: usize) -> &'a [u8] {
        let segment = self.segments[self.seg];
        let taken = &segment[self.pos..self.pos + n];
        self.pos += n;
        taken
    }

    fn skip(&mut self, mut n: usize) -> Result<()> {
        while n > 0 {
            let available = self.remaining_in_segment();
            if available == 0 {
                self.next_segment()?;
                continue;
            }
            let step = n.min(available);
            self.pos += step;
            n -= step;
        }
        Ok(())
    }

    /// Read one SST string, honoring the continuation rule: character data
    /// that spills into the next segment restarts with a fresh flags byte
    /// whose compression bit replaces the current one.
    fn read_string(&mut self, codepage: u16) -> Result<String> {
        let cch = self.read_u16()? as usize;
        let flags = self.read_u8()?;

        let rich_runs = if flags & FLAG_RICH_TEXT != 0 {
            self.read_u16()? as usize
        } else {
            0
        };
        let ext_size = if flags & FLAG_EXT != 0 {
            self.read_u32()? as usize
        } else {
            0
        };

        let mut wide = flags & FLAG_HIGH_BYTE != 0;
        let mut remaining = cch;
        let mut out = String::with_capacity(cch);

        while remaining > 0 {
            if self.remaining_in_segment() == 0 {
                self.next_segment()?;
                let cont_flags = self.read_u8()?;
                wide = cont_flags & FLAG_HIGH_BYTE != 0;
                continue;
            }

            let width = if wide { 2 } else { 1 };
            let available_chars = self.remaining_in_segment() / width;
            if available_chars == 0 {
                return Err(Error::Parse("string split mid-character".into()));
            }

            let take = remaining.min(available_chars);
            let bytes = self.take_from_segment(take * width);
            if wide {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                out.push_str(&String::from_utf16_lossy(&units));
            } else {
                out.push_str(&decode_text(bytes, codepage));
            }
            remaining -= take;
        }

        let rich_bytes = rich_runs
            .checked_mul(4)
            .ok_or_else(|| Error::Parse("rich run count overflow".into()))?;
        let trailer = rich_bytes
            .checked_add(ext_size)
            .ok_or_else(|| Error::Parse("string trailer overflow".into()))?;
        self.skip(trailer)?;

        Ok(out)
    }
}
