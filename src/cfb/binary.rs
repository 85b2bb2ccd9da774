//! Bounds-checked little-endian reads over byte buffers.
//!
//! Every accessor takes `(data, offset)` and fails on out-of-range access
//! instead of panicking. Integers are assembled through `zerocopy`'s
//! endian-aware types; nothing here dereferences a multi-byte value at an
//! unaligned address.

use zerocopy::{FromBytes, F64, I16, I32, LE, U16, U32, U64};

use super::CfbError;

/// Read a single byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, CfbError> {
    data.get(offset)
        .copied()
        .ok_or_else(|| CfbError::Corrupted(format!("u8 read past end at {offset}")))
}

/// Read a little-endian u16 at the given offset.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16, CfbError> {
    let end = offset.checked_add(2).filter(|&e| e <= data.len());
    let Some(end) = end else {
        return Err(CfbError::Corrupted(format!("u16 read past end at {offset}")));
    };
    U16::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .map_err(|_| CfbError::Corrupted(format!("u16 read failed at {offset}")))
}

/// Read a little-endian i16 at the given offset.
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> Result<i16, CfbError> {
    let end = offset.checked_add(2).filter(|&e| e <= data.len());
    let Some(end) = end else {
        return Err(CfbError::Corrupted(format!("i16 read past end at {offset}")));
    };
    I16::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .map_err(|_| CfbError::Corrupted(format!("i16 read failed at {offset}")))
}

/// Read a little-endian u32 at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, CfbError> {
    let end = offset.checked_add(4).filter(|&e| e <= data.len());
    let Some(end) = end else {
        return Err(CfbError::Corrupted(format!("u32 read past end at {offset}")));
    };
    U32::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .map_err(|_| CfbError::Corrupted(format!("u32 read failed at {offset}")))
}

/// Read a little-endian i32 at the given offset.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> Result<i32, CfbError> {
    let end = offset.checked_add(4).filter(|&e| e <= data.len());
    let Some(end) = end else {
        return Err(CfbError::Corrupted(format!("i32 read past end at {offset}")));
    };
    I32::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .map_err(|_| CfbError::Corrupted(format!("i32 read failed at {offset}")))
}

/// Read a little-endian u64 at the given offset.
#[inline]
pub fn read_u64_le(data: &[u8], offset: usize) -> Result<u64, CfbError> {
    let end = offset.checked_add(8).filter(|&e| e <= data.len());
    let Some(end) = end else {
        return Err(CfbError::Corrupted(format!("u64 read past end at {offset}")));
    };
    U64::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .map_err(|_| CfbError::Corrupted(format!("u64 read failed at {offset}")))
}

/// Read a little-endian IEEE 754 double at the given offset.
#[inline]
pub fn read_f64_le(data: &[u8], offset: usize) -> Result<f64, CfbError> {
    let end = offset.checked_add(8).filter(|&e| e <= data.len());
    let Some(end) = end else {
        return Err(CfbError::Corrupted(format!("f64 read past end at {offset}")));
    };
    F64::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .map_err(|_| CfbError::Corrupted(format!("f64 read failed at {offset}")))
}

/// Decode UTF-16LE bytes into a string, dropping anything after the first
/// NUL terminator. Invalid surrogate pairs are replaced, never rejected.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let mut units = Vec::with_capacity(bytes.len() / 2);
    for chunk in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([chunk[0], chunk[1]]);
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert!(read_u16_le(&data, 0).is_ok_and(|v| v == 0x1234));
        assert!(read_u16_le(&data, 2).is_ok_and(|v| v == 0x5678));
        assert!(read_u16_le(&data, 3).is_err());
        assert!(read_u16_le(&data, usize::MAX).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert!(read_u32_le(&data, 0).is_ok_and(|v| v == 0x12345678));
        assert!(read_u32_le(&data, 1).is_err());
    }

    #[test]
    fn test_read_i32_le() {
        let data = (-5i32).to_le_bytes();
        assert!(read_i32_le(&data, 0).is_ok_and(|v| v == -5));
    }

    #[test]
    fn test_read_u8_and_u64_le() {
        let data = 0x1122_3344_5566_7788u64.to_le_bytes();
        assert!(read_u8(&data, 0).is_ok_and(|v| v == 0x88));
        assert!(read_u8(&data, 8).is_err());
        assert!(read_u64_le(&data, 0).is_ok_and(|v| v == 0x1122_3344_5566_7788));
        assert!(read_u64_le(&data, 1).is_err());
    }

    #[test]
    fn test_read_f64_le() {
        let data = 1.5f64.to_le_bytes();
        assert!(read_f64_le(&data, 0).is_ok_and(|v| v == 1.5));
        assert!(read_f64_le(&data, 1).is_err());
    }

    #[test]
    fn test_decode_utf16le() {
        let data = [0x42, 0x00, 0x6F, 0x00, 0x6F, 0x00, 0x6B, 0x00, 0x00, 0x00];
        assert_eq!(decode_utf16le(&data), "Book");
        // Odd trailing byte is ignored
        assert_eq!(decode_utf16le(&[0x41, 0x00, 0x42]), "A");
    }
}
