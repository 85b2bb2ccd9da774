//! Compound file reader.
//!
//! Parses the header, materializes the FAT through the DIFAT, walks the
//! directory, and serves named streams from either the FAT or the MiniFAT.
//! Every chain walk is capped at `file_size / sector_size + 1` hops so a
//! cyclic or self-referencing allocation table fails instead of looping.

use std::io::{self, Read, Seek, SeekFrom};

use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

use super::binary::{decode_utf16le, read_u16_le, read_u32_le};
use super::consts::*;
use super::CfbError;

/// On-disk directory entry layout (128 bytes, MS-CFB §2.6.1).
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE, null-padded
    name: [u8; 64],
    /// Length of the name in bytes, including the terminating null
    name_len: U16<LE>,
    /// 1 = storage, 2 = stream, 5 = root
    entry_type: u8,
    /// Red-black node color
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    /// First sector of the stream (FAT or MiniFAT domain)
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// A decoded directory entry.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Entry name, UTF-16 decoded
    pub name: String,
    /// Object type (`STGTY_STREAM`, `STGTY_STORAGE`, `STGTY_ROOT`)
    pub entry_type: u8,
    /// First sector of the entry's chain
    pub start_sector: u32,
    /// Stream size in bytes
    pub size: u64,
}

/// Compound file reader over any `Read + Seek` source.
#[derive(Debug)]
pub struct CfbFile<R: Read + Seek> {
    reader: R,
    file_size: u64,
    sector_size: usize,
    mini_sector_size: usize,
    mini_stream_cutoff: u32,
    /// Next-sector table; index = SID
    fat: Vec<u32>,
    minifat: Vec<u32>,
    entries: Vec<DirectoryEntry>,
    /// Concatenated mini-stream, loaded on first small-stream read
    ministream: Option<Vec<u8>>,
}

impl<R: Read + Seek> CfbFile<R> {
    /// Open and validate a compound file.
    pub fn open(mut reader: R) -> Result<Self, CfbError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if file_size < HEADER_SIZE as u64 {
            return Err(CfbError::NotCfb);
        }

        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        if &header[0..8] != MAGIC {
            return Err(CfbError::NotCfb);
        }

        let major_version = read_u16_le(&header, 0x1A)?;
        let byte_order = read_u16_le(&header, 0x1C)?;
        let sector_shift = read_u16_le(&header, 0x1E)?;
        let mini_sector_shift = read_u16_le(&header, 0x20)?;
        let first_dir_sector = read_u32_le(&header, 0x30)?;
        let mini_stream_cutoff = read_u32_le(&header, 0x38)?;
        let first_minifat_sector = read_u32_le(&header, 0x3C)?;
        let num_minifat_sectors = read_u32_le(&header, 0x40)?;
        let first_difat_sector = read_u32_le(&header, 0x44)?;

        if byte_order != 0xFFFE {
            return Err(CfbError::NotCfb);
        }

        let sector_size = match (major_version, sector_shift) {
            (3, 9) => SECTOR_SIZE_V3,
            (4, 12) => SECTOR_SIZE_V4,
            _ => return Err(CfbError::NotCfb),
        };
        if mini_sector_shift != 6 {
            return Err(CfbError::NotCfb);
        }

        let mut cfb = CfbFile {
            reader,
            file_size,
            sector_size,
            mini_sector_size: MINI_SECTOR_SIZE,
            mini_stream_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            entries: Vec::new(),
            ministream: None,
        };

        cfb.load_fat(&header, first_difat_sector)?;
        cfb.load_directory(first_dir_sector)?;
        if num_minifat_sectors > 0 && first_minifat_sector != ENDOFCHAIN {
            cfb.load_minifat(first_minifat_sector)?;
        }

        Ok(cfb)
    }

    /// Upper bound for any sector chain in this file.
    fn max_hops(&self) -> usize {
        (self.file_size / self.sector_size as u64 + 1) as usize
    }

    /// Locate the FAT sectors via the inline DIFAT and the DIFAT extension
    /// chain, then read them all into the next-sector table.
    fn load_fat(&mut self, header: &[u8; HEADER_SIZE], first_difat_sector: u32) -> Result<(), CfbError> {
        let mut fat_sectors = Vec::new();

        // 109 inline DIFAT slots at header offset 0x4C
        for i in 0..DIFAT_INLINE_LEN {
            let sid = read_u32_le(header, 0x4C + i * 4)?;
            if sid >= DIFSECT {
                break;
            }
            fat_sectors.push(sid);
        }

        // DIFAT extension chain: each sector carries `sector_size/4 - 1` FAT
        // SIDs followed by the next DIFAT SID in its last 4 bytes.
        let ids_per_difat = self.sector_size / 4 - 1;
        let mut difat_sector = first_difat_sector;
        let mut hops = 0usize;
        while difat_sector < DIFSECT {
            hops += 1;
            if hops > self.max_hops() {
                return Err(CfbError::Corrupted("DIFAT chain does not terminate".into()));
            }

            let sector = self.read_sector(difat_sector)?;
            for i in 0..ids_per_difat {
                let sid = read_u32_le(&sector, i * 4)?;
                if sid >= DIFSECT {
                    break;
                }
                fat_sectors.push(sid);
            }
            difat_sector = read_u32_le(&sector, ids_per_difat * 4)?;
        }

        let entries_per_sector = self.sector_size / 4;
        self.fat.reserve(fat_sectors.len() * entries_per_sector);
        for &sid in &fat_sectors {
            let sector = self.read_sector(sid)?;
            for i in 0..entries_per_sector {
                self.fat.push(read_u32_le(&sector, i * 4)?);
            }
        }

        Ok(())
    }

    /// Read the MiniFAT stream (a regular FAT chain) into a table.
    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<(), CfbError> {
        let data = self.read_stream_from_fat(first_minifat_sector)?;
        self.minifat.reserve(data.len() / 4);
        for i in 0..data.len() / 4 {
            self.minifat.push(read_u32_le(&data, i * 4)?);
        }
        Ok(())
    }

    /// Materialize the directory and decode all entries.
    fn load_directory(&mut self, first_dir_sector: u32) -> Result<(), CfbError> {
        let data = self.read_stream_from_fat(first_dir_sector)?;

        self.entries.reserve(data.len() / DIRENTRY_SIZE);
        for chunk in data.chunks_exact(DIRENTRY_SIZE) {
            let raw = RawDirectoryEntry::read_from_bytes(chunk)
                .map_err(|_| CfbError::Corrupted("malformed directory entry".into()))?;

            // The stored length counts the trailing null pair.
            let name_len = (raw.name_len.get() as usize).saturating_sub(2).min(64);
            let name = decode_utf16le(&raw.name[..name_len]);

            // Version-3 files only use the low half of the size field.
            let size = if self.sector_size == SECTOR_SIZE_V3 {
                raw.stream_size.get() & 0xFFFFFFFF
            } else {
                raw.stream_size.get()
            };

            self.entries.push(DirectoryEntry {
                name,
                entry_type: raw.entry_type,
                start_sector: raw.start_sector.get(),
                size,
            });
        }

        if !self
            .entries
            .first()
            .is_some_and(|root| root.entry_type == STGTY_ROOT)
        {
            return Err(CfbError::Corrupted("directory has no root entry".into()));
        }

        Ok(())
    }

    /// Read one sector. Sector `sid` begins at `512 + sid * sector_size`.
    fn read_sector(&mut self, sid: u32) -> Result<Vec<u8>, CfbError> {
        let position = HEADER_SIZE as u64 + sid as u64 * self.sector_size as u64;
        self.reader.seek(SeekFrom::Start(position))?;

        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                CfbError::Corrupted(format!("sector {sid} is truncated"))
            } else {
                CfbError::Io(e)
            }
        })?;
        Ok(buffer)
    }

    /// Collect a whole chain from the FAT.
    fn read_stream_from_fat(&mut self, start_sector: u32) -> Result<Vec<u8>, CfbError> {
        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut hops = 0usize;

        while sector != ENDOFCHAIN {
            hops += 1;
            if hops > self.max_hops() {
                return Err(CfbError::Corrupted(format!(
                    "FAT chain from sector {start_sector} does not terminate"
                )));
            }
            if sector as usize >= self.fat.len() {
                return Err(CfbError::Corrupted(format!("sector {sector} outside the FAT")));
            }

            data.extend_from_slice(&self.read_sector(sector)?);
            sector = self.fat[sector as usize];
        }

        Ok(data)
    }

    /// Collect a small stream from the MiniFAT-backed mini-stream.
    fn read_stream_from_minifat(&mut self, start_sector: u32, size: u64) -> Result<Vec<u8>, CfbError> {
        if self.ministream.is_none() {
            let root_start = self.entries[0].start_sector;
            let ministream = self.read_stream_from_fat(root_start)?;
            self.ministream = Some(ministream);
        }

        let max_hops = self.max_hops() * (self.sector_size / self.mini_sector_size);
        let ministream = self.ministream.as_ref().expect("mini-stream loaded above");
        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut hops = 0usize;

        while sector != ENDOFCHAIN {
            hops += 1;
            if hops > max_hops {
                return Err(CfbError::Corrupted(format!(
                    "MiniFAT chain from sector {start_sector} does not terminate"
                )));
            }
            if sector as usize >= self.minifat.len() {
                return Err(CfbError::Corrupted(format!(
                    "mini sector {sector} outside the MiniFAT"
                )));
            }

            let position = sector as usize * self.mini_sector_size;
            let end = position + self.mini_sector_size;
            if end > ministream.len() {
                return Err(CfbError::Corrupted(format!(
                    "mini sector {sector} outside the mini-stream"
                )));
            }
            data.extend_from_slice(&ministream[position..end]);
            sector = self.minifat[sector as usize];
        }

        data.truncate(size as usize);
        Ok(data)
    }

    /// Names of all stream entries in directory order.
    pub fn list_streams(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.entry_type == STGTY_STREAM)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Whether a stream with this name exists (case-insensitive).
    pub fn has_stream(&self, name: &str) -> bool {
        self.find_stream(name).is_some()
    }

    fn find_stream(&self, name: &str) -> Option<DirectoryEntry> {
        let wanted = name.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.entry_type == STGTY_STREAM && e.name.to_lowercase() == wanted)
            .cloned()
    }

    /// Return a named stream's bytes, resolved through the FAT or, for
    /// streams below the cutoff, the MiniFAT.
    pub fn open_stream(&mut self, name: &str) -> Result<Vec<u8>, CfbError> {
        let entry = self.find_stream(name).ok_or(CfbError::StreamNotFound)?;

        if entry.size < self.mini_stream_cutoff as u64 {
            self.read_stream_from_minifat(entry.start_sector, entry.size)
        } else {
            let mut data = self.read_stream_from_fat(entry.start_sector)?;
            data.truncate(entry.size as usize);
            Ok(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_short_input() {
        let err = CfbFile::open(Cursor::new(vec![0u8; 100])).unwrap_err();
        assert!(matches!(err, CfbError::NotCfb));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut data = vec![0u8; 1536];
        data[0..8].copy_from_slice(b"NOTACFB!");
        let err = CfbFile::open(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, CfbError::NotCfb));
    }

    #[test]
    fn rejects_bad_sector_shift() {
        let mut data = vec![0u8; 1536];
        data[0..8].copy_from_slice(MAGIC);
        data[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
        data[0x1C..0x1E].copy_from_slice(&0xFFFEu16.to_le_bytes());
        data[0x1E..0x20].copy_from_slice(&11u16.to_le_bytes()); // 2048: not allowed
        data[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
        let err = CfbFile::open(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, CfbError::NotCfb));
    }
}
