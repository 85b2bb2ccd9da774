//! Core writer: sector layout and file assembly.
//!
//! Layout is strictly sequential: payload sectors first, then the directory
//! sector(s), then the FAT sectors. Each payload is zero-padded to at least
//! the mini-stream cutoff so every stream lives in the regular FAT and no
//! MiniFAT is needed, and the padded size is what the directory declares.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::directory::DirectoryBuilder;
use super::fat::FatBuilder;
use super::header::HeaderBuilder;
use crate::cfb::consts::*;
use crate::cfb::CfbError;

/// Minimal compound file writer: named streams under the root storage.
#[derive(Debug, Default)]
pub struct CfbWriter {
    /// Streams in insertion order; insertion order is allocation order
    streams: Vec<(String, Vec<u8>)>,
}

impl CfbWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream, replacing any previous stream of the same name.
    pub fn create_stream(&mut self, name: &str, data: &[u8]) {
        if let Some(pos) = self.streams.iter().position(|(n, _)| n == name) {
            self.streams[pos].1 = data.to_vec();
        } else {
            self.streams.push((name.to_string(), data.to_vec()));
        }
    }

    /// Assemble the complete compound file in memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CfbError> {
        let mut fat = FatBuilder::new();
        let mut directory = DirectoryBuilder::new();

        // Payload sectors first. Padding to the cutoff keeps every stream in
        // the regular FAT.
        let mut padded_streams = Vec::with_capacity(self.streams.len());
        for (name, data) in &self.streams {
            let padded_len = data
                .len()
                .max(MINI_STREAM_CUTOFF as usize)
                .div_ceil(SECTOR_SIZE_V3)
                * SECTOR_SIZE_V3;
            let mut padded = data.clone();
            padded.resize(padded_len, 0);

            let start_sector = fat.allocate_chain(padded_len);
            directory.add_stream(name.clone(), start_sector, padded_len as u64);
            padded_streams.push(padded);
        }

        // Directory sector(s) follow the payloads.
        let dir_stream = directory.generate_directory_stream();
        let dir_start_sector = fat.allocate_chain(dir_stream.len());

        // F FAT sectors hold 128 entries each and must also map themselves:
        // the smallest F with used + F <= F * 128.
        let entries_per_sector = (SECTOR_SIZE_V3 / 4) as u32;
        let n_fat = fat.total_sectors().div_ceil(entries_per_sector - 1);
        if n_fat as usize > DIFAT_INLINE_LEN {
            let total: usize = self.streams.iter().map(|(_, d)| d.len()).sum();
            return Err(CfbError::StreamTooLarge(total));
        }
        let fat_start_sector = fat.allocate_special(n_fat, FATSECT);
        let fat_sectors = fat.generate_fat_sectors();
        debug_assert_eq!(fat_sectors.len(), n_fat as usize);

        let mut header = HeaderBuilder::new();
        header.set_first_dir_sector(dir_start_sector);
        let fat_sector_ids: Vec<u32> = (fat_start_sector..fat_start_sector + n_fat).collect();
        header.add_fat_sectors(&fat_sector_ids);

        // Sectors were allocated sequentially, so assembly is concatenation.
        let total_sectors = fat.total_sectors() as usize;
        let mut out = Vec::with_capacity(HEADER_SIZE + total_sectors * SECTOR_SIZE_V3);
        out.extend_from_slice(&header.generate());
        for padded in &padded_streams {
            out.extend_from_slice(padded);
        }
        out.extend_from_slice(&dir_stream);
        for sector in &fat_sectors {
            out.extend_from_slice(sector);
        }

        Ok(out)
    }

    /// Write the compound file to an output sink.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CfbError> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Save atomically: the bytes land in a temporary file next to the
    /// destination, which is then renamed over it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CfbError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new_in(".")?,
        };
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| CfbError::Io(e.error))?;
        Ok(())
    }
}
