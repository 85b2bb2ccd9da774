//! FAT construction for the writer.
//!
//! Sectors are handed out sequentially; the FAT records, for every allocated
//! sector, either the next sector of its chain or a terminator/marker value.

use crate::cfb::consts::*;

/// Sequential sector allocator backing the File Allocation Table.
#[derive(Debug, Default)]
pub struct FatBuilder {
    /// Next-sector table; index = SID
    fat: Vec<u32>,
    /// First never-allocated sector
    next_sector: u32,
}

impl FatBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a chain covering `size` bytes of 512-byte sectors and link
    /// it in the FAT. Returns the starting SID, or `ENDOFCHAIN` for empty
    /// input.
    pub fn allocate_chain(&mut self, size: usize) -> u32 {
        if size == 0 {
            return ENDOFCHAIN;
        }

        let num_sectors = size.div_ceil(SECTOR_SIZE_V3);
        let start_sector = self.next_sector;
        self.fat.resize(start_sector as usize + num_sectors, FREESECT);

        for i in 0..num_sectors {
            let current = self.next_sector;
            self.next_sector += 1;
            self.fat[current as usize] = if i + 1 < num_sectors {
                current + 1
            } else {
                ENDOFCHAIN
            };
        }

        start_sector
    }

    /// Reserve `count` sectors marked with a special FAT value such as
    /// `FATSECT`. Returns the first reserved SID.
    pub fn allocate_special(&mut self, count: u32, marker: u32) -> u32 {
        if count == 0 {
            return ENDOFCHAIN;
        }

        let start = self.next_sector;
        let end = start + count;
        self.fat.resize(end as usize, FREESECT);
        for sid in start..end {
            self.fat[sid as usize] = marker;
        }
        self.next_sector = end;
        start
    }

    /// Total sectors allocated so far.
    pub fn total_sectors(&self) -> u32 {
        self.next_sector
    }

    /// Serialize the table into whole FAT sectors, unused entries filled
    /// with `FREESECT`.
    pub fn generate_fat_sectors(&self) -> Vec<Vec<u8>> {
        let entries_per_sector = SECTOR_SIZE_V3 / 4;
        let num_fat_sectors = self.fat.len().div_ceil(entries_per_sector);

        let mut sectors = Vec::with_capacity(num_fat_sectors);
        for sector_idx in 0..num_fat_sectors {
            let mut sector = vec![0xFFu8; SECTOR_SIZE_V3];
            let start = sector_idx * entries_per_sector;
            let end = (start + entries_per_sector).min(self.fat.len());
            for (i, &value) in self.fat[start..end].iter().enumerate() {
                sector[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
            }
            sectors.push(sector);
        }

        sectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_chain() {
        let mut fat = FatBuilder::new();

        let start = fat.allocate_chain(1024);
        assert_eq!(start, 0);
        assert_eq!(fat.total_sectors(), 2);
        assert_eq!(fat.fat[0], 1);
        assert_eq!(fat.fat[1], ENDOFCHAIN);
    }

    #[test]
    fn test_empty_chain() {
        let mut fat = FatBuilder::new();
        assert_eq!(fat.allocate_chain(0), ENDOFCHAIN);
        assert_eq!(fat.total_sectors(), 0);
    }

    #[test]
    fn test_allocate_special() {
        let mut fat = FatBuilder::new();
        fat.allocate_chain(512);
        let start = fat.allocate_special(2, FATSECT);
        assert_eq!(start, 1);
        assert_eq!(fat.fat[1], FATSECT);
        assert_eq!(fat.fat[2], FATSECT);
        assert_eq!(fat.total_sectors(), 3);
    }

    #[test]
    fn test_generate_fat_sectors() {
        let mut fat = FatBuilder::new();
        fat.allocate_chain(1024);
        let sectors = fat.generate_fat_sectors();
        assert_eq!(sectors.len(), 1);
        assert_eq!(&sectors[0][0..4], &1u32.to_le_bytes());
        assert_eq!(&sectors[0][4..8], &ENDOFCHAIN.to_le_bytes());
        // Unused entries stay free
        assert_eq!(&sectors[0][8..12], &FREESECT.to_le_bytes());
    }
}
