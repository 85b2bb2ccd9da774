//! Header block generation.

use crate::cfb::consts::*;

/// Builds the 512-byte version-3 header.
///
/// The writer never allocates a MiniFAT or DIFAT extension sectors, so those
/// header fields are fixed at `ENDOFCHAIN`/0 and every FAT sector must fit in
/// the 109 inline DIFAT slots.
pub struct HeaderBuilder {
    first_dir_sector: u32,
    fat_sectors: Vec<u32>,
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self {
            first_dir_sector: 0,
            fat_sectors: Vec::new(),
        }
    }

    pub fn set_first_dir_sector(&mut self, sector: u32) {
        self.first_dir_sector = sector;
    }

    /// Record the FAT sector SIDs for the inline DIFAT. At most 109 fit.
    pub fn add_fat_sectors(&mut self, sectors: &[u32]) {
        debug_assert!(self.fat_sectors.len() + sectors.len() <= DIFAT_INLINE_LEN);
        self.fat_sectors.extend_from_slice(sectors);
    }

    /// Generate the header block.
    pub fn generate(&self) -> Vec<u8> {
        let mut header = vec![0u8; HEADER_SIZE];

        header[0..8].copy_from_slice(MAGIC);
        // CLSID stays zero

        // Minor version, major version 3, little-endian byte order
        header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
        header[26..28].copy_from_slice(&3u16.to_le_bytes());
        header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());

        // Sector shift 9 (512), mini sector shift 6 (64)
        header[30..32].copy_from_slice(&9u16.to_le_bytes());
        header[32..34].copy_from_slice(&6u16.to_le_bytes());

        // Directory sector count must be 0 for version 3
        // (header[40..44] stays zero)

        header[44..48].copy_from_slice(&(self.fat_sectors.len() as u32).to_le_bytes());
        header[48..52].copy_from_slice(&self.first_dir_sector.to_le_bytes());

        // Transaction signature 0, mini stream cutoff 4096
        header[56..60].copy_from_slice(&MINI_STREAM_CUTOFF.to_le_bytes());

        // No MiniFAT
        header[60..64].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        header[64..68].copy_from_slice(&0u32.to_le_bytes());

        // No DIFAT extension
        header[68..72].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        header[72..76].copy_from_slice(&0u32.to_le_bytes());

        // Inline DIFAT: FAT sector SIDs, remaining slots free
        for i in 0..DIFAT_INLINE_LEN {
            let offset = 76 + i * 4;
            let value = self.fat_sectors.get(i).copied().unwrap_or(FREESECT);
            header[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let mut builder = HeaderBuilder::new();
        builder.set_first_dir_sector(10);
        builder.add_fat_sectors(&[11]);
        let header = builder.generate();

        assert_eq!(header.len(), HEADER_SIZE);
        assert_eq!(&header[0..8], MAGIC);
        assert_eq!(&header[26..28], &3u16.to_le_bytes());
        assert_eq!(&header[28..30], &0xFFFEu16.to_le_bytes());
        assert_eq!(&header[30..32], &9u16.to_le_bytes());
        assert_eq!(&header[44..48], &1u32.to_le_bytes());
        assert_eq!(&header[48..52], &10u32.to_le_bytes());
        assert_eq!(&header[60..64], &ENDOFCHAIN.to_le_bytes());
        assert_eq!(&header[68..72], &ENDOFCHAIN.to_le_bytes());
        // DIFAT[0] = 11, DIFAT[1] free
        assert_eq!(&header[76..80], &11u32.to_le_bytes());
        assert_eq!(&header[80..84], &FREESECT.to_le_bytes());
    }
}
