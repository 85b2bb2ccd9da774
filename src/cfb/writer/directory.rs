//! Directory sector generation.
//!
//! The directory holds the root storage followed by one stream entry per
//! payload, serialized as 128-byte records and padded with zero entries to
//! fill whole sectors. Children of the root are linked as a midpoint tree
//! over the name-sorted sibling list (shorter names first, then
//! case-insensitive alphabetical), the ordering compound-file consumers
//! expect.

use crate::cfb::consts::*;

/// One directory entry under construction.
#[derive(Debug, Clone)]
pub struct DirectoryEntryBuilder {
    pub name: String,
    pub entry_type: u8,
    pub start_sector: u32,
    pub size: u64,
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
}

impl DirectoryEntryBuilder {
    /// The root storage. With no mini-stream its chain is empty.
    pub fn root() -> Self {
        Self {
            name: "Root Entry".to_string(),
            entry_type: STGTY_ROOT,
            start_sector: ENDOFCHAIN,
            size: 0,
            sid_left: NOSTREAM,
            sid_right: NOSTREAM,
            sid_child: NOSTREAM,
        }
    }

    /// A stream entry.
    pub fn stream(name: String, start_sector: u32, size: u64) -> Self {
        Self {
            name,
            entry_type: STGTY_STREAM,
            start_sector,
            size,
            sid_left: NOSTREAM,
            sid_right: NOSTREAM,
            sid_child: NOSTREAM,
        }
    }

    /// Serialize to the 128-byte on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = vec![0u8; DIRENTRY_SIZE];

        // Name: UTF-16LE, at most 31 characters plus the terminating null
        let utf16: Vec<u16> = self.name.encode_utf16().collect();
        let name_len = utf16.len().min(31);
        for (i, &unit) in utf16.iter().take(name_len).enumerate() {
            data[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_len_bytes = ((name_len + 1) * 2) as u16;
        data[64..66].copy_from_slice(&name_len_bytes.to_le_bytes());

        data[66] = self.entry_type;
        data[67] = 1; // black

        data[68..72].copy_from_slice(&self.sid_left.to_le_bytes());
        data[72..76].copy_from_slice(&self.sid_right.to_le_bytes());
        data[76..80].copy_from_slice(&self.sid_child.to_le_bytes());

        // CLSID, state bits, timestamps stay zero
        data[116..120].copy_from_slice(&self.start_sector.to_le_bytes());
        data[120..128].copy_from_slice(&self.size.to_le_bytes());

        data
    }
}

/// Builds the directory stream for a root plus flat list of streams.
pub struct DirectoryBuilder {
    entries: Vec<DirectoryEntryBuilder>,
}

impl DirectoryBuilder {
    pub fn new() -> Self {
        Self {
            entries: vec![DirectoryEntryBuilder::root()],
        }
    }

    /// Append a stream entry under the root. Returns its SID.
    pub fn add_stream(&mut self, name: String, start_sector: u32, size: u64) -> u32 {
        let sid = self.entries.len() as u32;
        self.entries.push(DirectoryEntryBuilder::stream(name, start_sector, size));
        sid
    }

    /// Link siblings, serialize all entries, and pad with blank entries to a
    /// whole number of 512-byte sectors.
    pub fn generate_directory_stream(&mut self) -> Vec<u8> {
        self.link_root_children();

        let mut data = Vec::with_capacity(self.entries.len() * DIRENTRY_SIZE);
        for entry in &self.entries {
            data.extend_from_slice(&entry.to_bytes());
        }

        let padded = data.len().div_ceil(SECTOR_SIZE_V3) * SECTOR_SIZE_V3;
        data.resize(padded.max(SECTOR_SIZE_V3), 0);
        data
    }

    fn link_root_children(&mut self) {
        let child_sids: Vec<u32> = (1..self.entries.len() as u32).collect();
        if child_sids.is_empty() {
            self.entries[0].sid_child = NOSTREAM;
            return;
        }

        let mut sorted = child_sids;
        sorted.sort_by(|&a, &b| {
            let name_a = &self.entries[a as usize].name;
            let name_b = &self.entries[b as usize].name;
            name_a
                .len()
                .cmp(&name_b.len())
                .then_with(|| name_a.to_uppercase().cmp(&name_b.to_uppercase()))
        });

        let midpoint = sorted.len() / 2;
        self.entries[0].sid_child = sorted[midpoint];

        // Left chain runs up to the midpoint, right chain down from it.
        for j in 1..=midpoint {
            self.entries[sorted[j] as usize].sid_left = sorted[j - 1];
        }
        for j in midpoint..sorted.len() - 1 {
            self.entries[sorted[j] as usize].sid_right = sorted[j + 1];
        }
    }
}
