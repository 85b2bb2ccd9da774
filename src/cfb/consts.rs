/// Magic bytes that open every compound file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Size of the fixed header block in bytes
pub const HEADER_SIZE: usize = 512;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Sector size for major version 3 (512 bytes, sector shift 9)
pub const SECTOR_SIZE_V3: usize = 512;

/// Sector size for major version 4 (4096 bytes, sector shift 12)
pub const SECTOR_SIZE_V4: usize = 4096;

/// Mini sector size (sector shift 6)
pub const MINI_SECTOR_SIZE: usize = 64;

/// Streams below this size live in the mini-stream
pub const MINI_STREAM_CUTOFF: u32 = 4096;

/// Number of DIFAT entries carried inline in the header
pub const DIFAT_INLINE_LEN: usize = 109;

// Sector IDs (MS-CFB §2.2)
/// Denotes a DIFAT sector in the FAT
pub const DIFSECT: u32 = 0xFFFFFFFC;
/// Denotes a FAT sector in the FAT
pub const FATSECT: u32 = 0xFFFFFFFD;
/// End of a sector chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE;
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF;

/// Unallocated directory entry / absent sibling
pub const NOSTREAM: u32 = 0xFFFFFFFF;

// Directory entry object types (MS-CFB §2.6.1)
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is the root storage
pub const STGTY_ROOT: u8 = 5;
