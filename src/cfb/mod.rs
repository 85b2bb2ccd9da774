//! OLE2 Compound File Binary (CFB) container support.
//!
//! A compound file is a miniature FAT filesystem: a 512-byte header, a File
//! Allocation Table located through the DIFAT, a directory of named streams,
//! and an optional MiniFAT for streams smaller than 4096 bytes. The reader
//! accepts both 512- and 4096-byte sector files; the writer emits the minimal
//! version-3 layout (512-byte sectors, no MiniFAT, inline DIFAT only).

use std::io;

use thiserror::Error;

/// Shared header/directory/sector constants
pub mod consts;

/// Bounds-checked little-endian primitives
pub mod binary;

/// Compound file reader
mod file;

/// Compound file writer
pub mod writer;

pub use file::{CfbFile, DirectoryEntry};
pub use writer::CfbWriter;

/// Errors raised by the container layer.
#[derive(Debug, Error)]
pub enum CfbError {
    /// IO error from the underlying reader or writer
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The header signature or invariants do not describe a compound file
    #[error("not a compound file")]
    NotCfb,

    /// Structural damage: truncated sectors, bad chains, invalid offsets
    #[error("corrupted compound file: {0}")]
    Corrupted(String),

    /// No stream with the requested name
    #[error("stream not found")]
    StreamNotFound,

    /// The writer cannot place this stream using only the inline DIFAT
    #[error("stream too large for a minimal compound file: {0} bytes")]
    StreamTooLarge(usize),
}
