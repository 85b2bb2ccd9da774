//! Crate-level error types.

use thiserror::Error;

use crate::cfb::CfbError;

/// Result type alias for workbook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`crate::read`] and [`crate::write`].
#[derive(Debug, Error)]
pub enum Error {
    /// IO error while reading or writing the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not an Excel 97-2003 compound file
    #[error("not an XLS file")]
    NotXls,

    /// The compound file holds neither a `Workbook` nor a `Book` stream
    #[error("workbook stream missing")]
    WorkbookStreamMissing,

    /// Structurally corrupt container or record stream
    #[error("parse error: {0}")]
    Parse(String),

    /// The writer was handed an empty sheet name
    #[error("sheet name must not be empty")]
    EmptySheetName,

    /// A data row does not match the header width
    #[error("row {row} has {got} cells, expected {expected}")]
    InvalidGrid {
        /// Header count every row must match
        expected: usize,
        /// Zero-based index of the offending row
        row: usize,
        /// Cell count actually found
        got: usize,
    },
}

impl From<CfbError> for Error {
    fn from(err: CfbError) -> Self {
        match err {
            CfbError::Io(e) => Error::Io(e),
            CfbError::NotCfb => Error::NotXls,
            CfbError::StreamNotFound => Error::WorkbookStreamMissing,
            CfbError::Corrupted(reason) => Error::Parse(reason),
            CfbError::StreamTooLarge(size) => {
                Error::Parse(format!("stream of {size} bytes exceeds inline DIFAT capacity"))
            }
        }
    }
}
