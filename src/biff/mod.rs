//! BIFF (Binary Interchange File Format) record stream support.
//!
//! BIFF serializes a workbook as length-prefixed records: a globals substream
//! (code page, sheet directory, shared strings) followed by one substream per
//! sheet, each bracketed by BOF/EOF. The reader understands the BIFF5 and
//! BIFF8 encodings of the cell records it implements; the writer emits BIFF5.

/// Record ids, the record cursor, and small record parsers
pub mod records;

/// BIFF string decoding and the Windows-1252 writer encoding
pub mod strings;

/// Workbook globals parsing and the stream-to-model driver
pub mod workbook;

/// Per-sheet cell decoding
pub mod worksheet;

/// BIFF5 record writers and stream builders
pub mod writer;
