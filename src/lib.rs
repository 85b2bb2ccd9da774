//! xlsbook - read and write legacy Excel 97-2003 (.xls) workbooks.
//!
//! An `.xls` file is an OLE2 Compound File Binary (CFB) container wrapping a
//! BIFF record stream. This crate implements both layers without depending
//! on a host spreadsheet application:
//!
//! - **Reading**: any CFB container with a `Workbook` or `Book` stream is
//!   parsed into a sparse in-memory model. BIFF5 and BIFF8 encodings of the
//!   implemented cell records are understood; unknown records are skipped.
//! - **Writing**: a single sheet of headers and string rows is emitted as a
//!   BIFF5 workbook inside a minimal compound file, written atomically.
//!
//! # Example - round trip
//!
//! ```no_run
//! use xlsbook::{read, write, CellValue, SheetData};
//!
//! # fn main() -> xlsbook::Result<()> {
//! let sheet = SheetData::new(
//!     "Prices",
//!     vec!["item".to_string(), "price".to_string()],
//!     vec![vec!["apple".to_string(), "1,25".to_string()]],
//! );
//! write(&sheet, "prices.xls")?;
//!
//! let workbook = read("prices.xls")?;
//! assert_eq!(workbook.sheets[0].name, "Prices");
//! assert_eq!(
//!     workbook.sheets[0].value(1, 1),
//!     Some(&CellValue::Number(1.25))
//! );
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

/// BIFF record stream parsing and generation
pub mod biff;

/// OLE2 compound file container
pub mod cfb;

/// Crate error types
pub mod error;

/// Workbook model and writer input
pub mod sheet;

pub use error::{Error, Result};
pub use sheet::{Cell, CellValue, Sheet, SheetData, Workbook};

use cfb::{CfbError, CfbFile, CfbWriter};

/// Read an `.xls` file into the in-memory workbook model.
///
/// The workbook stream is looked up as `Workbook` first, then `Book`;
/// a file with neither yields [`Error::WorkbookStreamMissing`].
pub fn read<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;

    let mut container = CfbFile::open(Cursor::new(bytes))?;
    let stream = match container.open_stream("Workbook") {
        Ok(stream) => stream,
        Err(CfbError::StreamNotFound) => container.open_stream("Book")?,
        Err(err) => return Err(err.into()),
    };

    biff::workbook::parse_workbook(&stream)
}

/// Write a single-sheet `.xls` file.
///
/// Preconditions: the sheet name is non-empty and every row is exactly as
/// wide as the header list. The file is written atomically (temp file, then
/// rename).
pub fn write<P: AsRef<Path>>(sheet: &SheetData, path: P) -> Result<()> {
    if sheet.name.is_empty() {
        return Err(Error::EmptySheetName);
    }
    let expected = sheet.headers.len();
    for (row, cells) in sheet.rows.iter().enumerate() {
        if cells.len() != expected {
            return Err(Error::InvalidGrid {
                expected,
                row,
                got: cells.len(),
            });
        }
    }

    let workbook_stream = biff::writer::workbook::build_workbook_stream(sheet)?;

    let mut container = CfbWriter::new();
    container.create_stream("Book", &workbook_stream);
    container.save(path)?;
    Ok(())
}
