//! In-memory workbook model and the tabular writer input.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

/// A parsed workbook: an ordered sequence of sheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// Sheets in the order their BOUNDSHEET records appeared
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Look up a sheet by name (case-sensitive).
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// A single worksheet: a name and a sparse cell grid.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Sheet name as stored in its BOUNDSHEET record
    pub name: String,
    /// Sparse grid keyed by `(row, col)`
    pub cells: BTreeMap<(u32, u32), Cell>,
}

impl Sheet {
    /// Create an empty sheet with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Insert a cell, replacing any previous value at its position.
    pub fn insert(&mut self, cell: Cell) {
        self.cells.insert((cell.row, cell.col), cell);
    }

    /// Cell at `(row, col)`, if present.
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Value at `(row, col)`, if present.
    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }
}

/// A populated cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Zero-based row index
    pub row: u32,
    /// Zero-based column index
    pub col: u32,
    /// Decoded value
    pub value: CellValue,
}

impl Cell {
    /// Create a cell.
    pub fn new(row: u32, col: u32, value: CellValue) -> Self {
        Cell { row, col, value }
    }
}

/// The value held by a cell.
///
/// Numeric encodings (NUMBER, RK, MULRK, cached FORMULA results) all decode
/// to [`CellValue::Number`]. [`CellValue::Date`] is produced only by callers
/// that interpret number formats themselves; the reader never emits it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Text from LABEL records or the shared string table
    Text(String),
    /// IEEE 754 double
    Number(f64),
    /// A calendar timestamp
    Date(NaiveDateTime),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Input descriptor for [`crate::write`]: one sheet of header + data rows.
///
/// Every row must be exactly as wide as `headers`; the facade validates this
/// before any bytes are produced.
#[derive(Debug, Clone)]
pub struct SheetData {
    /// Sheet name (truncated to 31 bytes on disk)
    pub name: String,
    /// Column headers, written to row 0
    pub headers: Vec<String>,
    /// Data rows, written to rows 1..
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    /// Convenience constructor.
    pub fn new(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        SheetData {
            name: name.into(),
            headers,
            rows,
        }
    }
}
