//! # budgetdoc-reader
//!
//! Loads a budget spreadsheet into a [`RawTable`].
//!
//! This crate provides:
//! - Spreadsheet input (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) via calamine
//! - CSV input
//! - Header clean-up: blank headers become `Unnamed: <n>`, duplicates get
//!   `.1`, `.2` suffixes
//! - [`TableCache`], which skips re-parsing input it has already seen
//!
//! The first worksheet is read, and its first row is the header row.
//!
//! ## Example
//!
//! ```rust,ignore
//! use budgetdoc_reader::read_file;
//!
//! let table = read_file(std::path::Path::new("presupuesto_2025.xlsx"))?;
//! println!("{} rows, columns: {:?}", table.row_count(), table.headers);
//! ```

pub mod cache;
mod delimited;
mod spreadsheet;

pub use cache::{Fingerprint, TableCache};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use budgetdoc_core::{CellValue, RawTable};
use thiserror::Error;
use tracing::{debug, info};

/// Reading error
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported input format: {0} (expected xlsx, xlsm, xlsb, xls, ods or csv)")]
    UnsupportedFormat(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("the workbook has no worksheets")]
    NoWorksheet,

    #[error("the input has no header row")]
    MissingHeader,
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    /// Any workbook calamine understands
    Spreadsheet,
    /// Comma separated values, UTF-8
    Csv,
}

/// Detect the input format from the file extension
pub fn detect_format(path: &Path) -> Result<InputFormat, ReadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
        "csv" => Ok(InputFormat::Csv),
        _ => Err(ReadError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Read a file, detecting its format from the extension
pub fn read_file(path: &Path) -> Result<RawTable, ReadError> {
    let format = detect_format(path)?;
    let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "reading input");
    read_bytes(&bytes, format)
}

/// Parse in-memory file contents
pub fn read_bytes(bytes: &[u8], format: InputFormat) -> Result<RawTable, ReadError> {
    let (headers, rows) = match format {
        InputFormat::Spreadsheet => spreadsheet::read_first_sheet(bytes)?,
        InputFormat::Csv => delimited::read_csv(bytes)?,
    };
    let table = into_table(headers, rows)?;
    debug!(
        columns = table.headers.len(),
        rows = table.row_count(),
        "table loaded"
    );
    Ok(table)
}

/// Assemble a table from a raw header row and data rows
fn into_table(header: Option<Vec<CellValue>>, rows: Vec<Vec<CellValue>>) -> Result<RawTable, ReadError> {
    let header = header.ok_or(ReadError::MissingHeader)?;
    let mut table = RawTable::new(header_names(&header));
    for row in rows {
        if row.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push_row(row);
    }
    Ok(table)
}

/// Unique column names: blanks become `Unnamed: <n>`, repeats get a suffix
pub fn header_names(header: &[CellValue]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for (index, cell) in header.iter().enumerate() {
        let base = if cell.is_empty() {
            format!("Unnamed: {index}")
        } else {
            cell.display_text()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}
