//! Workbook input through calamine

use std::io::Cursor;

use budgetdoc_core::CellValue;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::ReadError;

type Rows = (Option<Vec<CellValue>>, Vec<Vec<CellValue>>);

/// Read the first worksheet: header row plus data rows
pub(crate) fn read_first_sheet(bytes: &[u8]) -> Result<Rows, ReadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ReadError::Spreadsheet(e.to_string()))?;

    if let Some(name) = workbook.sheet_names().first() {
        debug!(sheet = %name, "reading first worksheet");
    }

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReadError::NoWorksheet)?
        .map_err(|e| ReadError::Spreadsheet(e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>());
    let header = rows.next();
    Ok((header, rows.collect()))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}
