//! CSV input

use budgetdoc_core::CellValue;

use crate::ReadError;

type Rows = (Option<Vec<CellValue>>, Vec<Vec<CellValue>>);

/// Read CSV bytes; every non-blank field is kept as text
pub(crate) fn read_csv(bytes: &[u8]) -> Result<Rows, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => {
            let record = record?;
            // Excel writes UTF-8 CSVs with a BOM in front of the first header
            Some(
                record
                    .iter()
                    .enumerate()
                    .map(|(i, field)| {
                        let field = if i == 0 {
                            field.trim_start_matches('\u{feff}')
                        } else {
                            field
                        };
                        field_value(field)
                    })
                    .collect(),
            )
        }
        None => None,
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(record.iter().map(field_value).collect());
    }
    Ok((header, rows))
}

fn field_value(field: &str) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::text(field)
    }
}
