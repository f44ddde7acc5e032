//! Turning raw rows into budget records

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BudgetRecord, CellValue, ColumnMap, Diagnostic, DiagnosticCode, Field, RawTable};

/// Number of row numbers quoted in the dropped-rows warning
const QUOTED_ROWS: usize = 10;

/// Largest accepted amount magnitude (10^18); larger cells count as zero
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000_000;

/// Why a row was left out of the report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    MissingDirector,
    MissingMonth,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::MissingDirector => "no director",
            DropReason::MissingMonth => "no month",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// 1-based data row number
    pub row: usize,
    pub reason: DropReason,
}

/// Records that made it, and the rows that did not
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<BudgetRecord>,
    pub dropped: Vec<DroppedRow>,
    /// Non-empty amount cells that were not numeric or out of range
    pub coerced_amounts: usize,
}

impl Extraction {
    /// Warnings about dropped rows and coerced amounts
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if !self.dropped.is_empty() {
            let quoted: Vec<String> = self
                .dropped
                .iter()
                .take(QUOTED_ROWS)
                .map(|d| format!("row {} ({})", d.row, d.reason.as_str()))
                .collect();
            let mut diagnostic = Diagnostic::new(
                DiagnosticCode::W001DroppedRows,
                format!(
                    "{} row(s) without director or month were left out of the report",
                    self.dropped.len()
                ),
            )
            .with_note(quoted.join(", "));
            if self.dropped.len() > QUOTED_ROWS {
                diagnostic = diagnostic.with_note(format!(
                    "and {} more",
                    self.dropped.len() - QUOTED_ROWS
                ));
            }
            diagnostics.push(diagnostic.with_hint("fill in the Director and Mes columns"));
        }

        if self.coerced_amounts > 0 {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::I001CoercedAmounts,
                format!(
                    "{} amount value(s) were not numeric or out of range and count as zero",
                    self.coerced_amounts
                ),
            ));
        }

        diagnostics
    }
}

/// Coerce an amount cell to a decimal; missing, unparseable or
/// out-of-range values are zero
pub fn coerce_amount(cell: &CellValue) -> Decimal {
    parse_amount(cell).unwrap_or(Decimal::ZERO)
}

fn parse_amount(cell: &CellValue) -> Option<Decimal> {
    parse_number(cell).filter(|amount| amount.abs() <= Decimal::from(MAX_AMOUNT))
}

fn parse_number(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Decimal::from_f64(*n),
        CellValue::Text(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .and_then(Decimal::from_f64)
                })
        }
        _ => None,
    }
}

fn field_cell<'a>(table: &'a RawTable, columns: &ColumnMap, row: usize, field: Field) -> &'a CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    match columns.index(field) {
        Some(col) => table.cell(row, col),
        None => &EMPTY,
    }
}

/// Build records from every row with a director and a month
pub fn extract_records(table: &RawTable, columns: &ColumnMap) -> Extraction {
    let mut extraction = Extraction::default();

    let cell = |row: usize, field: Field| field_cell(table, columns, row, field);
    let text = |row: usize, field: Field| field_cell(table, columns, row, field).display_text();

    for row in 0..table.row_count() {
        let director = cell(row, Field::Director);
        let month = cell(row, Field::Month);

        let reason = if director.is_empty() {
            Some(DropReason::MissingDirector)
        } else if month.is_empty() {
            Some(DropReason::MissingMonth)
        } else {
            None
        };
        if let Some(reason) = reason {
            extraction.dropped.push(DroppedRow {
                row: row + 1,
                reason,
            });
            continue;
        }

        let raw_amount = cell(row, Field::Amount).clone();
        let amount = match parse_amount(&raw_amount) {
            Some(amount) => amount,
            None => {
                if !raw_amount.is_empty() {
                    extraction.coerced_amounts += 1;
                }
                Decimal::ZERO
            }
        };

        extraction.records.push(BudgetRecord {
            row: row + 1,
            director: director.display_text().trim().to_string(),
            month: month.clone(),
            year: cell(row, Field::Year).clone(),
            business_line: text(row, Field::BusinessLine),
            ramo: text(row, Field::Ramo),
            zone: text(row, Field::Zone),
            channel: text(row, Field::Channel),
            sub_channel: text(row, Field::SubChannel),
            office: text(row, Field::Office),
            team_lead: text(row, Field::TeamLead),
            amount,
            raw_amount,
        });
    }

    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnResolver;
    use rust_decimal_macros::dec;

    fn table(rows: Vec<Vec<CellValue>>) -> (RawTable, ColumnMap) {
        let headers: Vec<String> = [
            "Director", "Mes", "Año", "Línea de negocio", "Ramo", "Zona", "Canal",
            "Sub-Canal", "Oficina", "Líder Equipo", "Valor",
        ]
        .iter()
        .map(|h| (*h).to_string())
        .collect();
        let map = ColumnResolver::default().resolve(&headers).unwrap();
        let mut table = RawTable::new(headers);
        for row in rows {
            table.push_row(row);
        }
        (table, map)
    }

    fn row(director: CellValue, month: CellValue, amount: CellValue) -> Vec<CellValue> {
        vec![
            director,
            month,
            CellValue::Number(2025.0),
            CellValue::text("Autos"),
            CellValue::text("R1"),
            CellValue::text("Norte"),
            CellValue::text("Agencias"),
            CellValue::text("Directo"),
            CellValue::Number(101.0),
            CellValue::text("Gómez"),
            amount,
        ]
    }

    #[test]
    fn amount_coercion() {
        assert_eq!(coerce_amount(&CellValue::Number(100.0)), dec!(100));
        assert_eq!(coerce_amount(&CellValue::text(" 2500.75 ")), dec!(2500.75));
        assert_eq!(coerce_amount(&CellValue::text("1e3")), dec!(1000));
        assert_eq!(coerce_amount(&CellValue::text("bad")), Decimal::ZERO);
        assert_eq!(coerce_amount(&CellValue::text("1,000")), Decimal::ZERO);
        assert_eq!(coerce_amount(&CellValue::Empty), Decimal::ZERO);
        assert_eq!(coerce_amount(&CellValue::Number(f64::INFINITY)), Decimal::ZERO);
        assert_eq!(coerce_amount(&CellValue::Bool(true)), Decimal::ZERO);
        assert_eq!(coerce_amount(&CellValue::Number(-1e18)), dec!(-1000000000000000000));
        assert_eq!(coerce_amount(&CellValue::Number(5e28)), Decimal::ZERO);
        assert_eq!(coerce_amount(&CellValue::text("79228162514264337593543950335")), Decimal::ZERO);
    }

    #[test]
    fn rows_without_director_or_month_are_dropped() {
        let (table, map) = table(vec![
            row(CellValue::text("Pérez"), CellValue::Number(1.0), CellValue::Number(10.0)),
            row(CellValue::Empty, CellValue::Number(1.0), CellValue::Number(10.0)),
            row(CellValue::text("  "), CellValue::Number(1.0), CellValue::Number(10.0)),
            row(CellValue::text("Pérez"), CellValue::Empty, CellValue::Number(10.0)),
        ]);
        let extraction = extract_records(&table, &map);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(
            extraction.dropped,
            vec![
                DroppedRow { row: 2, reason: DropReason::MissingDirector },
                DroppedRow { row: 3, reason: DropReason::MissingDirector },
                DroppedRow { row: 4, reason: DropReason::MissingMonth },
            ]
        );

        let diagnostics = extraction.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::W001DroppedRows);
        assert!(diagnostics[0].message.starts_with("3 row(s)"));
    }

    #[test]
    fn record_fields_are_display_text() {
        let (table, map) = table(vec![row(
            CellValue::text(" Pérez "),
            CellValue::Number(2.0),
            CellValue::text("75"),
        )]);
        let extraction = extract_records(&table, &map);
        let record = &extraction.records[0];
        assert_eq!(record.row, 1);
        assert_eq!(record.director, "Pérez");
        assert_eq!(record.office, "101");
        assert_eq!(record.team_lead, "Gómez");
        assert_eq!(record.amount, dec!(75));
        assert_eq!(record.year, CellValue::Number(2025.0));
    }

    #[test]
    fn oversized_amounts_are_counted_as_coerced() {
        let (table, map) = table(vec![
            row(CellValue::text("A"), CellValue::Number(1.0), CellValue::Number(5e28)),
            row(CellValue::text("A"), CellValue::Number(1.0), CellValue::Number(5e28)),
            row(CellValue::text("A"), CellValue::Number(1.0), CellValue::Number(7.0)),
        ]);
        let extraction = extract_records(&table, &map);
        assert_eq!(extraction.records.len(), 3);
        assert_eq!(extraction.coerced_amounts, 2);
        let amounts: Vec<Decimal> = extraction.records.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, [Decimal::ZERO, Decimal::ZERO, dec!(7)]);
    }

    #[test]
    fn non_numeric_amounts_are_counted() {
        let (table, map) = table(vec![
            row(CellValue::text("A"), CellValue::Number(1.0), CellValue::text("n/a")),
            row(CellValue::text("A"), CellValue::Number(1.0), CellValue::Empty),
        ]);
        let extraction = extract_records(&table, &map);
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.coerced_amounts, 1);
        assert_eq!(
            extraction.diagnostics()[0].code,
            DiagnosticCode::I001CoercedAmounts
        );
    }
}
