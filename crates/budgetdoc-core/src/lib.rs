//! # budgetdoc-core
//!
//! Core domain model for the budgetdoc report generator.
//!
//! This crate provides:
//! - Domain types: `CellValue`, `RawTable`, `BudgetRecord`, `ReportUnit`, `BudgetReport`
//! - Column resolution over loosely named spreadsheet headers (`resolve`)
//! - Row extraction, partitioning and aggregation (`record`, `partition`, `aggregate`)
//! - Report profile (header lines, signatures) and diagnostics
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use budgetdoc_core::{build_report, CellValue, ColumnResolver, RawTable};
//!
//! let headers = [
//!     "Director", "Mes", "Año", "Línea de negocio", "Ramo", "Zona",
//!     "Canal", "Sub-Canal", "Oficina", "Líder Equipo", "Valor",
//! ];
//! let mut table = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
//! table.push_row(vec![
//!     CellValue::text("Pérez"), CellValue::Number(1.0), CellValue::Number(2025.0),
//!     CellValue::text("Autos"), CellValue::text("R1"), CellValue::text("Norte"),
//!     CellValue::text("Agencias"), CellValue::text("Directo"), CellValue::text("Bogotá"),
//!     CellValue::text("Gómez"), CellValue::Number(100.0),
//! ]);
//!
//! let (report, _diagnostics) = build_report(&table, &ColumnResolver::default()).unwrap();
//! assert_eq!(report.units.len(), 1);
//! assert_eq!(report.units[0].month_label(), "enero");
//! ```

pub mod aggregate;
pub mod diagnostics;
pub mod format;
pub mod partition;
pub mod profile;
pub mod record;
pub mod resolve;

pub use aggregate::{aggregate, Aggregates, LineTotal};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use partition::{partition, Selection};
pub use profile::{ReportProfile, Signature};
pub use record::{extract_records, DropReason, DroppedRow, Extraction};
pub use resolve::{normalize_name, resolve_column, ColumnMap, ColumnResolver, Field, FieldSpec};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Cells and tables
// ============================================================================

/// A single raw spreadsheet cell
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Null in the pandas sense: empty cell, blank text or NaN
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Bool(_) => false,
        }
    }

    /// Interpret the cell as a finite real number, parsing text if needed
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Interpret the cell as an integer (truncating), as `int(float(x))` would
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number().map(|n| n.trunc() as i64)
    }

    /// Text used in tables and for string ordering
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.is_nan() => String::new(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// In-memory table: one header row plus data rows
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column names, unique after loading
    pub headers: Vec<String>,
    /// Data rows; shorter rows are padded with `Empty` on access
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    /// Cell at (row, column), `Empty` when out of range
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Records and report units
// ============================================================================

/// One input row after column resolution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    /// 1-based data row number in the source (header excluded)
    pub row: usize,
    pub director: String,
    pub month: CellValue,
    pub year: CellValue,
    pub business_line: String,
    pub ramo: String,
    pub zone: String,
    pub channel: String,
    pub sub_channel: String,
    pub office: String,
    pub team_lead: String,
    /// Amount coerced to a number; missing or unparseable values are zero
    pub amount: Decimal,
    /// Cell the amount was read from
    pub raw_amount: CellValue,
}

impl BudgetRecord {
    /// Minimal record, mostly useful for tests and examples
    pub fn new(director: impl Into<String>, month: impl Into<CellValue>) -> Self {
        Self {
            row: 0,
            director: director.into(),
            month: month.into(),
            year: CellValue::Empty,
            business_line: String::new(),
            ramo: String::new(),
            zone: String::new(),
            channel: String::new(),
            sub_channel: String::new(),
            office: String::new(),
            team_lead: String::new(),
            amount: Decimal::ZERO,
            raw_amount: CellValue::Empty,
        }
    }

    pub fn year(mut self, year: impl Into<CellValue>) -> Self {
        self.year = year.into();
        self
    }

    pub fn business_line(mut self, line: impl Into<String>) -> Self {
        self.business_line = line.into();
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self.raw_amount = CellValue::text(amount.to_string());
        self
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }
}

/// Records of one director in one month, with their totals
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportUnit {
    pub director: String,
    pub month: CellValue,
    /// First non-empty year among the records, `Empty` when there is none
    pub year: CellValue,
    /// Records in source order
    pub records: Vec<BudgetRecord>,
    pub totals: Aggregates,
}

impl ReportUnit {
    /// Build a unit, computing its aggregates once
    pub fn new(director: impl Into<String>, month: CellValue, records: Vec<BudgetRecord>) -> Self {
        let year = records
            .iter()
            .map(|r| &r.year)
            .find(|y| !y.is_empty())
            .cloned()
            .unwrap_or_default();
        let totals = aggregate(&records);
        Self {
            director: director.into(),
            month,
            year,
            records,
            totals,
        }
    }

    /// Spanish month name, `Mes <n>` or the raw text
    pub fn month_label(&self) -> String {
        format::month_label(&self.month)
    }

    /// Year as integer text, raw text, or empty
    pub fn year_label(&self) -> String {
        format::year_label(&self.year)
    }

    /// Subtitle line printed above the detail table
    pub fn subtitle(&self) -> String {
        let mut text = format!(
            "Asignación presupuestal para {} del mes de {}",
            self.director,
            self.month_label()
        );
        let year = self.year_label();
        if !year.is_empty() {
            text.push_str(" del ");
            text.push_str(&year);
        }
        text
    }
}

/// Ordered report units plus extraction statistics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub units: Vec<ReportUnit>,
    pub columns: ColumnMap,
    /// Data rows seen in the source table
    pub source_rows: usize,
    /// Rows left out for lacking a director or month
    pub dropped: Vec<DroppedRow>,
}

impl BudgetReport {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sum of all unit totals, saturating at the `Decimal` range
    pub fn grand_total(&self) -> Decimal {
        self.units
            .iter()
            .fold(Decimal::ZERO, |sum, u| sum.saturating_add(u.totals.grand_total))
    }

    /// Restrict the report to a selection.
    ///
    /// Each director or month filter that matches nothing yields a warning;
    /// sibling filters are unaffected.
    pub fn select(&self, selection: &Selection) -> (Self, Vec<Diagnostic>) {
        let (units, diagnostics) = selection.apply(&self.units);
        let report = Self {
            units,
            columns: self.columns.clone(),
            source_rows: self.source_rows,
            dropped: self.dropped.clone(),
        };
        (report, diagnostics)
    }
}

/// Resolve columns, extract records and partition them into report units.
///
/// Resolution failures halt before any partitioning.
pub fn build_report(
    table: &RawTable,
    resolver: &ColumnResolver,
) -> Result<(BudgetReport, Vec<Diagnostic>), ResolveError> {
    let columns = resolver.resolve(&table.headers)?;
    let extraction = extract_records(table, &columns);
    let diagnostics = extraction.diagnostics();
    let units = partition(extraction.records);

    let report = BudgetReport {
        units,
        columns,
        source_rows: table.row_count(),
        dropped: extraction.dropped,
    };
    Ok((report, diagnostics))
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render every unit of the report
    fn render(&self, report: &BudgetReport) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Column resolution error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("missing required columns: {}", labels.join(", "))]
    MissingColumns { labels: Vec<String> },
}

impl ResolveError {
    /// Labels of every field that could not be resolved
    pub fn missing_labels(&self) -> &[String] {
        match self {
            Self::MissingColumns { labels } => labels,
        }
    }

    /// Error diagnostic listing the missing labels and the columns on offer
    pub fn to_diagnostic<S: AsRef<str>>(&self, headers: &[S]) -> Diagnostic {
        let available: Vec<&str> = headers.iter().map(AsRef::as_ref).collect();
        Diagnostic::new(DiagnosticCode::E001MissingColumns, self.to_string())
            .with_note(format!("available columns: {}", available.join(", ")))
            .with_hint("rename the columns, or add names under [columns] in the profile")
    }
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cell_emptiness() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::text("   ").is_empty());
        assert!(CellValue::Number(f64::NAN).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
        assert!(!CellValue::Bool(false).is_empty());
    }

    #[test]
    fn cell_numbers() {
        assert_eq!(CellValue::text(" 2 ").as_number(), Some(2.0));
        assert_eq!(CellValue::text("3.9").as_integer(), Some(3));
        assert_eq!(CellValue::text("March").as_number(), None);
        assert_eq!(CellValue::text("inf").as_number(), None);
        assert_eq!(CellValue::Bool(true).as_number(), None);
    }

    #[test]
    fn cell_display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(3.0).display_text(), "3");
        assert_eq!(CellValue::Number(2.5).display_text(), "2.5");
        assert_eq!(CellValue::Empty.display_text(), "");
    }

    #[test]
    fn table_cell_out_of_range_is_empty() {
        let mut table = RawTable::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![CellValue::text("x")]);
        assert_eq!(table.cell(0, 0), &CellValue::text("x"));
        assert_eq!(table.cell(0, 1), &CellValue::Empty);
        assert_eq!(table.cell(5, 0), &CellValue::Empty);
    }

    #[test]
    fn unit_subtitle_with_and_without_year() {
        let records = vec![BudgetRecord::new("Pérez", 3.0).year(2024.0)];
        let unit = ReportUnit::new("Pérez", CellValue::Number(3.0), records);
        assert_eq!(
            unit.subtitle(),
            "Asignación presupuestal para Pérez del mes de marzo del 2024"
        );

        let records = vec![BudgetRecord::new("Pérez", "Q1")];
        let unit = ReportUnit::new("Pérez", CellValue::text("Q1"), records);
        assert_eq!(unit.subtitle(), "Asignación presupuestal para Pérez del mes de Q1");
    }

    #[test]
    fn unit_year_is_first_non_empty() {
        let records = vec![
            BudgetRecord::new("A", 1.0),
            BudgetRecord::new("A", 1.0).year("2025"),
            BudgetRecord::new("A", 1.0).year(2026.0),
        ];
        let unit = ReportUnit::new("A", CellValue::Number(1.0), records);
        assert_eq!(unit.year_label(), "2025");
    }

    #[test]
    fn report_grand_total_sums_units() {
        let a = ReportUnit::new(
            "A",
            CellValue::Number(1.0),
            vec![BudgetRecord::new("A", 1.0).amount(dec!(10.5))],
        );
        let b = ReportUnit::new(
            "B",
            CellValue::Number(1.0),
            vec![BudgetRecord::new("B", 1.0).amount(dec!(4.5))],
        );
        let report = BudgetReport {
            units: vec![a, b],
            columns: ColumnMap::default(),
            source_rows: 2,
            dropped: vec![],
        };
        assert_eq!(report.grand_total(), dec!(15.0));
    }

    #[test]
    fn report_grand_total_saturates() {
        let unit = |director: &str| {
            ReportUnit::new(
                director,
                CellValue::Number(1.0),
                vec![BudgetRecord::new(director, 1.0).amount(Decimal::MAX)],
            )
        };
        let report = BudgetReport {
            units: vec![unit("A"), unit("B")],
            columns: ColumnMap::default(),
            source_rows: 2,
            dropped: vec![],
        };
        assert_eq!(report.grand_total(), Decimal::MAX);
    }

    #[test]
    fn missing_columns_message_lists_all_labels() {
        let err = ResolveError::MissingColumns {
            labels: vec!["Zona".into(), "Valor".into()],
        };
        assert_eq!(err.to_string(), "missing required columns: Zona, Valor");
        assert_eq!(err.missing_labels(), ["Zona", "Valor"]);
    }

    #[test]
    fn missing_columns_diagnostic_lists_available_columns() {
        let err = ResolveError::MissingColumns {
            labels: vec!["Valor".into()],
        };
        let diagnostic = err.to_diagnostic(&["Director", "Mes"]);
        assert_eq!(diagnostic.code, DiagnosticCode::E001MissingColumns);
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.notes, ["available columns: Director, Mes"]);
    }
}
