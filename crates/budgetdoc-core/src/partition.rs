//! Partitioning records into director x month report units
//!
//! Ordering rules:
//! - directors ascend in plain string order;
//! - a director's months ascend numerically when every one of them parses as
//!   a number (ties keep first-seen order), otherwise they ascend by their
//!   text rendering;
//! - records inside a unit keep their source order.
//!
//! Month values are grouped by exact cell equality, so `1` and `"1"` are two
//! distinct months that happen to sort next to each other.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::format::month_number;
use crate::{normalize_name, BudgetRecord, CellValue, Diagnostic, DiagnosticCode, ReportUnit};

/// Group records into ordered report units.
///
/// Only pairs that actually have records produce a unit.
pub fn partition(records: Vec<BudgetRecord>) -> Vec<ReportUnit> {
    let mut by_director: BTreeMap<String, Vec<BudgetRecord>> = BTreeMap::new();
    for record in records {
        if record.director.is_empty() || record.month.is_empty() {
            continue;
        }
        by_director
            .entry(record.director.clone())
            .or_default()
            .push(record);
    }

    let mut units = Vec::new();
    for (director, records) in by_director {
        let mut months: Vec<(CellValue, Vec<BudgetRecord>)> = Vec::new();
        for record in records {
            match months.iter_mut().find(|(month, _)| *month == record.month) {
                Some((_, group)) => group.push(record),
                None => months.push((record.month.clone(), vec![record])),
            }
        }

        sort_months(&mut months);

        units.extend(
            months
                .into_iter()
                .map(|(month, records)| ReportUnit::new(director.clone(), month, records)),
        );
    }
    units
}

/// Numeric order when every month parses, text order otherwise
fn sort_months<T>(months: &mut [(CellValue, T)]) {
    let numeric: Option<Vec<f64>> = months.iter().map(|(m, _)| m.as_number()).collect();
    if numeric.is_some() {
        months.sort_by(|(a, _), (b, _)| {
            let a = a.as_number().unwrap_or_default();
            let b = b.as_number().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else {
        months.sort_by_key(|(m, _)| m.display_text());
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Optional restriction of a report to some directors and months
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Director names, compared accent- and case-insensitively
    pub directors: Vec<String>,
    /// Month numbers (`"3"`) or names (`"marzo"`), or raw month text
    pub months: Vec<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn director(mut self, name: impl Into<String>) -> Self {
        self.directors.push(name.into());
        self
    }

    pub fn month(mut self, month: impl Into<String>) -> Self {
        self.months.push(month.into());
        self
    }

    pub fn is_all(&self) -> bool {
        self.directors.is_empty() && self.months.is_empty()
    }

    fn director_matches(wanted: &str, unit: &ReportUnit) -> bool {
        normalize_name(wanted) == normalize_name(&unit.director)
    }

    fn month_matches(wanted: &str, unit: &ReportUnit) -> bool {
        match (month_number(wanted), unit.month.as_integer()) {
            (Some(a), Some(b)) => a == b,
            _ => normalize_name(wanted) == normalize_name(&unit.month.display_text()),
        }
    }

    /// Keep the matching units in their original order.
    ///
    /// Every filter value that matches no unit produces a W002 warning.
    pub fn apply(&self, units: &[ReportUnit]) -> (Vec<ReportUnit>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();

        for director in &self.directors {
            if !units.iter().any(|u| Self::director_matches(director, u)) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::W002EmptySelection,
                        format!("no records for director '{director}'"),
                    )
                    .with_hint("check the spelling against `budgetdoc preview`"),
                );
            }
        }
        for month in &self.months {
            if !units.iter().any(|u| Self::month_matches(month, u)) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::W002EmptySelection,
                    format!("no records for month '{month}'"),
                ));
            }
        }

        let selected: Vec<ReportUnit> = units
            .iter()
            .filter(|u| {
                self.directors.is_empty()
                    || self.directors.iter().any(|d| Self::director_matches(d, u))
            })
            .filter(|u| {
                self.months.is_empty() || self.months.iter().any(|m| Self::month_matches(m, u))
            })
            .cloned()
            .collect();

        // Each filter matched on its own but the combination is empty
        if selected.is_empty() && !self.is_all() && diagnostics.is_empty() && !units.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::W002EmptySelection,
                format!(
                    "no records for directors [{}] in months [{}]",
                    self.directors.join(", "),
                    self.months.join(", ")
                ),
            ));
        }

        (selected, diagnostics)
    }
}
