//! Per-business-line and grand totals of a report unit

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::BudgetRecord;

/// Sum of one business line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotal {
    pub business_line: String,
    pub total: Decimal,
    pub records: usize,
}

/// Totals of a report unit, unrounded
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    /// One entry per business line, sorted by line name
    pub by_line: Vec<LineTotal>,
    pub grand_total: Decimal,
    /// Records counted, including those whose amount was coerced to zero
    pub record_count: usize,
}

impl Aggregates {
    /// Total for a business line, if present
    pub fn line(&self, business_line: &str) -> Option<Decimal> {
        self.by_line
            .iter()
            .find(|l| l.business_line == business_line)
            .map(|l| l.total)
    }
}

/// Sum amounts per business line and overall.
///
/// Sums saturate at the `Decimal` range instead of overflowing.
pub fn aggregate(records: &[BudgetRecord]) -> Aggregates {
    let mut lines: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    let mut grand_total = Decimal::ZERO;

    for record in records {
        let entry = lines
            .entry(record.business_line.as_str())
            .or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(record.amount);
        entry.1 += 1;
        grand_total = grand_total.saturating_add(record.amount);
    }

    Aggregates {
        by_line: lines
            .into_iter()
            .map(|(line, (total, count))| LineTotal {
                business_line: line.to_string(),
                total,
                records: count,
            })
            .collect(),
        grand_total,
        record_count: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    use rust_decimal_macros::dec;

    fn record(line: &str, amount: Decimal) -> BudgetRecord {
        BudgetRecord::new("Pérez", 1.0).business_line(line).amount(amount)
    }

    #[test]
    fn totals_by_line_are_sorted() {
        let records = vec![
            record("Vida", dec!(10)),
            record("Autos", dec!(5)),
            record("Vida", dec!(2.5)),
        ];
        let totals = aggregate(&records);
        let lines: Vec<&str> = totals.by_line.iter().map(|l| l.business_line.as_str()).collect();
        assert_eq!(lines, ["Autos", "Vida"]);
        assert_eq!(totals.line("Vida"), Some(dec!(12.5)));
        assert_eq!(totals.by_line[1].records, 2);
        assert_eq!(totals.grand_total, dec!(17.5));
    }

    #[test]
    fn coerced_amounts_still_count_as_records() {
        let mut bad = record("A", Decimal::ZERO);
        bad.raw_amount = CellValue::text("bad");
        let mut missing = record("A", Decimal::ZERO);
        missing.raw_amount = CellValue::Empty;
        let records = vec![record("A", dec!(100)), bad, missing, record("A", dec!(50))];

        let totals = aggregate(&records);
        assert_eq!(totals.grand_total, dec!(150));
        assert_eq!(totals.record_count, 4);
    }

    #[test]
    fn grand_total_equals_sum_of_lines() {
        let records = vec![
            record("A", dec!(0.1)),
            record("B", dec!(0.2)),
            record("C", dec!(0.3)),
            record("A", dec!(1234567.891)),
        ];
        let totals = aggregate(&records);
        let sum: Decimal = totals.by_line.iter().map(|l| l.total).sum();
        assert_eq!(sum, totals.grand_total);
        assert_eq!(totals.grand_total, dec!(1234568.491));
    }

    #[test]
    fn huge_amounts_saturate() {
        let huge = Decimal::MAX - Decimal::ONE;
        let totals = aggregate(&[record("A", huge), record("A", huge)]);
        assert_eq!(totals.line("A"), Some(Decimal::MAX));
        assert_eq!(totals.grand_total, Decimal::MAX);

        let totals = aggregate(&[record("B", -huge), record("B", -huge)]);
        assert_eq!(totals.grand_total, Decimal::MIN);
    }

    #[test]
    fn empty_records_give_zero() {
        let totals = aggregate(&[]);
        assert!(totals.by_line.is_empty());
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }
}
