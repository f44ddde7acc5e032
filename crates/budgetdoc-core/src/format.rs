//! Display formatting for months, years and amounts

use rust_decimal::{Decimal, RoundingStrategy};

use crate::CellValue;

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Spanish month name for 1-12, `Mes <n>` otherwise
pub fn month_name(number: i64) -> String {
    match usize::try_from(number) {
        Ok(n @ 1..=12) => MONTH_NAMES[n - 1].to_string(),
        _ => format!("Mes {number}"),
    }
}

/// Label for a month cell: calendar name, `Mes <n>`, or the raw text
pub fn month_label(month: &CellValue) -> String {
    match month.as_integer() {
        Some(n) => month_name(n),
        None => month.display_text(),
    }
}

/// Label for a year cell: integer text when numeric, raw text otherwise
pub fn year_label(year: &CellValue) -> String {
    if year.is_empty() {
        return String::new();
    }
    match year.as_integer() {
        Some(n) => n.to_string(),
        None => year.display_text(),
    }
}

/// Month number for a label such as `"marzo"`, `"Marzo"` or `"3"`
pub fn month_number(label: &str) -> Option<i64> {
    let label = label.trim();
    if let Ok(n) = label.parse::<f64>() {
        return Some(n.trunc() as i64);
    }
    let wanted = crate::normalize_name(label);
    MONTH_NAMES
        .iter()
        .position(|m| *m == wanted)
        .map(|i| i as i64 + 1)
}

/// Amount with thousands separators and no decimals (`1,234,567`).
///
/// Halves round to even.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}
