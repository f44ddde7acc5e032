//! Excel worksheet naming
//!
//! Excel rejects sheet names longer than 31 characters, names containing
//! any of `[]:*?/\`, names starting or ending with an apostrophe, the name
//! `History`, and duplicates compared case-insensitively.

use std::collections::HashSet;

/// Longest name Excel accepts
pub const MAX_SHEET_NAME: usize = 31;

const INVALID: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const RESERVED: &str = "history";
const FALLBACK: &str = "Hoja";

/// Hands out valid, unique sheet names for one workbook
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for the `<director> <month>` sheet.
    ///
    /// The director part is shortened first so the month stays readable.
    pub fn name(&mut self, director: &str, month: &str) -> String {
        let mut base = compose(&sanitize(director), &sanitize(month));
        if base.is_empty() {
            base = FALLBACK.to_string();
        }

        let mut candidate = base.clone();
        let mut n = 1;
        while self.is_taken(&candidate) {
            n += 1;
            let suffix = format!(" ({n})");
            let room = MAX_SHEET_NAME - suffix.chars().count();
            candidate = format!("{}{suffix}", tidy(&truncate(&base, room)));
        }

        self.used.insert(candidate.to_lowercase());
        candidate
    }

    fn is_taken(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        lower == RESERVED || self.used.contains(&lower)
    }
}

fn sanitize(part: &str) -> String {
    let replaced: String = part
        .chars()
        .map(|c| if INVALID.contains(&c) || c.is_control() { ' ' } else { c })
        .collect();
    tidy(&replaced.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn compose(director: &str, month: &str) -> String {
    let month_len = month.chars().count();
    if month.is_empty() {
        return tidy(&truncate(director, MAX_SHEET_NAME));
    }
    if month_len + 2 > MAX_SHEET_NAME {
        return tidy(&truncate(month, MAX_SHEET_NAME));
    }

    let director = tidy(&truncate(director, MAX_SHEET_NAME - month_len - 1));
    if director.is_empty() {
        month.to_string()
    } else {
        tidy(&format!("{director} {month}"))
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Strip surrounding whitespace and apostrophes
fn tidy(s: &str) -> String {
    s.trim_matches(|c: char| c == '\'' || c.is_whitespace()).to_string()
}
