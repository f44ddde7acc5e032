//! # budgetdoc-render
//!
//! Rendering backends for budget reports.
//!
//! This crate provides:
//! - PDF document report: one section per director and month, with detail
//!   table, per-line totals, grand total and signature footer
//! - Excel workbook: one sheet per director and month with the detail rows
//! - Text summary for terminals
//!
//! ## Example
//!
//! ```rust,ignore
//! use budgetdoc_core::Renderer;
//! use budgetdoc_render::{ExcelRenderer, PdfRenderer};
//!
//! let pdf = PdfRenderer::new().render(&report)?;
//! std::fs::write("programa_asignacion_presupuestal.pdf", pdf)?;
//!
//! let xlsx = ExcelRenderer::new().render(&report)?;
//! std::fs::write("programa_asignacion_presupuestal.xlsx", xlsx)?;
//! ```

pub mod excel;
pub mod pdf;
pub mod sheet_name;

pub use excel::ExcelRenderer;
pub use pdf::{Logo, PdfRenderer};
pub use sheet_name::SheetNamer;

use budgetdoc_core::format::format_amount;
use budgetdoc_core::{BudgetRecord, BudgetReport, RawTable, RenderError, Renderer};

/// Column headers of the detail table, shared by the PDF and the workbook
pub const DETAIL_HEADERS: [&str; 8] = [
    "Línea de negocio",
    "Ramo",
    "Zona",
    "Canal",
    "Sub-Canal",
    "Oficina",
    "Líder Equipo",
    "Valor",
];

/// Descriptive cells of a detail row, in `DETAIL_HEADERS` order (amount excluded)
pub fn detail_cells(record: &BudgetRecord) -> [&str; 7] {
    [
        &record.business_line,
        &record.ramo,
        &record.zone,
        &record.channel,
        &record.sub_channel,
        &record.office,
        &record.team_lead,
    ]
}

// ============================================================================
// Text summary
// ============================================================================

/// Plain-text summary of the report units
#[derive(Clone, Debug, Default)]
pub struct TextRenderer {
    /// Include per-line totals under each unit
    pub show_lines: bool,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// List business-line totals under each unit
    pub fn with_lines(mut self) -> Self {
        self.show_lines = true;
        self
    }

    fn render_units(&self, report: &BudgetReport) -> String {
        let header = ["Director", "Mes", "Año", "Registros", "Total"];
        let rows: Vec<[String; 5]> = report
            .units
            .iter()
            .map(|u| {
                [
                    u.director.clone(),
                    u.month_label(),
                    u.year_label(),
                    u.records.len().to_string(),
                    format_amount(u.totals.grand_total),
                ]
            })
            .collect();

        let mut widths = header.map(|h| h.chars().count());
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_row(&mut out, &header.map(String::from), &widths, &[false, false, false, true, true]);
        push_rule(&mut out, &widths);

        for (unit, row) in report.units.iter().zip(&rows) {
            push_row(&mut out, row, &widths, &[false, false, false, true, true]);
            if self.show_lines {
                for line in &unit.totals.by_line {
                    out.push_str(&format!(
                        "    {}: {}\n",
                        line.business_line,
                        format_amount(line.total)
                    ));
                }
            }
        }

        push_rule(&mut out, &widths);
        out.push_str(&format!(
            "{} unidad(es), total {}\n",
            report.units.len(),
            format_amount(report.grand_total())
        ));
        out
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, report: &BudgetReport) -> Result<String, RenderError> {
        Ok(self.render_units(report))
    }
}

/// First `limit` rows of a raw table, as aligned text
pub fn preview_table(table: &RawTable, limit: usize) -> String {
    let shown: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            (0..table.headers.len())
                .map(|col| row.get(col).map(|c| c.display_text()).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &shown {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let align = vec![false; widths.len()];
    let mut out = String::new();
    push_row(&mut out, &table.headers, &widths, &align);
    push_rule(&mut out, &widths);
    for row in &shown {
        push_row(&mut out, row, &widths, &align);
    }
    if table.row_count() > limit {
        out.push_str(&format!("... {} more row(s)\n", table.row_count() - limit));
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize], right: &[bool]) {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .zip(right)
        .map(|((cell, width), right)| {
            let pad = width.saturating_sub(cell.chars().count());
            if *right {
                format!("{}{}", " ".repeat(pad), cell)
            } else {
                format!("{}{}", cell, " ".repeat(pad))
            }
        })
        .collect();
    out.push_str(parts.join(" | ").trim_end());
    out.push('\n');
}

fn push_rule(out: &mut String, widths: &[usize]) {
    let parts: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&parts.join("-+-"));
    out.push('\n');
}
