//! Excel workbook renderer
//!
//! Generates an XLSX file with one sheet per report unit. Each sheet holds
//! the unit's detail rows (no aggregates) so the figures can be filtered or
//! pivoted:
//!
//! ```text
//! Sheet: Pérez enero
//! | Línea de negocio | Ramo      | Zona   | ... | Líder Equipo | Valor |
//! |------------------|-----------|--------|-----|--------------|-------|
//! | Autos            | Generales | Centro | ... | Ruiz         | 1,500 |
//! ```

use budgetdoc_core::{BudgetReport, RenderError, Renderer, ReportUnit};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{DocProperties, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::{detail_cells, SheetNamer, DETAIL_HEADERS};

/// Excel workbook renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Number format applied to amounts
    pub amount_format: String,
    /// Keep the header row visible while scrolling
    pub freeze_header: bool,
    /// Add filter buttons to the header row
    pub autofilter: bool,
    /// Column widths in characters, in `DETAIL_HEADERS` order
    pub column_widths: [f64; 8],
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            amount_format: "#,##0".into(),
            freeze_header: true,
            autofilter: false,
            column_widths: [22.0, 18.0, 14.0, 16.0, 16.0, 18.0, 24.0, 14.0],
        }
    }
}

struct ExcelFormats {
    header: Format,
    text: Format,
    amount: Format,
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the amount number format
    pub fn amount_format(mut self, format: impl Into<String>) -> Self {
        self.amount_format = format.into();
        self
    }

    /// Do not freeze the header row
    pub fn no_freeze_header(mut self) -> Self {
        self.freeze_header = false;
        self
    }

    /// Add an autofilter over each sheet's table
    pub fn with_autofilter(mut self) -> Self {
        self.autofilter = true;
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, report: &BudgetReport) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();

        let properties = DocProperties::new()
            .set_title("Programa de asignación presupuestal")
            .set_subject("Detalle por director y mes");
        workbook.set_properties(&properties);

        let mut namer = SheetNamer::new();
        for unit in &report.units {
            let name = namer.name(&unit.director, &unit.month_label());
            debug!(sheet = %name, records = unit.records.len(), "adding worksheet");
            let sheet = workbook.add_worksheet();
            sheet
                .set_name(&name)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            self.write_unit(sheet, unit, &formats)?;
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;

        Ok(buffer)
    }

    fn create_formats(&self) -> ExcelFormats {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0xD3D3D3)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let amount = Format::new()
            .set_num_format(&self.amount_format)
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            header,
            text,
            amount,
        }
    }

    fn write_unit(
        &self,
        sheet: &mut Worksheet,
        unit: &ReportUnit,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        for (col, header) in DETAIL_HEADERS.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        for (col, width) in self.column_widths.iter().enumerate() {
            sheet.set_column_width(col as u16, *width).ok();
        }

        let amount_col = (DETAIL_HEADERS.len() - 1) as u16;
        for (i, record) in unit.records.iter().enumerate() {
            let row = i as u32 + 1;
            for (col, cell) in detail_cells(record).iter().enumerate() {
                sheet
                    .write_with_format(row, col as u16, *cell, &formats.text)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }
            let amount = record.amount.to_f64().unwrap_or(0.0);
            sheet
                .write_with_format(row, amount_col, amount, &formats.amount)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        if self.freeze_header {
            sheet.set_freeze_panes(1, 0).ok();
        }
        if self.autofilter && !unit.records.is_empty() {
            sheet
                .autofilter(0, 0, unit.records.len() as u32, amount_col)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        Ok(())
    }
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, report: &BudgetReport) -> Result<Vec<u8>, RenderError> {
        if report.is_empty() {
            return Err(RenderError::InvalidData("No report units to render".into()));
        }
        self.render_to_bytes(report)
    }
}
