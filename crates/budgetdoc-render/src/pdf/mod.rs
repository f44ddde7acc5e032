//! PDF document renderer
//!
//! Writes one section per report unit, each starting on a fresh landscape
//! Letter page:
//!
//! ```text
//! +--------------------------------------------------------+
//! |            PROGRAMA DE ASIGNACIÓN PRESUPUESTAL  [logo] |
//! |                     AXA COLPATRIA                      |
//! |   Asignación presupuestal para Pérez del mes de enero  |
//! |  | Línea de negocio | Ramo | ... | Líder Equipo | Valor | |
//! |  | Línea de negocio | Valor total |                    |
//! |  Total general del presupuesto: 1,750                  |
//! |  Usuario Elaboró: ...  Usuario Revisó: ...  Usuario... |
//! +--------------------------------------------------------+
//! ```
//!
//! Text uses the standard Helvetica fonts with WinAnsi encoding, so no font
//! files are embedded. The logo, when present, is a PNG or JPEG (see `logo`).

mod font;
mod layout;
mod logo;

pub use logo::Logo;

use std::path::Path;

use budgetdoc_core::format::format_amount;
use budgetdoc_core::{BudgetReport, RenderError, Renderer, ReportProfile, ReportUnit};
use chrono::{Local, NaiveDateTime};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info};

use crate::{detail_cells, DETAIL_HEADERS};
use font::{encode, text_width, wrap, Font};
use layout::{Align, Canvas, Table, CONTENT_WIDTH, MARGIN_X, MM, PAGE_HEIGHT, PAGE_WIDTH};

const LOGO_RESOURCE: &str = "Im1";
const LOGO_HEIGHT: f32 = 18.0 * MM;
const TITLE_SHARE: f32 = 0.75;
const SIGNATURE_WIDTH: f32 = 70.0 * MM;
const SIGNATURE_PADDING: f32 = 6.0;
const TOTALS_WIDTHS: [f32; 2] = [80.0 * MM, 40.0 * MM];
const DOCUMENT_TITLE: &str = "Programa de asignación presupuestal";

/// PDF document renderer
#[derive(Clone, Debug)]
pub struct PdfRenderer {
    /// Title lines and signatures
    pub profile: ReportProfile,
    /// Logo drawn at the right of the header
    pub logo: Option<Logo>,
    /// Deflate page content streams
    pub compress: bool,
    /// Creation timestamp written to the document info; now when unset
    pub created: Option<NaiveDateTime>,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            profile: ReportProfile::default(),
            logo: None,
            compress: true,
            created: None,
        }
    }
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given title lines and signatures
    pub fn with_profile(mut self, profile: ReportProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_logo(mut self, logo: Logo) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Read a PNG or JPEG logo from disk
    pub fn load_logo(self, path: &Path) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path)?;
        let logo = Logo::from_bytes(bytes)?;
        debug!(
            path = %path.display(),
            width = logo.width,
            height = logo.height,
            passthrough = logo.is_passthrough(),
            "loaded logo"
        );
        Ok(self.with_logo(logo))
    }

    /// Leave content streams uncompressed (readable in a text editor)
    pub fn uncompressed(mut self) -> Self {
        self.compress = false;
        self
    }

    /// Fix the creation timestamp, for reproducible output
    pub fn created_at(mut self, created: NaiveDateTime) -> Self {
        self.created = Some(created);
        self
    }

    /// Generate PDF bytes
    pub fn render_to_bytes(&self, report: &BudgetReport) -> Result<Vec<u8>, RenderError> {
        let mut canvas = Canvas::new();
        for unit in &report.units {
            canvas.new_page();
            self.layout_unit(&mut canvas, unit);
        }
        let pages = canvas.into_pages();
        info!(units = report.units.len(), pages = pages.len(), "rendering PDF");

        let mut doc = self.build_document(pages)?;
        if self.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| RenderError::Format(format!("Failed to write PDF: {e}")))?;
        Ok(buffer)
    }

    // ========================================================================
    // Layout
    // ========================================================================

    fn layout_unit(&self, canvas: &mut Canvas, unit: &ReportUnit) {
        self.draw_header(canvas);
        canvas.space(6.0 * MM);

        for line in wrap(&unit.subtitle(), Font::Regular, 10.0, CONTENT_WIDTH) {
            canvas.line(MARGIN_X, CONTENT_WIDTH, Align::Center, Font::Regular, 10.0, 12.0, &line);
        }
        canvas.space(5.0 * MM);

        detail_table(unit).draw(canvas);
        canvas.space(5.0 * MM);

        totals_table(unit).draw(canvas);
        canvas.space(3.0 * MM);

        draw_grand_total(canvas, unit);
        canvas.space(8.0 * MM);

        self.draw_signatures(canvas);
    }

    fn draw_header(&self, canvas: &mut Canvas) {
        let title_width = CONTENT_WIDTH * TITLE_SHARE;
        let top = canvas.y();

        if let Some(logo) = &self.logo {
            let max_width = CONTENT_WIDTH - title_width;
            let width = (LOGO_HEIGHT * logo.aspect_ratio()).min(max_width);
            let height = width / logo.aspect_ratio();
            canvas.image(LOGO_RESOURCE, MARGIN_X + CONTENT_WIDTH - width, top - height, width, height);
        }

        for title in &self.profile.title_lines {
            for line in wrap(title, Font::Regular, 12.0, title_width) {
                canvas.line(MARGIN_X, title_width, Align::Center, Font::Regular, 12.0, 14.0, &line);
            }
        }

        if self.logo.is_some() {
            canvas.set_y(canvas.y().min(top - LOGO_HEIGHT));
        }
    }

    fn draw_signatures(&self, canvas: &mut Canvas) {
        let count = self.profile.signatures.len();
        if count == 0 {
            return;
        }

        let width = SIGNATURE_WIDTH.min(CONTENT_WIDTH / count as f32);
        let inner = width - 2.0 * SIGNATURE_PADDING;
        let (size, leading) = (8.0, 10.0);

        let blocks: Vec<Vec<String>> = self
            .profile
            .signatures
            .iter()
            .map(|s| {
                let mut lines = wrap(&s.heading(), Font::Regular, size, inner);
                lines.extend(wrap(&s.position, Font::Regular, size, inner));
                lines
            })
            .collect();

        let tallest = blocks.iter().map(Vec::len).max().unwrap_or(0);
        let height = tallest as f32 * leading + 2.0 * SIGNATURE_PADDING;
        canvas.ensure(height);

        let top = canvas.y();
        let x0 = MARGIN_X + (CONTENT_WIDTH - width * count as f32) / 2.0;
        for (i, lines) in blocks.iter().enumerate() {
            let x = x0 + i as f32 * width + SIGNATURE_PADDING;
            canvas.set_y(top - SIGNATURE_PADDING);
            for line in lines {
                canvas.line(x, inner, Align::Left, Font::Regular, size, leading, line);
            }
        }
        canvas.set_y(top - height);
    }

    // ========================================================================
    // Document assembly
    // ========================================================================

    fn build_document(&self, pages: Vec<Vec<Operation>>) -> Result<Document, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(font_dictionary(Font::Regular));
        let bold = doc.add_object(font_dictionary(Font::Bold));

        let mut xobjects = Dictionary::new();
        if let Some(logo) = &self.logo {
            let image = logo.add_to(&mut doc);
            xobjects.set(LOGO_RESOURCE, image);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                Font::Regular.resource() => regular,
                Font::Bold.resource() => bold,
            },
            "XObject" => xobjects,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations }
                .encode()
                .map_err(|e| RenderError::Format(format!("Failed to encode page: {e}")))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.0f32.into(), 0.0f32.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });

        let created = self.created.unwrap_or_else(|| Local::now().naive_local());
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode(DOCUMENT_TITLE), StringFormat::Literal),
            "Producer" => Object::string_literal(concat!("budgetdoc ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(created.format("D:%Y%m%d%H%M%S").to_string()),
        });

        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        Ok(doc)
    }
}

impl Renderer for PdfRenderer {
    type Output = Vec<u8>;

    fn render(&self, report: &BudgetReport) -> Result<Vec<u8>, RenderError> {
        if report.is_empty() {
            return Err(RenderError::InvalidData("No report units to render".into()));
        }
        self.render_to_bytes(report)
    }
}

fn detail_table(unit: &ReportUnit) -> Table {
    let rows = unit
        .records
        .iter()
        .map(|record| {
            let mut row: Vec<String> = detail_cells(record).iter().map(|c| (*c).to_string()).collect();
            row.push(format_amount(record.amount));
            row
        })
        .collect();

    let mut align = vec![Align::Left; DETAIL_HEADERS.len()];
    align[DETAIL_HEADERS.len() - 1] = Align::Right;

    Table {
        header: DETAIL_HEADERS.iter().map(|h| (*h).to_string()).collect(),
        rows,
        widths: vec![],
        header_align: Align::Center,
        align,
        font_size: 8.0,
    }
    .fit_columns(CONTENT_WIDTH)
}

fn totals_table(unit: &ReportUnit) -> Table {
    Table {
        header: vec!["Línea de negocio".into(), "Valor total".into()],
        rows: unit
            .totals
            .by_line
            .iter()
            .map(|line| vec![line.business_line.clone(), format_amount(line.total)])
            .collect(),
        widths: TOTALS_WIDTHS.to_vec(),
        header_align: Align::Left,
        align: vec![Align::Left, Align::Right],
        font_size: 8.0,
    }
}

fn draw_grand_total(canvas: &mut Canvas, unit: &ReportUnit) {
    let (size, leading) = (9.0, 11.0);
    let label = "Total general del presupuesto: ";
    let amount = format_amount(unit.totals.grand_total);

    canvas.line(MARGIN_X, CONTENT_WIDTH, Align::Left, Font::Regular, size, leading, label);
    // Same baseline as the label, continuing after it in bold
    let baseline = canvas.y() + (leading - size) / 2.0 + size * 0.21;
    let x = MARGIN_X + text_width(label, Font::Regular, size);
    canvas.text(x, baseline, Font::Bold, size, &amount);
}

fn font_dictionary(font: Font) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}
