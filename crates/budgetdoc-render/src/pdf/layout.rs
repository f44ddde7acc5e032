//! Page cursor and table drawing on top of raw content operations

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use super::font::{encode, fit, text_width, Font};

/// Landscape US Letter
pub const PAGE_WIDTH: f32 = 792.0;
pub const PAGE_HEIGHT: f32 = 612.0;
pub const MM: f32 = 72.0 / 25.4;
pub const MARGIN_X: f32 = 15.0 * MM;
pub const MARGIN_Y: f32 = 10.0 * MM;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

const CELL_PADDING: f32 = 3.0;
const GRID_WIDTH: f32 = 0.5;
const HEADER_GREY: f32 = 0.827;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Content operations per page, with a top-down vertical cursor
#[derive(Debug, Default)]
pub struct Canvas {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN_Y;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn into_pages(self) -> Vec<Vec<Operation>> {
        self.pages
    }

    /// Current cursor position, measured from the page bottom
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y - height >= MARGIN_Y
    }

    /// Start a new page unless `height` fits below the cursor
    pub fn ensure(&mut self, height: f32) {
        if self.pages.is_empty() || !self.fits(height) {
            self.new_page();
        }
    }

    /// Vertical gap; swallowed at the bottom of a page
    pub fn space(&mut self, height: f32) {
        self.y = (self.y - height).max(MARGIN_Y);
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.new_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Draw one line of text with its baseline at `baseline`
    pub fn text(&mut self, x: f32, baseline: f32, font: Font, size: f32, text: &str) {
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font.resource().into(), size.into()]));
        ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Draw text aligned inside the horizontal span `[x, x + width]`
    #[allow(clippy::too_many_arguments)]
    pub fn text_in(
        &mut self,
        x: f32,
        width: f32,
        baseline: f32,
        align: Align,
        font: Font,
        size: f32,
        text: &str,
    ) {
        let w = text_width(text, font, size);
        let start = match align {
            Align::Left => x,
            Align::Center => x + (width - w) / 2.0,
            Align::Right => x + width - w,
        };
        self.text(start, baseline, font, size, text);
    }

    /// One line of a paragraph spanning `[x, x + width]`, breaking pages as needed
    #[allow(clippy::too_many_arguments)]
    pub fn line(&mut self, x: f32, width: f32, align: Align, font: Font, size: f32, leading: f32, text: &str) {
        self.ensure(leading);
        self.y -= leading;
        let baseline = self.y + (leading - size) / 2.0 + descent(size);
        self.text_in(x, width, baseline, align, font, size, text);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, grey: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("g", vec![grey.into()]));
        ops.push(Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]));
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("w", vec![line_width.into()]));
        ops.push(Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Paint an image XObject into the given box
    pub fn image(&mut self, name: &str, x: f32, y: f32, width: f32, height: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                width.into(),
                0.0f32.into(),
                0.0f32.into(),
                height.into(),
                x.into(),
                y.into(),
            ],
        ));
        ops.push(Operation::new("Do", vec![name.into()]));
        ops.push(Operation::new("Q", vec![]));
    }
}

fn descent(size: f32) -> f32 {
    size * 0.21
}

// ============================================================================
// Tables
// ============================================================================

/// A gridded table with a grey header row repeated on every page it spans
#[derive(Clone, Debug)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub widths: Vec<f32>,
    pub header_align: Align,
    pub align: Vec<Align>,
    pub font_size: f32,
}

impl Table {
    pub fn row_height(&self) -> f32 {
        self.font_size + 2.0 * CELL_PADDING
    }

    pub fn total_width(&self) -> f32 {
        self.widths.iter().sum()
    }

    /// Size columns to their content, shrinking proportionally past `max_width`
    pub fn fit_columns(mut self, max_width: f32) -> Self {
        let mut widths: Vec<f32> = self
            .header
            .iter()
            .map(|h| text_width(h, Font::Regular, self.font_size))
            .collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = w.max(text_width(cell, Font::Regular, self.font_size));
            }
        }
        for w in &mut widths {
            *w += 2.0 * CELL_PADDING;
        }

        let total: f32 = widths.iter().sum();
        if total > max_width {
            let scale = max_width / total;
            for w in &mut widths {
                *w *= scale;
            }
        }
        self.widths = widths;
        self
    }

    /// Draw centered on the content width, continuing on new pages
    pub fn draw(&self, canvas: &mut Canvas) {
        let row_height = self.row_height();
        let x = MARGIN_X + ((CONTENT_WIDTH - self.total_width()) / 2.0).max(0.0);

        let first = if self.rows.is_empty() { row_height } else { 2.0 * row_height };
        canvas.ensure(first);
        self.draw_row(canvas, x, &self.header, true);

        for row in &self.rows {
            if !canvas.fits(row_height) {
                canvas.new_page();
                self.draw_row(canvas, x, &self.header, true);
            }
            self.draw_row(canvas, x, row, false);
        }
    }

    fn draw_row(&self, canvas: &mut Canvas, x: f32, cells: &[String], header: bool) {
        let height = self.row_height();
        let bottom = canvas.y() - height;
        let baseline = bottom + CELL_PADDING + descent(self.font_size);

        if header {
            canvas.fill_rect(x, bottom, self.total_width(), height, HEADER_GREY);
        }

        let mut left = x;
        for (col, width) in self.widths.iter().enumerate() {
            canvas.stroke_rect(left, bottom, *width, height, GRID_WIDTH);
            let cell = cells.get(col).map_or("", String::as_str);
            let inner = width - 2.0 * CELL_PADDING;
            let text = fit(cell, Font::Regular, self.font_size, inner);
            let align = if header {
                self.header_align
            } else {
                self.align.get(col).copied().unwrap_or(Align::Left)
            };
            canvas.text_in(
                left + CELL_PADDING,
                inner,
                baseline,
                align,
                Font::Regular,
                self.font_size,
                &text,
            );
            left += width;
        }

        canvas.set_y(bottom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> Table {
        Table {
            header: vec!["Línea de negocio".into(), "Valor".into()],
            rows: (0..rows).map(|i| vec![format!("Línea {i}"), "1,000".into()]).collect(),
            widths: vec![],
            header_align: Align::Center,
            align: vec![Align::Left, Align::Right],
            font_size: 8.0,
        }
        .fit_columns(CONTENT_WIDTH)
    }

    #[test]
    fn columns_fit_content() {
        let t = table(3);
        assert_eq!(t.widths.len(), 2);
        assert!(t.widths[0] > t.widths[1]);
        assert!(t.total_width() <= CONTENT_WIDTH);
    }

    #[test]
    fn wide_tables_are_scaled_down() {
        let mut t = table(1);
        t.rows[0][0] = "x".repeat(400);
        let t = t.fit_columns(CONTENT_WIDTH);
        assert!((t.total_width() - CONTENT_WIDTH).abs() < 0.01);
    }

    #[test]
    fn short_table_stays_on_one_page() {
        let mut canvas = Canvas::new();
        canvas.new_page();
        table(10).draw(&mut canvas);
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn long_table_continues_on_next_page() {
        let mut canvas = Canvas::new();
        canvas.new_page();
        table(80).draw(&mut canvas);
        assert!(canvas.page_count() >= 2);
        let pages = canvas.into_pages();
        // header repeated: every page starts with the grey header fill
        for page in &pages {
            assert_eq!(page[1].operator, "g");
        }
    }

    #[test]
    fn space_is_swallowed_at_page_bottom() {
        let mut canvas = Canvas::new();
        canvas.new_page();
        canvas.space(10_000.0);
        assert!((canvas.y() - MARGIN_Y).abs() < f32::EPSILON);
        assert!(!canvas.fits(1.0));
    }
}
