use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::{Block, ReportDocument, Table};
use crate::error::AppError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;

const TITLE_SIZE: f32 = 18.0;
const SUBTITLE_SIZE: f32 = 12.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 9.0;

/// Rough average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

/// One run of text at an absolute position, in millimetres from the bottom left.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.6
}

fn max_chars(width: f32, size: f32) -> usize {
    ((width / (size * GLYPH_WIDTH * PT_TO_MM)).floor() as usize).max(4)
}

/// Cuts `text` to `limit` characters, marking the cut with "...".
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Greedy word wrap. Words longer than a line are truncated.
fn wrap(text: &str, limit: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word = truncate(word, limit);
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > limit {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Layout {
    pages: Vec<Vec<TextItem>>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Starts a new page unless `height` still fits above the bottom margin.
    fn reserve(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
            return true;
        }
        false
    }

    fn put(&mut self, text: String, x: f32, size: f32, bold: bool) {
        if let Some(page) = self.pages.last_mut() {
            page.push(TextItem {
                text,
                x,
                y: self.y,
                size,
                bold,
            });
        }
    }

    fn line(&mut self, text: String, size: f32, bold: bool) {
        let height = line_height(size);
        self.reserve(height);
        self.y -= height;
        self.put(text, MARGIN, size, bold);
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn row(&mut self, cells: &[String], widths: &[f32], bold: bool) {
        self.y -= line_height(TABLE_SIZE);
        let mut x = MARGIN;
        for (cell, width) in cells.iter().zip(widths) {
            let text = truncate(cell, max_chars(*width - 2.0, TABLE_SIZE));
            self.put(text, x, TABLE_SIZE, bold);
            x += width;
        }
    }

    fn table(&mut self, table: &Table) {
        let columns = table.headers.len().max(1);
        let width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
        let widths = vec![width; columns];
        let height = line_height(TABLE_SIZE);

        self.reserve(height * 2.0);
        self.row(&table.headers, &widths, true);
        for row in &table.rows {
            // Header repeats at the top of every continuation page.
            if self.reserve(height) {
                self.row(&table.headers, &widths, true);
            }
            self.row(row, &widths, false);
        }
        self.gap(height / 2.0);
    }
}

/// Positions every piece of text of `doc`, one entry per page.
pub fn layout(doc: &ReportDocument) -> Vec<Vec<TextItem>> {
    let mut layout = Layout::new();
    let text_width = PAGE_WIDTH - 2.0 * MARGIN;

    for line in wrap(&doc.title, max_chars(text_width, TITLE_SIZE)) {
        layout.line(line, TITLE_SIZE, true);
    }
    if let Some(subtitle) = &doc.subtitle {
        for line in wrap(subtitle, max_chars(text_width, SUBTITLE_SIZE)) {
            layout.line(line, SUBTITLE_SIZE, false);
        }
    }
    layout.line(
        format!(
            "Generated: {}",
            doc.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        BODY_SIZE,
        false,
    );
    layout.gap(line_height(BODY_SIZE));

    for block in &doc.blocks {
        match block {
            Block::Heading(text) => {
                layout.gap(line_height(HEADING_SIZE) / 2.0);
                // Keep a heading with at least the first two lines that follow it.
                layout.reserve(line_height(HEADING_SIZE) + 2.0 * line_height(TABLE_SIZE));
                layout.line(truncate(text, max_chars(text_width, HEADING_SIZE)), HEADING_SIZE, true);
            }
            Block::Paragraph(text) => {
                for line in wrap(text, max_chars(text_width, BODY_SIZE)) {
                    layout.line(line, BODY_SIZE, false);
                }
            }
            Block::Table(table) => layout.table(table),
        }
    }

    layout.pages
}

/// Renders `doc` to PDF bytes using the built-in Helvetica faces.
pub fn render(doc: &ReportDocument) -> Result<Vec<u8>, AppError> {
    let pages = layout(doc);
    let (pdf, first_page, first_layer) =
        PdfDocument::new(&doc.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = pdf.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = pdf.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (index, items) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
        };
        let layer = pdf.get_page(page).get_layer(layer);
        for item in items {
            let font = if item.bold { &bold } else { &regular };
            layer.use_text(item.text.clone(), item.size, Mm(item.x), Mm(item.y), font);
        }
    }

    log::debug!("Rendered report '{}' on {} page(s)", doc.title, pages.len());
    Ok(pdf.save_to_bytes()?)
}
