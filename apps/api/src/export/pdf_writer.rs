//! Built-in converter: lays the captured markdown out as text on PDF pages.
//!
//! Output is a plain PDF 1.4 file using the standard Helvetica faces with
//! WinAnsi encoding, so no font files are needed. Characters outside WinAnsi
//! (emoji icons in the contact line, for instance) are dropped.

use async_trait::async_trait;
use bytes::Bytes;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use tracing::debug;

use crate::export::converter::{ConversionError, PdfConverter, PdfDocument, PdfOptions};
use crate::export::surface::ElementCapture;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_CHAR_WIDTH_EM: f64 = 0.5;
const LINE_HEIGHT: f64 = 1.35;
const BULLET: &str = "• ";

type Rgb = [f64; 3];

const BLACK: Rgb = [0.0, 0.0, 0.0];
const WHITE: Rgb = [1.0, 1.0, 1.0];

pub struct MarkdownPdfConverter;

#[async_trait]
impl PdfConverter for MarkdownPdfConverter {
    async fn convert(
        &self,
        capture: &ElementCapture,
        options: &PdfOptions,
    ) -> Result<PdfDocument, ConversionError> {
        let capture = capture.clone();
        let options = options.clone();
        // Layout is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || render_pdf(&capture, &options))
            .await
            .map_err(|e| ConversionError(format!("PDF render task failed: {e}")))?
    }
}

/// Renders a capture into a complete PDF document.
pub fn render_pdf(
    capture: &ElementCapture,
    options: &PdfOptions,
) -> Result<PdfDocument, ConversionError> {
    if capture.markdown.trim().is_empty() {
        return Err(ConversionError(
            "Nothing to export: the resume is empty".to_string(),
        ));
    }

    let background = match capture.background_color.as_deref() {
        Some(css) => Some(parse_css_color(css).ok_or_else(|| {
            ConversionError(format!("Unsupported background colour '{css}'"))
        })?),
        None if options.draw_background => Some(WHITE),
        None => None,
    };
    let text_color = capture
        .color
        .as_deref()
        .and_then(parse_css_color)
        .unwrap_or(BLACK);

    let blocks = parse_blocks(&capture.markdown);
    let (page_w, page_h) = options.page_size_pt();
    let (margin_v, margin_h) = options.margins_pt();

    let mut writer = PageWriter::new(page_w, page_h, margin_v, margin_h, background, text_color);
    for block in &blocks {
        writer.block(block);
    }
    let pages = writer.finish();

    debug!(
        "Rendered {} markdown blocks onto {} PDF page(s)",
        blocks.len(),
        pages.len()
    );

    let bytes = write_pdf(&pages, page_w, page_h, "Resume");
    Ok(PdfDocument {
        filename: options.filename.clone(),
        bytes: Bytes::from(bytes),
        page_count: pages.len(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Markdown → blocks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Heading(u8),
    Paragraph,
    ListItem,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    kind: BlockKind,
    text: String,
    centered: bool,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: Option<Block>,
    center_depth: usize,
    item_depth: usize,
    links: Vec<(usize, String)>,
}

impl BlockBuilder {
    fn begin(&mut self, kind: BlockKind) {
        self.finish();
        self.current = Some(Block {
            kind,
            text: String::new(),
            centered: self.center_depth > 0,
        });
    }

    fn text(&mut self, text: &str) {
        let centered = self.center_depth > 0;
        let block = self.current.get_or_insert_with(|| Block {
            kind: BlockKind::Paragraph,
            text: String::new(),
            centered,
        });
        block.centered |= centered;
        block.text.push_str(text);
    }

    /// Tracks `<div align="center">` regions; the markdown inside is centered.
    fn html(&mut self, html: &str) {
        let opens = html.matches("align=\"center\"").count();
        let closes = html.matches("</div>").count();
        self.center_depth = (self.center_depth + opens).saturating_sub(closes);
        if opens > 0 {
            if let Some(block) = self.current.as_mut() {
                block.centered = true;
            }
        }
    }

    fn finish(&mut self) {
        if let Some(mut block) = self.current.take() {
            block.text = collapse_whitespace(&clean_text(&block.text));
            if !block.text.is_empty() {
                self.blocks.push(block);
            }
        }
    }

    fn rule(&mut self) {
        self.finish();
        self.blocks.push(Block {
            kind: BlockKind::Rule,
            text: String::new(),
            centered: false,
        });
    }
}

fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut b = BlockBuilder::default();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => b.begin(BlockKind::Heading(level as u8)),
            Event::End(TagEnd::Heading(_)) => b.finish(),
            Event::Start(Tag::Paragraph) if b.item_depth == 0 => b.begin(BlockKind::Paragraph),
            Event::End(TagEnd::Paragraph) if b.item_depth == 0 => b.finish(),
            Event::End(TagEnd::Paragraph) => b.text(" "),
            Event::Start(Tag::Item) => {
                b.item_depth += 1;
                b.begin(BlockKind::ListItem);
            }
            Event::End(TagEnd::Item) => {
                b.finish();
                b.item_depth = b.item_depth.saturating_sub(1);
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                b.text("");
                let start = b.current.as_ref().map_or(0, |c| c.text.len());
                b.links.push((start, dest_url.to_string()));
            }
            Event::End(TagEnd::Link) => {
                if let Some((start, url)) = b.links.pop() {
                    let label = b
                        .current
                        .as_ref()
                        .and_then(|c| c.text.get(start..))
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    if !url.is_empty() && label != url {
                        b.text(&format!(" ({url})"));
                    }
                }
            }
            Event::Text(t) | Event::Code(t) => b.text(&t),
            Event::SoftBreak | Event::HardBreak => b.text(" "),
            Event::Html(h) | Event::InlineHtml(h) => b.html(&h),
            Event::Rule => b.rule(),
            _ => {}
        }
    }

    b.finish();
    b.blocks
}

// ────────────────────────────────────────────────────────────────────────────
// Blocks → page content streams
// ────────────────────────────────────────────────────────────────────────────

struct BlockStyle {
    font: &'static str,
    size: f64,
    space_before: f64,
    space_after: f64,
}

fn style_for(kind: BlockKind) -> BlockStyle {
    let (font, size, space_before, space_after) = match kind {
        BlockKind::Heading(1) => ("F2", 20.0, 10.0, 6.0),
        BlockKind::Heading(2) => ("F2", 15.0, 10.0, 4.0),
        BlockKind::Heading(_) => ("F2", 12.0, 6.0, 2.0),
        BlockKind::Paragraph => ("F1", 10.5, 0.0, 6.0),
        BlockKind::ListItem => ("F1", 10.5, 0.0, 3.0),
        BlockKind::Rule => ("F1", 0.0, 6.0, 6.0),
    };
    BlockStyle {
        font,
        size,
        space_before,
        space_after,
    }
}

struct PageWriter {
    pages: Vec<String>,
    stream: String,
    y: f64,
    at_top: bool,
    page_w: f64,
    page_h: f64,
    margin_v: f64,
    margin_h: f64,
    background: Option<Rgb>,
    text_color: Rgb,
}

impl PageWriter {
    fn new(
        page_w: f64,
        page_h: f64,
        margin_v: f64,
        margin_h: f64,
        background: Option<Rgb>,
        text_color: Rgb,
    ) -> Self {
        let mut writer = Self {
            pages: Vec::new(),
            stream: String::new(),
            y: 0.0,
            at_top: true,
            page_w,
            page_h,
            margin_v,
            margin_h,
            background,
            text_color,
        };
        writer.begin_page();
        writer
    }

    fn begin_page(&mut self) {
        if let Some([r, g, b]) = self.background {
            self.stream.push_str(&format!(
                "{r:.3} {g:.3} {b:.3} rg\n0 0 {:.2} {:.2} re\nf\n",
                self.page_w, self.page_h
            ));
        }
        self.y = self.page_h - self.margin_v;
        self.at_top = true;
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.stream));
        self.begin_page();
    }

    fn usable_width(&self) -> f64 {
        self.page_w - 2.0 * self.margin_h
    }

    fn block(&mut self, block: &Block) {
        let style = style_for(block.kind);
        if !self.at_top {
            self.y -= style.space_before;
        }

        if block.kind == BlockKind::Rule {
            self.rule();
            self.y -= style.space_after;
            return;
        }

        let char_w = style.size * AVG_CHAR_WIDTH_EM;
        let (prefix, indent) = if block.kind == BlockKind::ListItem {
            (BULLET, BULLET.chars().count() as f64 * char_w)
        } else {
            ("", 0.0)
        };
        let max_chars = (((self.usable_width() - indent) / char_w).floor() as usize).max(1);

        for (i, line) in word_wrap(&block.text, max_chars).into_iter().enumerate() {
            let (text, x_offset) = if i == 0 {
                (format!("{prefix}{line}"), 0.0)
            } else {
                (line, indent)
            };
            let x = if block.centered {
                let est = text.chars().count() as f64 * char_w;
                ((self.page_w - est) / 2.0).max(self.margin_h)
            } else {
                self.margin_h + x_offset
            };
            self.line(&text, x, &style);
        }

        self.y -= style.space_after;
    }

    fn line(&mut self, text: &str, x: f64, style: &BlockStyle) {
        let line_h = style.size * LINE_HEIGHT;
        if self.y - line_h < self.margin_v && !self.at_top {
            self.new_page();
        }
        let baseline = self.y - style.size;
        let [r, g, b] = self.text_color;
        self.stream.push_str(&format!(
            "BT\n/{} {:.1} Tf\n{r:.3} {g:.3} {b:.3} rg\n{x:.2} {baseline:.2} Td\n({}) Tj\nET\n",
            style.font,
            style.size,
            escape_pdf_text(text)
        ));
        self.y -= line_h;
        self.at_top = false;
    }

    fn rule(&mut self) {
        if self.y - 1.0 < self.margin_v {
            self.new_page();
        }
        let [r, g, b] = self.text_color;
        self.stream.push_str(&format!(
            "{r:.3} {g:.3} {b:.3} RG\n0.5 w\n{:.2} {y:.2} m\n{:.2} {y:.2} l\nS\n",
            self.margin_h,
            self.page_w - self.margin_h,
            y = self.y
        ));
        self.at_top = false;
    }

    fn finish(mut self) -> Vec<String> {
        self.pages.push(self.stream);
        self.pages
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PDF serialization
// ────────────────────────────────────────────────────────────────────────────

/// Writes catalog, page tree, one page + content stream per page, the two
/// Helvetica fonts, an info dictionary, the xref table and the trailer.
fn write_pdf(pages: &[String], width: f64, height: f64, title: &str) -> Vec<u8> {
    let mut pdf = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    pdf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let page_count = pages.len();
    let font_id = 3 + page_count * 2;
    let info_id = font_id + 2;

    offsets.push(pdf.len());
    pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", 3 + i * 2))
        .collect::<Vec<_>>()
        .join(" ");
    offsets.push(pdf.len());
    pdf.extend_from_slice(
        format!("2 0 obj\n<< /Type /Pages /Kids [{kids}] /Count {page_count} >>\nendobj\n")
            .as_bytes(),
    );

    for (i, stream) in pages.iter().enumerate() {
        let page_id = 3 + i * 2;
        offsets.push(pdf.len());
        pdf.extend_from_slice(
            format!(
                "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width:.2} {height:.2}] \
                 /Contents {} 0 R /Resources << /Font << /F1 {font_id} 0 R /F2 {} 0 R >> >> >>\nendobj\n",
                page_id + 1,
                font_id + 1
            )
            .as_bytes(),
        );

        offsets.push(pdf.len());
        pdf.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Length {} >>\nstream\n{stream}\nendstream\nendobj\n",
                page_id + 1,
                stream.len()
            )
            .as_bytes(),
        );
    }

    for (offset, base_font) in ["Helvetica", "Helvetica-Bold"].iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>\nendobj\n",
                font_id + offset
            )
            .as_bytes(),
        );
    }

    offsets.push(pdf.len());
    pdf.extend_from_slice(
        format!(
            "{info_id} 0 obj\n<< /Title ({}) /Producer (Mirai) >>\nendobj\n",
            escape_pdf_text(title)
        )
        .as_bytes(),
    );

    let xref_start = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_start}\n%%EOF\n",
            offsets.len() + 1
        )
        .as_bytes(),
    );

    pdf
}

// ────────────────────────────────────────────────────────────────────────────
// Text helpers
// ────────────────────────────────────────────────────────────────────────────

/// WinAnsi code for a character, if the standard fonts can draw it.
fn win_ansi_byte(c: char) -> Option<u8> {
    match c {
        ' '..='~' => Some(c as u8),
        '\u{a0}'..='\u{ff}' => Some(c as u32 as u8),
        '€' => Some(0x80),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        _ => None,
    }
}

fn clean_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|&c| win_ansi_byte(c).is_some())
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes a string for a PDF literal; non-ASCII WinAnsi bytes become octal escapes.
fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.chars().filter_map(win_ansi_byte) {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b if b.is_ascii() => out.push(b as char),
            b => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out
}

fn word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace().flat_map(|w| split_long_word(w, max_chars)) {
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cuts a word longer than a line (e.g. a long URL) into line-sized pieces.
fn split_long_word(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Parses `rgb(r, g, b)`, `#rrggbb`, `white` and `black` into unit RGB.
fn parse_css_color(css: &str) -> Option<Rgb> {
    let css = css.trim().to_ascii_lowercase();
    match css.as_str() {
        "white" => return Some(WHITE),
        "black" => return Some(BLACK),
        _ => {}
    }

    if let Some(inner) = css.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        let parts: Vec<f64> = inner
            .split(',')
            .map(|p| p.trim().parse::<f64>().ok())
            .collect::<Option<_>>()?;
        return match parts.as_slice() {
            [r, g, b] if [r, g, b].iter().all(|v| (0.0..=255.0).contains(*v)) => {
                Some([r / 255.0, g / 255.0, b / 255.0])
            }
            _ => None,
        };
    }

    let hex = css.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|v| v as f64 / 255.0);
    Some([channel(0)?, channel(2)?, channel(4)?])
}
