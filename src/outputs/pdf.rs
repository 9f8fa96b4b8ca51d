//! The paginated printable export.
//!
//! Reproduces a fixed paragraph-layout algorithm: the outline is split on
//! blank lines, `#`-led paragraphs become bold headings, everything else is
//! wrapped body text, and the cursor starts a new page whenever the next
//! paragraph would run into the bottom margin.
//!
//! Unicode support is a capability, not a requirement: when the DejaVu font
//! assets are present on disk they are embedded, otherwise rendering
//! degrades to the built-in Helvetica faces instead of failing.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::ExportError;

/// Directory searched for the optional Unicode font assets.
const FONT_DIR: &str = "assets";

// Page geometry in millimeters (A4 portrait).
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const LEFT_MARGIN: f32 = 15.0;
const TOP_MARGIN: f32 = 15.0;
const BOTTOM_MARGIN: f32 = 20.0;
/// Room a paragraph must have left before it starts, else page-break first.
const PARA_LOOKAHEAD: f32 = 30.0;

const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const HEADING_LINE_H: f32 = 10.0;
const BODY_LINE_H: f32 = 7.0;
/// Vertical gap after each body paragraph.
const PARA_GAP: f32 = 2.0;
/// Wrap column for body text, in characters.
const WRAP_COLS: usize = 90;

/// One renderable paragraph of the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A `#`-led paragraph, markers and surrounding spaces stripped.
    Heading(String),
    /// Any other non-empty paragraph.
    Body(String),
}

/// Split raw outline text into renderable blocks.
///
/// Paragraphs are separated by blank lines; whitespace-only paragraphs are
/// dropped.
pub fn segment(raw_text: &str) -> Vec<Block> {
    raw_text
        .split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(|para| {
            if para.starts_with('#') {
                Block::Heading(
                    para.trim_matches(|c| c == '#' || c == ' ')
                        .to_string(),
                )
            } else {
                Block::Body(para.to_string())
            }
        })
        .collect()
}

/// Word-wrap a single line to at most `max_cols` characters.
///
/// Words longer than the column limit are hard-split. An empty line yields
/// one empty output line so paragraph spacing is preserved.
pub fn wrap_line(line: &str, max_cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_cols = 0usize;

    for word in line.split_whitespace() {
        let word_cols = word.chars().count();
        if current_cols > 0 && current_cols + 1 + word_cols > max_cols {
            lines.push(std::mem::take(&mut current));
            current_cols = 0;
        }
        if word_cols > max_cols {
            // hard-split oversized words
            for ch in word.chars() {
                if current_cols == max_cols {
                    lines.push(std::mem::take(&mut current));
                    current_cols = 0;
                }
                current.push(ch);
                current_cols += 1;
            }
        } else {
            if current_cols > 0 {
                current.push(' ');
                current_cols += 1;
            }
            current.push_str(word);
            current_cols += word_cols;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Capability check for Unicode rendering: both DejaVu faces must exist.
pub fn unicode_font_files() -> Option<(PathBuf, PathBuf)> {
    let dir = Path::new(FONT_DIR);
    let regular = dir.join("DejaVuSans.ttf");
    let bold = dir.join("DejaVuSans-Bold.ttf");
    (regular.is_file() && bold.is_file()).then_some((regular, bold))
}

struct FontPair {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn load_fonts(doc: &PdfDocumentReference) -> Result<FontPair, ExportError> {
    match unicode_font_files() {
        Some((regular, bold)) => {
            info!("Embedding Unicode font assets");
            Ok(FontPair {
                regular: doc
                    .add_external_font(File::open(&regular)?)
                    .map_err(|e| ExportError::Pdf(e.to_string()))?,
                bold: doc
                    .add_external_font(File::open(&bold)?)
                    .map_err(|e| ExportError::Pdf(e.to_string()))?,
            })
        }
        None => {
            warn!("Unicode font assets not found; rendering with built-in fonts");
            Ok(FontPair {
                regular: doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| ExportError::Pdf(e.to_string()))?,
                bold: doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| ExportError::Pdf(e.to_string()))?,
            })
        }
    }
}

/// Render the outline to a paginated PDF at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn write_pdf(raw_text: &str, path: &Path) -> Result<(), ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Seedling Outline", Mm(PAGE_W), Mm(PAGE_H), "outline");
    let fonts = load_fonts(&doc)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut used = TOP_MARGIN;
    let mut pages = 1usize;

    let break_page = |layer: &mut printpdf::PdfLayerReference,
                          used: &mut f32,
                          pages: &mut usize| {
        let (page, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "outline");
        *layer = doc.get_page(page).get_layer(layer_idx);
        *used = TOP_MARGIN;
        *pages += 1;
    };

    for block in segment(raw_text) {
        // Paragraph lookahead: break before starting anything that would
        // crowd the bottom margin.
        if used + PARA_LOOKAHEAD > PAGE_H - BOTTOM_MARGIN {
            break_page(&mut layer, &mut used, &mut pages);
        }
        match block {
            Block::Heading(text) => {
                used += HEADING_LINE_H;
                layer.use_text(
                    text,
                    HEADING_SIZE,
                    Mm(LEFT_MARGIN),
                    Mm(PAGE_H - used),
                    &fonts.bold,
                );
            }
            Block::Body(text) => {
                for line in text.lines().flat_map(|l| wrap_line(l, WRAP_COLS)) {
                    // Line-level overflow check, independent of the lookahead
                    if used + BODY_LINE_H > PAGE_H - BOTTOM_MARGIN {
                        break_page(&mut layer, &mut used, &mut pages);
                    }
                    used += BODY_LINE_H;
                    layer.use_text(
                        line,
                        BODY_SIZE,
                        Mm(LEFT_MARGIN),
                        Mm(PAGE_H - used),
                        &fonts.regular,
                    );
                }
                used += PARA_GAP;
            }
        }
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    info!(pages, "Wrote PDF export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_headings_and_bodies_in_source_order() {
        let raw = "# Title\n\nBody paragraph one.\n\n# Section 2\n\nBody paragraph two.";
        assert_eq!(
            segment(raw),
            vec![
                Block::Heading("Title".to_string()),
                Block::Body("Body paragraph one.".to_string()),
                Block::Heading("Section 2".to_string()),
                Block::Body("Body paragraph two.".to_string()),
            ]
        );
    }

    #[test]
    fn test_segment_without_markers_never_yields_headings() {
        let raw = "First paragraph.\n\nSecond one,\nspanning two lines.\n\nThird.";
        let blocks = segment(raw);
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| matches!(b, Block::Body(_))));
    }

    #[test]
    fn test_segment_skips_blank_paragraphs() {
        let raw = "One.\n\n   \n\n\n\nTwo.";
        assert_eq!(
            segment(raw),
            vec![
                Block::Body("One.".to_string()),
                Block::Body("Two.".to_string())
            ]
        );
    }

    #[test]
    fn test_segment_strips_heading_markers_and_spaces() {
        assert_eq!(
            segment("##  Deep Heading  ##"),
            vec![Block::Heading("Deep Heading".to_string())]
        );
    }

    #[test]
    fn test_wrap_line_breaks_at_word_boundaries() {
        let wrapped = wrap_line("one two three four five", 9);
        assert_eq!(wrapped, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn test_wrap_line_hard_splits_oversized_words() {
        let wrapped = wrap_line("abcdefghij", 4);
        assert_eq!(wrapped, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_line_short_input_is_untouched() {
        assert_eq!(wrap_line("short", 90), vec!["short"]);
        assert_eq!(wrap_line("", 90), vec![""]);
    }

    #[test]
    fn test_write_pdf_produces_a_pdf_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("outline.pdf");
        write_pdf("# Title\n\nBody paragraph.", &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_write_pdf_handles_long_documents() {
        let raw = (0..120)
            .map(|i| format!("# Section {i}\n\nParagraph for section {i}, with enough words that wrapping occurs at the configured column limit over and over again."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("long.pdf");
        write_pdf(&raw, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
