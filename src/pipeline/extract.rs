//! PDF text extraction: positioned fragments per page, via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread pool thread designed for blocking operations, keeping the Tokio
//! worker threads responsive during CPU-heavy extraction.
//!
//! ## Why group lines into blocks?
//!
//! pdfium reports text one line at a time, but the tagger reasons about
//! whole script elements: a three-line stage direction is one fragment
//! with one bounding box and its left edge decides its role. So adjacent
//! lines sharing an indent, one line apart vertically, are merged into a
//! single fragment, with line breaks collapsed to single spaces (no space
//! is inserted after a hyphenated break). Lines in different indentation
//! lanes never merge, however close: a character name single-spaced above
//! its dialogue is two script elements, not one.

use crate::config::ScriptLayout;
use crate::error::ConvertError;
use crate::pipeline::geometry::BoundingBox;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A positioned text fragment: one logical block of script text.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub bbox: BoundingBox,
}

impl Fragment {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// One extracted page: physical dimensions plus its fragments in
/// reading order.
#[derive(Debug, Clone)]
pub struct ScriptPage {
    /// 1-based physical page number.
    pub number: usize,
    pub width: f32,
    pub height: f32,
    pub fragments: Vec<Fragment>,
}

static HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\n").unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r" *\n *").unwrap());

/// Collapse intra-block line breaks: the break after a trailing hyphen is
/// removed outright, any other break becomes a single space.
pub fn join_lines(text: &str) -> String {
    let healed = HYPHEN_BREAK.replace_all(text, "-");
    LINE_BREAK.replace_all(&healed, " ").into_owned()
}

/// Merge single-line fragments into multi-line blocks.
///
/// Lines must arrive in reading order (top to bottom). A line joins the
/// current block when it shares the block's left edge (within the indent
/// tolerance), overlaps it horizontally and its top edge sits within one
/// line-height of the block's bottom edge; otherwise it starts a new
/// block. The merged bounding box is the union of the lines' boxes.
pub fn group_blocks(lines: Vec<Fragment>, layout: &ScriptLayout) -> Vec<Fragment> {
    let mut blocks: Vec<Fragment> = Vec::new();

    for line in lines {
        if line.text.trim().is_empty() {
            continue;
        }
        if let Some(block) = blocks.last_mut() {
            if continues_block(block, &line, layout) {
                block.text.push('\n');
                block.text.push_str(&line.text);
                block.bbox = union(&block.bbox, &line.bbox);
                continue;
            }
        }
        blocks.push(line);
    }

    for block in &mut blocks {
        block.text = join_lines(block.text.trim());
    }
    blocks
}

fn continues_block(block: &Fragment, line: &Fragment, layout: &ScriptLayout) -> bool {
    // Wrapped lines of one script element share their indent; a lane
    // change (character name above its dialogue) never does.
    let same_indent = (block.bbox.x0 - line.bbox.x0).abs() <= layout.indent_tolerance;
    let horizontal_overlap = block.bbox.x0 <= line.bbox.x1 && block.bbox.x1 >= line.bbox.x0;
    let line_height = (block.bbox.y1 - block.bbox.y0)
        .min(line.bbox.y1 - line.bbox.y0)
        .max(1.0);
    // `line` sits below `block`: gap measured from the block's bottom edge
    // down to the line's top edge.
    let gap = block.bbox.y0 - line.bbox.y1;
    same_indent
        && horizontal_overlap
        && gap > -line_height
        && gap <= layout.line_gap_factor * line_height
}

fn union(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
    BoundingBox::new(
        a.x0.min(b.x0),
        a.x1.max(b.x1),
        a.y0.min(b.y0),
        a.y1.max(b.y1),
    )
}

/// Extract positioned text fragments from every page of a PDF.
///
/// Validates the file exists and carries PDF magic bytes before handing it
/// to pdfium, so callers get a meaningful error rather than a pdfium crash.
pub async fn load_script(
    pdf_path: &Path,
    layout: &ScriptLayout,
) -> Result<Vec<ScriptPage>, ConvertError> {
    validate_pdf_file(pdf_path)?;

    let path = pdf_path.to_path_buf();
    let layout = layout.clone();
    tokio::task::spawn_blocking(move || load_script_blocking(&path, &layout))
        .await
        .map_err(|e| ConvertError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Validate existence and `%PDF` magic bytes.
fn validate_pdf_file(path: &Path) -> Result<(), ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    match std::fs::File::open(path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ConvertError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(_) => Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Blocking implementation of text extraction.
fn load_script_blocking(
    pdf_path: &PathBuf,
    layout: &ScriptLayout,
) -> Result<Vec<ScriptPage>, ConvertError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ConvertError::CorruptPdf {
            path: pdf_path.clone(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    let mut result = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let number = idx + 1;
        let width = page.width().value;
        let height = page.height().value;

        let text = page.text().map_err(|e| ConvertError::ExtractionFailed {
            page: number,
            detail: format!("{:?}", e),
        })?;

        let mut lines = Vec::new();
        for segment in text.segments().iter() {
            let r = segment.bounds();
            lines.push(Fragment::new(
                segment.text(),
                BoundingBox::new(
                    r.left.value,
                    r.right.value,
                    r.bottom.value,
                    r.top.value,
                ),
            ));
        }

        let fragments = group_blocks(lines, layout);
        if fragments.is_empty() {
            warn!("Page {} has no extractable text", number);
        }
        debug!("Page {}: {} fragment(s)", number, fragments.len());

        result.push(ScriptPage {
            number,
            width,
            height,
            fragments,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, x0: f32, x1: f32, y0: f32) -> Fragment {
        Fragment::new(text, BoundingBox::new(x0, x1, y0, y0 + 12.0))
    }

    #[test]
    fn join_lines_collapses_breaks() {
        assert_eq!(join_lines("trans-\ndimensional"), "trans-dimensional");
        assert_eq!(join_lines("foo \n  bar"), "foo bar");
        assert_eq!(join_lines("one\ntwo\nthree"), "one two three");
        assert_eq!(join_lines("plain"), "plain");
    }

    #[test]
    fn adjacent_overlapping_lines_merge() {
        let lines = vec![
            line("Gloria walks into", 108.0, 300.0, 700.0),
            line("the kitchen.", 108.0, 220.0, 686.0),
        ];
        let blocks = group_blocks(lines, &ScriptLayout::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Gloria walks into the kitchen.");
        assert_eq!(blocks[0].bbox, BoundingBox::new(108.0, 300.0, 686.0, 712.0));
    }

    #[test]
    fn vertical_gap_starts_a_new_block() {
        let lines = vec![
            line("She looks up.", 144.0, 260.0, 700.0),
            // 40 points below: far more than one line-height.
            line("She looks down.", 144.0, 260.0, 648.0),
        ];
        let blocks = group_blocks(lines, &ScriptLayout::default());
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn lane_change_starts_a_new_block() {
        // A single-spaced character line directly above its dialogue: the
        // boxes overlap horizontally and sit one line apart, but the indent
        // changes, so they must stay two fragments.
        let lines = vec![
            line("GLORIA", 108.0, 160.0, 700.0),
            line("Hello there.", 144.0, 260.0, 686.0),
        ];
        let blocks = group_blocks(lines, &ScriptLayout::default());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "GLORIA");
        assert_eq!(blocks[1].text, "Hello there.");
    }

    #[test]
    fn disjoint_columns_do_not_merge() {
        let lines = vec![
            line("left column", 72.0, 150.0, 700.0),
            line("right column", 400.0, 500.0, 686.0),
        ];
        let blocks = group_blocks(lines, &ScriptLayout::default());
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn blank_lines_are_dropped() {
        let lines = vec![line("   ", 108.0, 120.0, 700.0)];
        assert!(group_blocks(lines, &ScriptLayout::default()).is_empty());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = validate_pdf_file(Path::new("/nonexistent/episode.pdf")).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_magic_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.pdf");
        std::fs::write(&path, b"<html>not a pdf</html>").unwrap();
        let err = validate_pdf_file(&path).unwrap_err();
        assert!(matches!(err, ConvertError::NotAPdf { .. }));
    }
}
