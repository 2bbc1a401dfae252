//! Error types for the script2hugo library.
//!
//! Only *fatal* conditions become a [`ConvertError`] — situations where the
//! input does not match the assumed script format at a structural level and
//! best-effort output would be wrong. Degraded conditions (no page numbers,
//! no title page, no END marker, uncategorised fragments, a `(MORE)` with
//! no matching `(CONT'D)`, any feed fetch failure) are logged as
//! `tracing::warn!` with the page/text involved and the conversion
//! continues producing best-effort output.
//!
//! Batch mode isolates failures per input file: one bad PDF among many is
//! reported and skipped, never aborting sibling conversions.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the script2hugo library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The input string is neither a file nor a directory.
    #[error("Not a valid file or directory: '{path}'")]
    InvalidInput { path: PathBuf },

    /// Directory input requires a directory output.
    #[error("When the input is a directory, the output must also be a directory (got '{output}')")]
    OutputNotADirectory { output: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt or unreadable: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium failed to extract text from a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    // ── Format errors (the script does not match the assumed layout) ─────
    /// The effective first page holds fewer than the two front-matter
    /// fragments (series title, episode title) the format guarantees.
    #[error(
        "Page {page} has {found} text fragment(s); the script format requires at least 2 \
         (series title and episode title).\nIs this really a screenplay-style transcript?"
    )]
    FrontMatterMissing { page: usize, found: usize },

    /// A fragment survived tagging with no resolved role. The tagger must
    /// never let this happen; it indicates a pipeline bug or an input far
    /// outside the assumed format.
    #[error("Element on page {page} is not properly tagged: {text:?}")]
    NotTagged { page: usize, text: String },

    /// A dialogue entry opened a parenthetical that never balances and
    /// there is no following entry to merge with.
    #[error("Unbalanced parenthetical at the end of the transcript: {text:?}")]
    UnbalancedParenthetical { text: String },

    /// A `(MORE)` continuation marker is the final content entry, so there
    /// is nothing to collapse it with.
    #[error("Found (MORE) with no following entry: {text:?}")]
    DanglingContinuation { text: String },

    // ── Metadata errors ───────────────────────────────────────────────────
    /// Feed scraping was requested but the transcript has no episode title.
    #[error(
        "Cannot scrape episode metadata when the episode title is not set.\n\
         Set one with --episode-title, or pass --skip-scraping."
    )]
    MissingEpisodeTitle,

    /// An existing output file's frontmatter could not be parsed.
    #[error("Failed to load metadata from '{path}': {detail}")]
    MetadataLoadFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Frontmatter serialisation failed (a metadata value TOML cannot carry).
    #[error("Failed to serialise frontmatter: {0}")]
    FrontmatterSerialize(#[from] toml::ser::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
