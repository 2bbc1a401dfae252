//! # script2hugo
//!
//! Convert screenplay-style podcast transcript PDFs into Hugo HTML pages.
//!
//! ## Why this crate?
//!
//! The transcripts are distributed as fixed-layout screenplay PDFs: the
//! role of each piece of text (stage direction, character name, dialogue,
//! parenthetical) is encoded purely in where it sits on the page. Generic
//! PDF-to-text tools throw that geometry away. This crate keeps it,
//! classifies every fragment by position, repairs the artifacts page
//! breaks leave behind, enriches the result from the podcast's RSS feed
//! and writes a Hugo content page with role-tagged paragraphs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    positioned fragments via pdfium (spawn_blocking)
//!  ├─ 2. Tag        role per fragment from page geometry + content
//!  ├─ 3. Assemble   tagged fragments → Transcript (metadata + content)
//!  ├─ 4. Repair     parentheticals, (MORE)/(CONT'D), short dialogue
//!  ├─ 5. Normalise  trim trailing punctuation from titles
//!  ├─ 6. Enrich     date/season/episode/cover from the RSS feed (cached)
//!  └─ 7. Output     Hugo page: TOML frontmatter + <p class="role"> body
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use script2hugo::{convert, ConversionConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let transcript = convert(Path::new("panopticon.pdf"), &config).await?;
//!     println!("{}", script2hugo::hugo::dumps(&transcript)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `script2hugo` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! script2hugo = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod feeds;
pub mod hugo;
pub mod pipeline;
pub mod transcript;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::FeedCache;
pub use config::{ConversionConfig, ConversionConfigBuilder, ScriptLayout, DEFAULT_RSS_URL};
pub use convert::{
    convert, convert_file, convert_path, convert_path_with, convert_sync, make_output_path,
    BatchEvent,
};
pub use error::ConvertError;
pub use transcript::{ContentEntry, Metadata, Role, Transcript};
