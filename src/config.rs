//! Configuration types for transcript conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`],
//! built via its [`ConversionConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to share a config across a batch run and to
//! diff two runs to understand why their outputs differ.
//!
//! The geometry constants live in [`ScriptLayout`]: they describe one
//! script-formatting template (the fixed indentation lanes, the corner
//! region where page numbers sit, the centred title page). A PDF produced
//! from a different template needs different constants, so they are a
//! configuration point rather than hardcoded literals.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};

/// Default RSS feed for episode metadata enrichment.
pub const DEFAULT_RSS_URL: &str = "https://rss.art19.com/midnight-burger";

/// Geometry constants describing one script-formatting template.
///
/// All distances are PDF points with the origin at the page's bottom-left
/// corner, matching the extraction layer's coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLayout {
    /// Left edge of the direction/character lane.
    pub directions_indent: f32,

    /// Left edge of the dialogue lane.
    pub dialogue_indent: f32,

    /// Absolute tolerance when matching a fragment to an indentation lane.
    pub indent_tolerance: f32,

    /// Relative tolerance when testing whether a fragment is horizontally
    /// centred on the page (fraction of the larger midpoint).
    pub center_tolerance: f32,

    /// Page numbers sit in the corner region at or beyond both of these
    /// thresholds (lower-left corner of the fragment's bounding box).
    pub page_number_min_x: f32,
    pub page_number_min_y: f32,

    /// A title page is detected when every fragment on page 1 is centred
    /// and the page holds at most this many fragments.
    pub title_page_max_fragments: usize,

    /// During extraction, a line continues the block above it when the
    /// vertical gap between them is at most this fraction of the shorter
    /// line's height.
    pub line_gap_factor: f32,
}

impl Default for ScriptLayout {
    fn default() -> Self {
        Self {
            directions_indent: 108.0,
            dialogue_indent: 144.0,
            indent_tolerance: 10.0,
            center_tolerance: 0.015,
            page_number_min_x: 500.0,
            page_number_min_y: 740.0,
            title_page_max_fragments: 5,
            line_gap_factor: 0.8,
        }
    }
}

/// Configuration for one conversion run.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use script2hugo::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .episode_title("Chapter 1: The Transdimensional Haboob")
///     .skip_scraping(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Geometry constants for the script template being parsed.
    pub layout: ScriptLayout,

    /// Override the episode title parsed from the PDF.
    pub episode_title: Option<String>,

    /// Skip the RSS metadata enrichment step entirely.
    pub skip_scraping: bool,

    /// RSS feed URL (or local file path) used for metadata enrichment.
    pub rss_url: String,

    /// Allow overwriting existing output files in batch mode.
    pub overwrite: bool,

    /// HTTP timeout for feed fetches, in seconds. Default: 30.
    pub fetch_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            layout: ScriptLayout::default(),
            episode_title: None,
            skip_scraping: false,
            rss_url: DEFAULT_RSS_URL.to_string(),
            overwrite: false,
            fetch_timeout_secs: 30,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn layout(mut self, layout: ScriptLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn episode_title(mut self, title: impl Into<String>) -> Self {
        self.config.episode_title = Some(title.into());
        self
    }

    pub fn skip_scraping(mut self, v: bool) -> Self {
        self.config.skip_scraping = v;
        self
    }

    pub fn rss_url(mut self, url: impl Into<String>) -> Self {
        self.config.rss_url = url.into();
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let l = &self.config.layout;
        if l.indent_tolerance < 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "indent tolerance must be non-negative, got {}",
                l.indent_tolerance
            )));
        }
        if l.line_gap_factor <= 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "line gap factor must be positive, got {}",
                l.line_gap_factor
            )));
        }
        // Overlapping lanes would make every fragment ambiguous between
        // direction and dialogue.
        if (l.dialogue_indent - l.directions_indent).abs() <= 2.0 * l.indent_tolerance {
            return Err(ConvertError::InvalidConfig(format!(
                "indentation lanes overlap: |{} - {}| must exceed 2 × tolerance ({})",
                l.directions_indent, l.dialogue_indent, l.indent_tolerance
            )));
        }
        if !self.config.skip_scraping && self.config.rss_url.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "RSS URL must not be empty unless scraping is skipped".into(),
            ));
        }
        Ok(self.config)
    }
}
