//! Conversion pipeline stages.
//!
//! A PDF goes through the stages in this order:
//!
//! 1. [`extract`] — pdfium text extraction into positioned fragments,
//!    grouped into line blocks per page.
//! 2. [`geometry`] — pure predicates over fragment bounding boxes,
//!    shared by the tagger.
//! 3. [`tagger`] — role classification: every fragment leaves with
//!    exactly one [`crate::transcript::Role`] or is dropped with a
//!    warning.
//! 4. [`assemble`] — tagged fragments become a
//!    [`crate::transcript::Transcript`] (front matter → metadata,
//!    everything else → content).
//! 5. [`repair`] — order-sensitive passes fixing artifacts of page
//!    breaks and line wrapping.
//! 6. [`normalise`] — cosmetic trims on the parsed metadata.
//!
//! Orchestration lives in [`crate::convert`].

pub mod assemble;
pub mod extract;
pub mod geometry;
pub mod normalise;
pub mod repair;
pub mod tagger;
