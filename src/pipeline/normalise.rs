//! Cosmetic normalisations of parsed metadata.
//!
//! The source scripts end their front-matter lines with punctuation
//! ("MIDNIGHT BURGER:" / "Panopticon.") that has no place in a page
//! title, so the trailing character is trimmed.

use crate::transcript::Transcript;

pub fn run_all(transcript: &mut Transcript) {
    title_period(transcript);
    series_colon(transcript);
}

/// Strip a trailing period from the episode title.
pub fn title_period(transcript: &mut Transcript) {
    if let Some(title) = &transcript.metadata.episode_title {
        if let Some(trimmed) = title.strip_suffix('.') {
            transcript.metadata.episode_title = Some(trimmed.to_string());
        }
    }
}

/// Strip a trailing colon from the series name.
pub fn series_colon(transcript: &mut Transcript) {
    if let Some(series) = &transcript.metadata.series {
        if let Some(trimmed) = series.strip_suffix(':') {
            transcript.metadata.series = Some(trimmed.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_punctuation() {
        let mut t = Transcript::default();
        t.metadata.episode_title = Some("Panopticon.".into());
        t.metadata.series = Some("Midnight Burger:".into());

        run_all(&mut t);

        assert_eq!(t.metadata.episode_title.as_deref(), Some("Panopticon"));
        assert_eq!(t.metadata.series.as_deref(), Some("Midnight Burger"));
    }

    #[test]
    fn leaves_clean_metadata_alone() {
        let mut t = Transcript::default();
        t.metadata.episode_title = Some("Mr. Snack Tray".into());
        t.metadata.series = Some("Midnight Burger".into());

        run_all(&mut t);

        assert_eq!(t.metadata.episode_title.as_deref(), Some("Mr. Snack Tray"));
        assert_eq!(t.metadata.series.as_deref(), Some("Midnight Burger"));
    }

    #[test]
    fn unset_metadata_is_untouched() {
        let mut t = Transcript::default();
        run_all(&mut t);
        assert!(t.metadata.episode_title.is_none());
        assert!(t.metadata.series.is_none());
    }
}
