//! Assembly: tagged fragments become a [`Transcript`].
//!
//! Front-matter roles land in the metadata (the series title is
//! title-cased on the way in), everything else is appended to the content
//! list in document order. A fragment without a resolved role is a
//! pipeline bug and fails the conversion.

use crate::error::ConvertError;
use crate::pipeline::tagger::TaggedFragment;
use crate::transcript::{Role, Transcript};
use titlecase::titlecase;

/// Build a transcript from tagged fragments.
pub fn assemble(tagged: Vec<TaggedFragment>) -> Result<Transcript, ConvertError> {
    let mut transcript = Transcript::default();

    for fragment in tagged {
        let role = fragment.role.ok_or(ConvertError::NotTagged {
            page: fragment.page,
            text: fragment.text.clone(),
        })?;
        match role {
            // The source sets titles in all caps; lower-case first so the
            // title-caser treats every word as re-casable.
            Role::SeriesTitle => {
                transcript.metadata.series = Some(titlecase(&fragment.text.to_lowercase()));
            }
            Role::EpisodeTitle => {
                transcript.metadata.episode_title = Some(fragment.text);
            }
            role => transcript.add_content(role, fragment.text),
        }
    }

    Ok(transcript)
}
