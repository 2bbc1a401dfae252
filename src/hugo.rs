//! Hugo HTML serialisation.
//!
//! The output format is a Hugo content page: TOML frontmatter between
//! `+++` fences, then one `<p class="{role}">` element per content entry.
//! The frontmatter maps the episode title to Hugo's `title`, the publish
//! date to `date`, and everything else into the `[params]` table; unset
//! fields are omitted entirely.
//!
//! [`load_metadata`] reads the frontmatter back from an existing output
//! file, so reconverting a PDF preserves hand-curated metadata.

use crate::error::ConvertError;
use crate::transcript::{Metadata, Transcript};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Frontmatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Params::is_empty", default)]
    params: Params,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Params {
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    season_episode_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_url: Option<String>,
}

impl Params {
    fn is_empty(&self) -> bool {
        self.series.is_none()
            && self.season.is_none()
            && self.season_episode_number.is_none()
            && self.cover_url.is_none()
    }
}

impl From<&Metadata> for Frontmatter {
    fn from(meta: &Metadata) -> Self {
        Frontmatter {
            title: meta.episode_title.clone(),
            date: meta.date_published,
            params: Params {
                series: meta.series.clone(),
                season: meta.season,
                season_episode_number: meta.season_episode_number,
                cover_url: meta.cover_url.clone(),
            },
        }
    }
}

impl From<Frontmatter> for Metadata {
    fn from(fm: Frontmatter) -> Self {
        Metadata {
            episode_title: fm.title,
            date_published: fm.date,
            series: fm.params.series,
            season: fm.params.season,
            season_episode_number: fm.params.season_episode_number,
            cover_url: fm.params.cover_url,
        }
    }
}

/// Escape text for use inside an HTML element.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Serialise a transcript to a Hugo HTML page string.
pub fn dumps(transcript: &Transcript) -> Result<String, ConvertError> {
    let frontmatter = toml::to_string(&Frontmatter::from(&transcript.metadata))?;

    let mut out = String::new();
    out.push_str("+++\n");
    out.push_str(&frontmatter);
    out.push_str("+++\n\n");

    for entry in &transcript.content {
        out.push_str(&format!(
            "<p class=\"{}\">{}</p>\n",
            entry.role,
            escape_html(&entry.text)
        ));
    }
    Ok(out)
}

/// Serialise a transcript to a file, creating parent directories.
pub async fn dump(transcript: &Transcript, path: &Path) -> Result<(), ConvertError> {
    let contents = dumps(transcript)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Replace a transcript's metadata with the frontmatter of an existing
/// output file.
pub async fn load_metadata(path: &Path, transcript: &mut Transcript) -> Result<(), ConvertError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConvertError::MetadataLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let mut lines = text.lines();
    if lines.next() != Some("+++") {
        warn!("Existing output file {} is not a valid Hugo document", path.display());
    }

    let mut frontmatter_str = String::new();
    let mut closed = false;
    for line in lines {
        if line == "+++" {
            closed = true;
            break;
        }
        frontmatter_str.push_str(line);
        frontmatter_str.push('\n');
    }
    if !closed {
        return Err(ConvertError::MetadataLoadFailed {
            path: path.to_path_buf(),
            detail: "frontmatter fence never closes".into(),
        });
    }

    let frontmatter: Frontmatter =
        toml::from_str(&frontmatter_str).map_err(|e| ConvertError::MetadataLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    transcript.metadata = frontmatter.into();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Role;
    use chrono::TimeZone;

    fn sample() -> Transcript {
        let mut t = Transcript::default();
        t.metadata.episode_title = Some("Panopticon".into());
        t.metadata.season = Some(4);
        t.metadata.date_published = Some(Utc.with_ymd_and_hms(2019, 10, 17, 0, 0, 0).unwrap());
        t.add_content(Role::Direction, "TAPE CLICKS ON");
        t.add_content(Role::Character, "PETER");
        t.add_content(Role::Parenthetical, "(pleasantly)");
        t.add_content(Role::Dialogue, "Is everything alright, Martin?");
        t
    }

    #[test]
    fn dumps_produces_a_hugo_page() {
        let out = dumps(&sample()).unwrap();

        assert!(out.starts_with("+++\n"));
        assert!(out.contains("title = \"Panopticon\""));
        assert!(out.contains("[params]"));
        assert!(out.contains("season = 4"));
        assert!(out.contains("+++\n\n"));
        assert!(out.contains("<p class=\"direction\">TAPE CLICKS ON</p>\n"));
        assert!(out.contains("<p class=\"character\">PETER</p>\n"));
        assert!(out.contains("<p class=\"parenthetical\">(pleasantly)</p>\n"));
        assert!(out.contains("<p class=\"dialogue\">Is everything alright, Martin?</p>\n"));
    }

    #[test]
    fn dumps_omits_unset_metadata() {
        let mut t = Transcript::default();
        t.metadata.episode_title = Some("Panopticon".into());
        let out = dumps(&t).unwrap();
        assert!(!out.contains("[params]"));
        assert!(!out.contains("date"));
        assert!(!out.contains("cover_url"));
    }

    #[test]
    fn dumps_escapes_html() {
        let mut t = Transcript::default();
        t.add_content(Role::Dialogue, "1 < 2 & 3 > 2");
        let out = dumps(&t).unwrap();
        assert!(out.contains("<p class=\"dialogue\">1 &lt; 2 &amp; 3 &gt; 2</p>"));
    }

    #[tokio::test]
    async fn dump_then_load_round_trips_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/panopticon.html");

        let original = sample();
        dump(&original, &path).await.unwrap();

        let mut reloaded = Transcript::default();
        load_metadata(&path, &mut reloaded).await.unwrap();

        assert_eq!(reloaded.metadata, original.metadata);
    }

    #[tokio::test]
    async fn load_metadata_replaces_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        dump(&sample(), &path).await.unwrap();

        let mut fresh = Transcript::default();
        fresh.metadata.episode_title = Some("Parsed Title".into());
        fresh.metadata.series = Some("Parsed Series".into());
        load_metadata(&path, &mut fresh).await.unwrap();

        // The existing file's frontmatter wins, even over parsed values;
        // the sample has no series, so the parsed one is gone too.
        assert_eq!(fresh.metadata.episode_title.as_deref(), Some("Panopticon"));
        assert!(fresh.metadata.series.is_none());
    }

    #[tokio::test]
    async fn load_metadata_rejects_unclosed_fence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.html");
        tokio::fs::write(&path, "+++\ntitle = \"x\"\n")
            .await
            .unwrap();

        let mut t = Transcript::default();
        let err = load_metadata(&path, &mut t).await.unwrap_err();
        assert!(matches!(err, ConvertError::MetadataLoadFailed { .. }));
    }
}
