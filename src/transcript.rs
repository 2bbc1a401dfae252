//! The structured transcript document.
//!
//! A [`Transcript`] is the pipeline's central data structure: episode
//! metadata plus an ordered list of role-tagged content entries. The
//! repair passes and serialisers all operate on this type, never on raw
//! PDF fragments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role of one piece of script text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The podcast series name (front matter).
    SeriesTitle,
    /// The episode name (front matter).
    EpisodeTitle,
    /// A stage direction.
    Direction,
    /// A character name heading a dialogue block.
    Character,
    /// A parenthetical performance note inside dialogue.
    Parenthetical,
    /// A spoken line.
    Dialogue,
    /// The closing marker ("THE END" or equivalent).
    End,
}

impl Role {
    /// The role's name as used for HTML class attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SeriesTitle => "series_title",
            Role::EpisodeTitle => "episode_title",
            Role::Direction => "direction",
            Role::Character => "character",
            Role::Parenthetical => "parenthetical",
            Role::Dialogue => "dialogue",
            Role::End => "end",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged piece of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub role: Role,
    pub text: String,
}

impl ContentEntry {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Episode metadata, partly parsed from the PDF and partly enriched from
/// the podcast's RSS feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub episode_title: Option<String>,
    pub series: Option<String>,
    pub season: Option<u32>,
    pub season_episode_number: Option<u32>,
    pub date_published: Option<DateTime<Utc>>,
    pub cover_url: Option<String>,
}

impl Metadata {
    /// Fill unset fields from `other`, field by field. Fields already set
    /// on `self` always win.
    pub fn merge(&mut self, other: &Metadata) {
        if self.episode_title.is_none() {
            self.episode_title = other.episode_title.clone();
        }
        if self.series.is_none() {
            self.series = other.series.clone();
        }
        if self.season.is_none() {
            self.season = other.season;
        }
        if self.season_episode_number.is_none() {
            self.season_episode_number = other.season_episode_number;
        }
        if self.date_published.is_none() {
            self.date_published = other.date_published;
        }
        if self.cover_url.is_none() {
            self.cover_url = other.cover_url.clone();
        }
    }
}

/// A parsed transcript: metadata plus ordered content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub metadata: Metadata,
    pub content: Vec<ContentEntry>,
}

impl Transcript {
    pub fn add_content(&mut self, role: Role, text: impl Into<String>) {
        self.content.push(ContentEntry::new(role, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn merge_fills_only_unset_fields() {
        let mut meta = Metadata {
            episode_title: Some("Panopticon".into()),
            ..Default::default()
        };
        let other = Metadata {
            episode_title: Some("Wrong Title".into()),
            season: Some(4),
            date_published: Some(Utc.with_ymd_and_hms(2019, 10, 17, 0, 0, 0).unwrap()),
            ..Default::default()
        };

        meta.merge(&other);

        assert_eq!(meta.episode_title.as_deref(), Some("Panopticon"));
        assert_eq!(meta.season, Some(4));
        assert!(meta.date_published.is_some());
        assert!(meta.series.is_none());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut meta = Metadata::default();
        let other = Metadata {
            series: Some("Midnight Burger".into()),
            season_episode_number: Some(7),
            ..Default::default()
        };
        meta.merge(&other);
        let after_first = meta.clone();
        meta.merge(&other);
        assert_eq!(meta, after_first);
    }

    #[test]
    fn role_class_names() {
        assert_eq!(Role::SeriesTitle.as_str(), "series_title");
        assert_eq!(Role::Parenthetical.as_str(), "parenthetical");
        assert_eq!(Role::Dialogue.to_string(), "dialogue");
    }
}
