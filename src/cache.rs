//! On-disk cache of fetched RSS feeds.
//!
//! Batch conversions hit the same feed once per file; caching the body
//! together with its validators (`ETag`, `Last-Modified`) lets the fetcher
//! revalidate cheaply instead of re-downloading. The cache is an explicit
//! value passed into the fetcher, owned by the caller, and only written
//! back to disk when an entry actually changed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One cached feed: the raw body plus HTTP validators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedFeed {
    pub body: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// A feed cache keyed by URL, persisted as JSON.
#[derive(Debug)]
pub struct FeedCache {
    path: PathBuf,
    entries: HashMap<String, CachedFeed>,
    modified: bool,
}

impl FeedCache {
    /// Open the cache at `path`, starting empty if the file is missing or
    /// unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable feed cache {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!("Feed cache: {} entries from {}", entries.len(), path.display());
        Self {
            path,
            entries,
            modified: false,
        }
    }

    /// The conventional cache location under the user's cache directory.
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("script2hugo")
            .join("feeds.json")
    }

    pub fn get(&self, url: &str) -> Option<&CachedFeed> {
        self.entries.get(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, feed: CachedFeed) {
        self.entries.insert(url.into(), feed);
        self.modified = true;
    }

    /// Write the cache back to disk, if anything changed since opening.
    pub fn save(&self) -> std::io::Result<()> {
        if !self.modified {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, text)?;
        debug!("Saved feed cache to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(body: &str) -> CachedFeed {
        CachedFeed {
            body: body.into(),
            etag: Some("\"abc\"".into()),
            last_modified: None,
        }
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::open(dir.path().join("feeds.json"));
        assert!(cache.get("https://example.com/rss").is_none());
    }

    #[test]
    fn insert_then_save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/feeds.json");

        let mut cache = FeedCache::open(&path);
        cache.insert("https://example.com/rss", feed("<rss/>"));
        cache.save().unwrap();

        let reopened = FeedCache::open(&path);
        let entry = reopened.get("https://example.com/rss").unwrap();
        assert_eq!(entry.body, "<rss/>");
        assert_eq!(entry.etag.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn save_is_a_no_op_when_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.json");

        let cache = FeedCache::open(&path);
        cache.save().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.json");
        std::fs::write(&path, "not json at all").unwrap();

        let cache = FeedCache::open(&path);
        assert!(cache.get("anything").is_none());
    }
}
