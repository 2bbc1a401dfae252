//! Episode metadata enrichment from the podcast's RSS feed.
//!
//! The parsed transcript only knows the episode's title; the publish date,
//! season, episode number and cover art live in the feed. The scraper
//! fetches the feed (through the [`FeedCache`], with conditional
//! revalidation), fuzzy-matches the episode title against the feed items,
//! and merges the matched item's fields into any metadata still unset.
//!
//! Every failure in here is a degraded result, not a fatal one: a feed
//! that cannot be fetched or an episode that cannot be matched leaves the
//! transcript as it was, with warnings. The single exception is calling
//! the scraper without an episode title, which is a caller bug.

use crate::cache::{CachedFeed, FeedCache};
use crate::error::ConvertError;
use crate::transcript::{Metadata, Transcript};
use chrono::{DateTime, Utc};
use rapidfuzz::fuzz;
use std::time::Duration;
use tracing::{info, warn};

/// A candidate title must exceed this similarity (0–1) to count as a match.
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Enrich a transcript's metadata from an RSS feed.
///
/// `url_or_path` may be an HTTP(S) URL (fetched through the cache) or a
/// local file path (read directly, useful for testing against a saved
/// feed).
pub async fn scrape_episode_metadata(
    transcript: &mut Transcript,
    url_or_path: &str,
    cache: &mut FeedCache,
    timeout_secs: u64,
) -> Result<(), ConvertError> {
    let Some(ep_title) = transcript.metadata.episode_title.clone() else {
        return Err(ConvertError::MissingEpisodeTitle);
    };

    let Some(channel) = get_feed(url_or_path, cache, timeout_secs).await else {
        return Ok(());
    };

    let Some(item) = match_episode(&ep_title, channel.items()) else {
        return Ok(());
    };

    let scraped = item_metadata(item);
    transcript.metadata.merge(&scraped);

    warn_unset_fields(&transcript.metadata);
    Ok(())
}

/// Fetch and parse the feed, returning `None` (with warnings) on any
/// failure.
async fn get_feed(url_or_path: &str, cache: &mut FeedCache, timeout_secs: u64) -> Option<rss::Channel> {
    let looks_like_url =
        url_or_path.starts_with("http://") || url_or_path.starts_with("https://");

    let body = if looks_like_url {
        fetch_feed_body(url_or_path, cache, timeout_secs).await?
    } else {
        match tokio::fs::read_to_string(url_or_path).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Could not read feed file {}: {}. Cannot scrape metadata", url_or_path, e);
                return None;
            }
        }
    };

    match rss::Channel::read_from(body.as_bytes()) {
        Ok(channel) => Some(channel),
        Err(e) => {
            warn!("Could not parse feed {}: {}. Cannot scrape metadata", url_or_path, e);
            None
        }
    }
}

/// Fetch a feed over HTTP, revalidating the cached copy when one exists.
async fn fetch_feed_body(url: &str, cache: &mut FeedCache, timeout_secs: u64) -> Option<String> {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Could not build HTTP client: {}. Cannot scrape metadata", e);
            return None;
        }
    };

    let mut request = client.get(url);
    if let Some(cached) = cache.get(url) {
        if let Some(etag) = &cached.etag {
            request = request.header(reqwest::header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &cached.last_modified {
            request = request.header(reqwest::header::IF_MODIFIED_SINCE, last_modified);
        }
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Something went wrong fetching {}: {}", url, e);
            return stale_cache_fallback(url, cache);
        }
    };

    let status = response.status();
    if status == reqwest::StatusCode::NOT_MODIFIED {
        return cache.get(url).map(|c| c.body.clone());
    }
    if !status.is_success() {
        warn!("Something went wrong fetching {} (status {})", url, status);
        return stale_cache_fallback(url, cache);
    }

    let etag = header_value(&response, reqwest::header::ETAG);
    let last_modified = header_value(&response, reqwest::header::LAST_MODIFIED);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Something went wrong reading {}: {}", url, e);
            return stale_cache_fallback(url, cache);
        }
    };

    cache.insert(
        url,
        CachedFeed {
            body: body.clone(),
            etag,
            last_modified,
        },
    );
    Some(body)
}

fn stale_cache_fallback(url: &str, cache: &FeedCache) -> Option<String> {
    let cached = cache.get(url)?;
    warn!("Using cached copy of {}", url);
    Some(cached.body.clone())
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Find the feed item whose title best matches the episode title.
///
/// Partial-ratio similarity tolerates feed-side decorations ("Patreon
/// Drop! Shift Notes …"); when several items clear the threshold, the
/// full ratio breaks the tie in favour of the least-decorated title,
/// preferring the earliest item on an exact tie.
pub fn match_episode<'a>(ep_title: &str, items: &'a [rss::Item]) -> Option<&'a rss::Item> {
    let mut most_similar: (f64, Option<&rss::Item>) = (0.0, None);
    let mut matches: Vec<&rss::Item> = Vec::new();

    for item in items {
        let Some(title) = item.title() else {
            continue;
        };
        let similarity = partial_ratio(ep_title, title);
        if similarity > most_similar.0 {
            most_similar = (similarity, Some(item));
        }
        if similarity > SIMILARITY_THRESHOLD {
            matches.push(item);
        }
    }

    if matches.is_empty() {
        warn!("Could not find entry matching {:?}", ep_title);
        if let (similarity, Some(item)) = most_similar {
            warn!(
                "The most similar title is {:?} (similarity {:.2})",
                item.title().unwrap_or(""),
                similarity
            );
        }
        warn!("Set the correct title with the --episode-title flag");
        return None;
    }

    let mut result = matches[0];
    let mut best = fuzz::ratio(ep_title.chars(), result.title().unwrap_or("").chars());
    for &item in &matches[1..] {
        let score = fuzz::ratio(ep_title.chars(), item.title().unwrap_or("").chars());
        if score > best {
            best = score;
            result = item;
        }
    }
    info!("Matched episode {:?} in RSS feed", result.title().unwrap_or(""));
    Some(result)
}

/// Best full-ratio score of the shorter string against every equally long
/// window of the longer one, so a title embedded in a decorated one still
/// scores as a full match.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (needle, haystack) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if needle.is_empty() {
        return if haystack.is_empty() { 1.0 } else { 0.0 };
    }

    let mut best = 0.0f64;
    for window in haystack.windows(needle.len()) {
        let score = fuzz::ratio(needle.iter().copied(), window.iter().copied());
        if score > best {
            best = score;
        }
        if best == 1.0 {
            break;
        }
    }
    best
}

/// Map a feed item's fields into transcript metadata.
fn item_metadata(item: &rss::Item) -> Metadata {
    let mut meta = Metadata::default();

    if let Some(itunes) = item.itunes_ext() {
        meta.season = itunes.season().and_then(|s| s.parse().ok());
        meta.season_episode_number = itunes.episode().and_then(|s| s.parse().ok());
        meta.cover_url = itunes.image().map(String::from);
    }
    meta.date_published = item
        .pub_date()
        .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    meta
}

fn warn_unset_fields(meta: &Metadata) {
    let fields: [(&str, bool); 6] = [
        ("episode_title", meta.episode_title.is_none()),
        ("series", meta.series.is_none()),
        ("season", meta.season.is_none()),
        ("season_episode_number", meta.season_episode_number.is_none()),
        ("date_published", meta.date_published.is_none()),
        ("cover_url", meta.cover_url.is_none()),
    ];
    for (name, unset) in fields {
        if unset {
            warn!("Could not find a value for {}", name);
        }
    }
}
