//! Curated global feeds and direct publisher feeds.
//!
//! Neither kind is queryable, so each feed is pulled whole and filtered
//! locally. Both RSS and Atom are accepted.

use super::unwrap::is_valid_publisher_url;
use crate::api::{FetchText, Fetcher};
use crate::error::NewsError;
use crate::intent::is_stopword;
use crate::models::{Candidate, SearchPlan, TimeRange};
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use url::Url;

/// Matches kept per plan from the curated feeds.
pub const CURATED_PER_PLAN_LIMIT: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
}

pub fn parse_feed(body: &[u8]) -> Result<ParsedFeed, NewsError> {
    let feed = feed_rs::parser::parse(body)?;
    let entries = feed
        .entries
        .into_iter()
        .map(|entry| FeedEntry {
            title: entry.title.map(|t| t.content.trim().to_string()).unwrap_or_default(),
            link: entry
                .links
                .into_iter()
                .next()
                .map(|l| l.href.trim().to_string())
                .unwrap_or_default(),
            summary: entry.summary.map(|s| s.content).unwrap_or_default(),
            published: entry.published.or(entry.updated),
        })
        .collect();

    Ok(ParsedFeed {
        title: feed.title.map(|t| t.content.trim().to_string()).unwrap_or_default(),
        entries,
    })
}

#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_feed(fetcher: &Fetcher, url: &str) -> Result<ParsedFeed, NewsError> {
    let body = fetcher.fetch_text(url).await?;
    let feed = parse_feed(body.as_bytes())?;
    debug!(entries = feed.entries.len(), title = %feed.title, "Fetched feed");
    Ok(feed)
}

/// Curated entries whose title contains any 3+ character word of the plan
/// query, within `range`, at most `limit`.
pub fn match_curated(
    feed: &ParsedFeed,
    feed_url: &str,
    plan: &SearchPlan,
    range: &TimeRange,
    limit: usize,
) -> Vec<Candidate> {
    let query = plan.query.to_lowercase();
    let words: Vec<&str> = query
        .split_whitespace()
        .filter(|w| w.chars().count() >= 3)
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    let source = if feed.title.is_empty() {
        publisher_name(feed_url)
    } else {
        feed.title.clone()
    };

    feed.entries
        .iter()
        .filter(|e| !e.link.is_empty())
        .filter(|e| {
            let title = e.title.to_lowercase();
            words.iter().any(|w| title.contains(w))
        })
        .filter_map(|e| {
            let published_at = e.published.filter(|t| range.contains(*t))?;
            Some(Candidate {
                title: e.title.clone(),
                url: e.link.clone(),
                source: source.clone(),
                published_at,
                found_by: format!("{} | {}", plan.scope, plan.query),
                relevance_score: 0,
                consensus_score: 0,
            })
        })
        .take(limit)
        .collect()
}

/// Search words for direct feeds: lower-cased whitespace tokens longer than
/// two characters that are not stopwords.
pub fn extract_search_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// Direct-feed entries matching at least one keyword in title or summary,
/// within `range`, linking to a real publisher URL, at most `limit`.
pub fn match_direct(
    feed: &ParsedFeed,
    feed_url: &str,
    keywords: &[String],
    range: &TimeRange,
    limit: usize,
) -> Vec<Candidate> {
    let publisher = publisher_name(feed_url);

    feed.entries
        .iter()
        .filter(|e| {
            if keywords.is_empty() {
                return true;
            }
            let title = e.title.to_lowercase();
            let summary = e.summary.to_lowercase();
            keywords
                .iter()
                .any(|k| title.contains(k.as_str()) || summary.contains(k.as_str()))
        })
        .filter(|e| is_valid_publisher_url(&e.link))
        .filter_map(|e| {
            let published_at = e.published.filter(|t| range.contains(*t))?;
            Some(Candidate {
                title: e.title.clone(),
                url: e.link.clone(),
                source: publisher.clone(),
                published_at,
                found_by: format!("Direct RSS: {publisher}"),
                relevance_score: 0,
                consensus_score: 0,
            })
        })
        .take(limit)
        .collect()
}

/// Host of the feed URL, or `"Direct RSS"` when it has none.
fn publisher_name(feed_url: &str) -> String {
    Url::parse(feed_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "Direct RSS".to_string())
}
