//! Data models shared across the discovery pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`CountryInfo`] / [`DatasetEntry`]: resolved country metadata and its authoring record
//! - [`DiscoveryTarget`]: one (ISO2, language) localized query variant
//! - [`Intent`] / [`SearchPlan`]: what the user asked for and how it is queried
//! - [`Candidate`]: one discovered article reference, scored for relevance and consensus
//! - [`SearchResult`]: everything a search hands to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A country resolved to its ISO2 code and official languages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CountryInfo {
    /// Canonical display name, e.g. `"Canada"`.
    pub name: String,
    /// Two uppercase letters, e.g. `"CA"`.
    pub iso2: String,
    /// Language codes, lower-cased, deduplicated, in source order.
    pub languages: Vec<String>,
}

/// Authoring record for the curated dataset and the auto-learned cache.
///
/// Both files map a canonical country name to one of these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatasetEntry {
    pub iso2: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// One localized news-query variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct DiscoveryTarget {
    pub iso2: String,
    pub lang: String,
}

/// Structured classification of a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Intent {
    pub topics: Vec<String>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
    pub themes: Vec<String>,
    pub keywords: Vec<String>,
}

/// One concrete, scoped, weighted query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchPlan {
    pub query: String,
    /// `global`, `region:<name>` or `country:<ISO2-or-name>`.
    pub scope: String,
    /// `mixed`, `topic:<label>` or `theme:<label>`.
    pub focus: String,
    pub weight: u32,
    /// Human-readable rationale shown next to the plan.
    pub explain: String,
}

/// Inclusive publication window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.from && t <= self.to
    }
}

/// One discovered article reference prior to full-text extraction.
///
/// Created during discovery, scored by [`crate::scoring`], then handed off
/// unchanged. The URL is kept as found; deduplication keys on
/// [`crate::utils::normalize_url`] of it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    /// Where it was found, e.g. `"Google News RSS (fr)"` or a publisher host.
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// Which plan or feed produced it, e.g. `"country:CA | housing crisis"`.
    pub found_by: String,
    #[serde(default)]
    pub relevance_score: u32,
    #[serde(default)]
    pub consensus_score: u32,
}

/// The full outcome of one search request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub intent: Intent,
    pub resolved: Vec<CountryInfo>,
    pub targets: Vec<DiscoveryTarget>,
    pub plans: Vec<SearchPlan>,
    pub candidates: Vec<Candidate>,
}
