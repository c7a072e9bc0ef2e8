//! Feed source tables.
//!
//! The built-in defaults can be replaced by a YAML file passed with
//! `--sources`; any key left out keeps its default:
//!
//! ```yaml
//! news_search_base: https://news.google.com
//! curated_feeds:
//!   - https://www.theguardian.com/world/rss
//! direct_feeds:
//!   CA:
//!     - https://www.cbc.ca/webfeed/rss/rss-topstories
//! ```

use crate::error::NewsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_NEWS_SEARCH_BASE: &str = "https://news.google.com";

const CURATED_FEEDS: &[&str] = &[
    "https://rss.nytimes.com/services/xml/rss/nyt/World.xml",
    "https://www.theguardian.com/world/rss",
    "https://feeds.bbci.co.uk/news/world/rss.xml",
    "https://www.aljazeera.com/xml/rss/all.xml",
];

const DIRECT_FEEDS: &[(&str, &[&str])] = &[
    (
        "CA",
        &[
            "https://www.cbc.ca/webfeed/rss/rss-topstories",
            "https://www.cbc.ca/webfeed/rss/rss-business",
            "https://www.ctvnews.ca/rss/ctvnews-ca-top-stories-public-rss-1.822009",
            "https://globalnews.ca/canada/feed/",
        ],
    ),
    (
        "US",
        &[
            "https://feeds.npr.org/1001/rss.xml",
            "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
            "https://rss.nytimes.com/services/xml/rss/nyt/Business.xml",
        ],
    ),
    (
        "GB",
        &[
            "https://feeds.bbci.co.uk/news/rss.xml",
            "https://feeds.bbci.co.uk/news/business/rss.xml",
            "https://www.theguardian.com/world/rss",
        ],
    ),
    (
        "FR",
        &["https://www.lemonde.fr/rss/une.xml", "https://www.france24.com/en/rss"],
    ),
    ("DE", &["https://www.dw.com/en/rss"]),
    ("AU", &["https://www.abc.net.au/news/feed/51120/rss.xml"]),
];

/// Where discovery looks for articles besides the localized search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Base URL of the localized news-search endpoint.
    #[serde(default = "default_news_search_base")]
    pub news_search_base: String,
    /// Global feeds, matched against every top plan.
    #[serde(default = "default_curated_feeds")]
    pub curated_feeds: Vec<String>,
    /// Publisher feeds keyed by upper-case ISO2, used as a fallback.
    #[serde(default = "default_direct_feeds")]
    pub direct_feeds: BTreeMap<String, Vec<String>>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            news_search_base: default_news_search_base(),
            curated_feeds: default_curated_feeds(),
            direct_feeds: default_direct_feeds(),
        }
    }
}

impl SourcesConfig {
    /// Direct feeds for `iso2`, empty when the country has none.
    pub fn direct_feeds_for(&self, iso2: &str) -> &[String] {
        self.direct_feeds
            .get(&iso2.trim().to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn default_news_search_base() -> String {
    DEFAULT_NEWS_SEARCH_BASE.to_string()
}

fn default_curated_feeds() -> Vec<String> {
    CURATED_FEEDS.iter().map(|s| s.to_string()).collect()
}

fn default_direct_feeds() -> BTreeMap<String, Vec<String>> {
    DIRECT_FEEDS
        .iter()
        .map(|(iso2, feeds)| {
            (
                iso2.to_string(),
                feeds.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

/// Load the source tables; `None` means built-in defaults.
///
/// # Errors
///
/// [`NewsError::Config`] if the file cannot be read or parsed.
#[instrument(level = "info", skip_all, fields(path = ?path))]
pub fn load_sources(path: Option<&Path>) -> Result<SourcesConfig, NewsError> {
    let Some(path) = path else {
        return Ok(SourcesConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| NewsError::Config(format!("reading {}: {e}", path.display())))?;
    let mut cfg: SourcesConfig = serde_yaml::from_str(&content)
        .map_err(|e| NewsError::Config(format!("parsing {}: {e}", path.display())))?;

    // ISO2 keys are matched upper-case
    cfg.direct_feeds = cfg
        .direct_feeds
        .into_iter()
        .map(|(k, v)| (k.trim().to_uppercase(), v))
        .collect();

    info!(
        curated = cfg.curated_feeds.len(),
        direct_countries = cfg.direct_feeds.len(),
        "Loaded source tables"
    );
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = SourcesConfig::default();
        assert_eq!(cfg.news_search_base, DEFAULT_NEWS_SEARCH_BASE);
        assert_eq!(cfg.curated_feeds.len(), 4);
        assert_eq!(cfg.direct_feeds_for("ca").len(), 4);
        assert_eq!(cfg.direct_feeds_for("DE"), ["https://www.dw.com/en/rss".to_string()]);
        assert!(cfg.direct_feeds_for("HU").is_empty());
        assert_eq!(load_sources(None).unwrap(), cfg);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "direct_feeds:\n  hu:\n    - https://telex.hu/rss").unwrap();

        let cfg = load_sources(Some(&path)).unwrap();
        assert_eq!(cfg.direct_feeds_for("HU"), ["https://telex.hu/rss".to_string()]);
        assert!(cfg.direct_feeds_for("CA").is_empty());
        assert_eq!(cfg.curated_feeds.len(), 4);
    }

    #[test]
    fn test_bad_yaml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.yaml");
        std::fs::write(&path, "curated_feeds: {not: [a list").unwrap();
        assert!(matches!(load_sources(Some(&path)), Err(NewsError::Config(_))));

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(load_sources(Some(&missing)), Err(NewsError::Config(_))));
    }
}
