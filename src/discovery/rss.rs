//! RSS 2.0 item model for the localized news-search feed.
//!
//! Deserialized with `quick-xml`'s serde support. Only the fields the
//! publisher-URL resolution needs are kept; everything else is ignored.

use crate::error::NewsError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RssDocument {
    #[serde(default)]
    channel: RssChannel,
}

#[derive(Debug, Default, Deserialize)]
struct RssChannel {
    #[serde(default, rename = "item")]
    items: Vec<RssItem>,
}

/// Text content of an element that may also carry attributes.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RssText {
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// `<source url="https://publisher.example">Publisher</source>`
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RssSource {
    #[serde(rename = "@url", default)]
    pub url: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RssItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub guid: Option<RssText>,
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
    /// HTML, already entity-decoded once by the XML layer.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: Option<RssSource>,
}

impl RssItem {
    pub fn guid(&self) -> &str {
        self.guid.as_ref().map(|g| g.value.as_str()).unwrap_or("")
    }

    pub fn source_url(&self) -> &str {
        self.source.as_ref().map(|s| s.url.as_str()).unwrap_or("")
    }
}

/// Parse an RSS document into its items.
pub fn parse_rss(xml: &str) -> Result<Vec<RssItem>, NewsError> {
    let doc: RssDocument = quick_xml::de::from_str(xml)?;
    Ok(doc.channel.items)
}

/// Parse a feed publication date.
///
/// RFC 2822 / RFC 1123 (the RSS norm, with numeric or named zones) first,
/// then RFC 3339, then a few zone-less layouts read as UTC.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(s) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for layout in ["%a, %d %b %Y %H:%M:%S %z", "%d %b %Y %H:%M:%S %z"] {
        if let Ok(t) = DateTime::parse_from_str(s, layout) {
            return Some(t.with_timezone(&Utc));
        }
    }
    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(t.and_utc());
        }
    }
    None
}
