//! Publisher URL recovery for localized search results.
//!
//! Search-result links point at the provider's redirect wrapper. The real
//! publisher URL usually survives somewhere else in the item; strategies
//! are tried in order and the first valid URL wins:
//!
//! 1. an anchor (or bare URL) in the HTML description
//! 2. the same extraction applied to the GUID
//! 3. a `url` / `u` / `link` / `q` query parameter on the link itself
//! 4. the `<source url>` attribute, only when it points below the homepage
//!
//! Anything on a provider domain is never accepted as a publisher URL.

use super::rss::RssItem;
use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Domains owned by the search provider.
pub const PROVIDER_DOMAINS: &[&str] = &[
    "google.com",
    "news.google.com",
    "google.ca",
    "google.co.uk",
    "google.fr",
    "google.de",
    "googleusercontent.com",
    "gstatic.com",
];

const WRAPPER_PARAMS: &[&str] = &["url", "u", "link", "q"];
const MAX_UNESCAPE_PASSES: usize = 3;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static RE_PLAIN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).unwrap());

/// Outcome of URL recovery for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUrl {
    /// A real publisher URL.
    Publisher(String),
    /// No publisher URL, but the link is a provider redirect worth keeping
    /// for later resolution.
    Wrapper(String),
    /// Nothing usable; the item is skipped.
    Unusable,
}

/// Recover the best URL for `item`.
pub fn resolve_item_url(item: &RssItem) -> ItemUrl {
    let found = extract_from_html(&item.description)
        .or_else(|| extract_from_html(item.guid()))
        .or_else(|| extract_from_query_params(&item.link))
        .or_else(|| {
            let src = item.source_url().trim();
            (is_valid_publisher_url(src) && has_article_path(src)).then(|| src.to_string())
        });

    match found {
        Some(u) => ItemUrl::Publisher(u),
        None if is_wrapper_url(&item.link) => ItemUrl::Wrapper(item.link.trim().to_string()),
        None => ItemUrl::Unusable,
    }
}

/// Whether `host` is, or is a subdomain of, a provider domain.
pub fn is_provider_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_lowercase();
    PROVIDER_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Absolute http(s) URL with a host outside the provider's domains.
pub fn is_valid_publisher_url(s: &str) -> bool {
    let s = s.trim();
    let lower = s.to_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return false;
    }
    match Url::parse(s) {
        Ok(u) => u
            .host_str()
            .is_some_and(|h| !h.is_empty() && !is_provider_host(h)),
        Err(_) => false,
    }
}

/// A provider redirect link, e.g. `https://news.google.com/rss/articles/...`.
pub fn is_wrapper_url(s: &str) -> bool {
    let Ok(u) = Url::parse(s.trim()) else {
        return false;
    };
    let Some(host) = u.host_str() else {
        return false;
    };
    is_provider_host(host) && (u.path().contains("/articles/") || u.path() == "/url")
}

/// True when the URL points below the site root (a path or a query string).
pub fn has_article_path(s: &str) -> bool {
    match Url::parse(s.trim()) {
        Ok(u) => {
            let path = u.path().trim_matches('/');
            !path.is_empty() || u.query().is_some_and(|q| !q.is_empty())
        }
        Err(_) => false,
    }
}

/// First valid publisher URL in an HTML snippet: anchors first, then bare
/// URLs in the text.
pub fn extract_from_html(html: &str) -> Option<String> {
    let html = html.trim();
    if html.is_empty() {
        return None;
    }
    let decoded = unescape_markup(html);

    let doc = Html::parse_fragment(&decoded);
    let from_anchor = doc
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| is_valid_publisher_url(href))
        .map(str::to_string);
    if from_anchor.is_some() {
        return from_anchor;
    }

    RE_PLAIN_URL
        .find_iter(&decoded)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ')', ']']))
        .find(|u| is_valid_publisher_url(u))
        .map(str::to_string)
}

/// Embedded original URL in the wrapper link's query string.
pub fn extract_from_query_params(link: &str) -> Option<String> {
    let u = Url::parse(link.trim()).ok()?;
    WRAPPER_PARAMS.iter().find_map(|key| {
        u.query_pairs()
            .find(|(k, v)| k.as_ref() == *key && is_valid_publisher_url(v))
            .map(|(_, v)| v.trim().to_string())
    })
}

/// Decode entity-escaped markup (`&lt;a href=...&gt;`), which feeds sometimes
/// escape more than once. Only entities are decoded; tags already present
/// are left alone. A pass hitting an unknown entity stops decoding.
fn unescape_markup(s: &str) -> String {
    let mut cur = s.to_string();
    for _ in 0..MAX_UNESCAPE_PASSES {
        if !cur.contains('&') {
            break;
        }
        let next = match unescape_with(&cur, resolve_html5_entity) {
            Ok(next) => next.into_owned(),
            Err(_) => break,
        };
        if next == cur {
            break;
        }
        cur = next;
    }
    cur
}
