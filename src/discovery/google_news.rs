//! Localized news search over the Google News RSS endpoint.
//!
//! One request per (plan, target):
//!
//! ```text
//! GET {base}/rss/search?q=<plan query + scope>&hl=fr-CA&gl=CA&ceid=CA:fr
//! ```

use super::rss::{RssItem, parse_pub_date, parse_rss};
use super::unwrap::{ItemUrl, resolve_item_url};
use crate::api::{FetchText, Fetcher};
use crate::error::NewsError;
use crate::geo::targets::news_params;
use crate::models::{Candidate, DiscoveryTarget, SearchPlan, TimeRange};
use crate::plans::scoped_query;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Items kept from one localized request.
pub const PER_REQUEST_LIMIT: usize = 25;

#[derive(Debug, Clone)]
pub struct GoogleNewsSearch {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl GoogleNewsSearch {
    pub fn new(fetcher: Arc<Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The request URL for `plan` localized to `target`, or `None` when the
    /// target has no usable locale.
    pub fn search_url(&self, plan: &SearchPlan, target: &DiscoveryTarget) -> Option<String> {
        let (hl, gl, ceid) = news_params(&target.iso2, &target.lang)?;
        let q = scoped_query(&plan.query, &plan.scope);
        Some(format!(
            "{}/rss/search?q={}&hl={}&gl={}&ceid={}",
            self.base_url,
            urlencoding::encode(&q),
            urlencoding::encode(&hl),
            urlencoding::encode(&gl),
            urlencoding::encode(&ceid),
        ))
    }

    /// Fetch and filter one localized result page.
    #[instrument(level = "info", skip_all, fields(iso2 = %target.iso2, lang = %target.lang, query = %plan.query))]
    pub async fn discover(
        &self,
        plan: &SearchPlan,
        target: &DiscoveryTarget,
        range: &TimeRange,
    ) -> Result<Vec<Candidate>, NewsError> {
        let Some(url) = self.search_url(plan, target) else {
            debug!("No locale for target; skipping");
            return Ok(Vec::new());
        };

        let body = self.fetcher.fetch_text(&url).await?;
        let items = parse_rss(&body)?;
        let total = items.len();
        let (candidates, skipped) =
            candidates_from_items(items, plan, &target.lang, range, PER_REQUEST_LIMIT);

        if skipped > 0 {
            info!(skipped, "Skipped items with no recoverable publisher URL");
        }
        debug!(total, kept = candidates.len(), "Localized search done");
        Ok(candidates)
    }
}

/// Turn parsed items into candidates.
///
/// Items without a parseable date, outside `range`, or without any usable
/// URL are dropped; the last group is counted and returned as `skipped`.
/// Stops after `limit` candidates.
pub fn candidates_from_items(
    items: Vec<RssItem>,
    plan: &SearchPlan,
    lang: &str,
    range: &TimeRange,
    limit: usize,
) -> (Vec<Candidate>, usize) {
    let mut out = Vec::with_capacity(limit.min(items.len()));
    let mut skipped = 0usize;
    let source = format!("Google News RSS ({lang})");
    let found_by = format!("{} | {}", plan.scope, plan.query);

    for item in items {
        if out.len() >= limit {
            break;
        }
        let Some(published_at) = parse_pub_date(&item.pub_date) else {
            continue;
        };
        if !range.contains(published_at) {
            continue;
        }

        let url = match resolve_item_url(&item) {
            ItemUrl::Publisher(u) | ItemUrl::Wrapper(u) => u,
            ItemUrl::Unusable => {
                skipped += 1;
                continue;
            }
        };

        out.push(Candidate {
            title: item.title.trim().to_string(),
            url,
            source: source.clone(),
            published_at,
            found_by: found_by.clone(),
            relevance_score: 0,
            consensus_score: 0,
        });
    }
    (out, skipped)
}
