//! Multi-source article discovery.
//!
//! One discovery run fans out over independent network calls and joins them
//! before aggregation:
//!
//! 1. localized search: top plans × discovery targets
//! 2. curated global feeds, each fetched once and matched against every top plan
//! 3. direct publisher feeds for the targeted countries, only when 1 + 2
//!    produced fewer than half the requested limit
//!
//! Calls run through a bounded `buffer_unordered` pool. A failing call is
//! logged and contributes nothing; it never fails the run. Cancellation stops
//! the join and returns what has arrived so far.

pub mod feeds;
pub mod google_news;
pub mod rss;
pub mod unwrap;

use crate::api::Fetcher;
use crate::cancel::CancelToken;
use crate::config::SourcesConfig;
use crate::models::{Candidate, DiscoveryTarget, SearchPlan, TimeRange};
use crate::scoring::dedupe_candidates;
use feeds::{CURATED_PER_PLAN_LIMIT, extract_search_keywords, fetch_feed, match_curated, match_direct};
use futures::stream::{self, StreamExt};
use google_news::GoogleNewsSearch;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Plans sent to each source, highest weight first.
pub const MAX_DISCOVERY_PLANS: usize = 10;

/// One independent network call.
#[derive(Debug, Clone, Copy)]
enum Job<'a> {
    Localized {
        plan: &'a SearchPlan,
        target: &'a DiscoveryTarget,
    },
    Curated {
        url: &'a str,
    },
    Direct {
        url: &'a str,
    },
}

/// Per-run inputs every job reads.
#[derive(Debug)]
struct RunContext<'a> {
    plans: &'a [SearchPlan],
    range: &'a TimeRange,
    direct_keywords: Vec<String>,
    limit: usize,
}

#[derive(Debug, Clone)]
pub struct MultiSourceDiscovery {
    fetcher: Arc<Fetcher>,
    google: GoogleNewsSearch,
    sources: SourcesConfig,
    concurrency: usize,
}

impl MultiSourceDiscovery {
    pub fn new(fetcher: Arc<Fetcher>, sources: SourcesConfig, concurrency: usize) -> Self {
        let google = GoogleNewsSearch::new(fetcher.clone(), &sources.news_search_base);
        Self {
            fetcher,
            google,
            sources,
            concurrency: concurrency.max(1),
        }
    }

    /// Discover candidates for `plans` within `range`.
    ///
    /// `plans` are expected in weight order. The result is deduplicated by
    /// normalized URL and sorted newest first.
    #[instrument(level = "info", skip_all, fields(plans = plans.len(), targets = targets.len(), limit = limit))]
    pub async fn discover(
        &self,
        plans: &[SearchPlan],
        range: &TimeRange,
        targets: &[DiscoveryTarget],
        limit: usize,
        cancel: &CancelToken,
    ) -> Vec<Candidate> {
        let top = &plans[..plans.len().min(MAX_DISCOVERY_PLANS)];
        let ctx = RunContext {
            plans: top,
            range,
            direct_keywords: top
                .first()
                .map(|p| extract_search_keywords(&p.query))
                .unwrap_or_default(),
            limit,
        };

        let mut jobs: Vec<Job> = Vec::with_capacity(top.len() * targets.len() + 4);
        for target in targets {
            for plan in top {
                jobs.push(Job::Localized { plan, target });
            }
        }
        if !top.is_empty() {
            jobs.extend(
                self.sources
                    .curated_feeds
                    .iter()
                    .map(|url| Job::Curated { url: url.as_str() }),
            );
        }

        let first_pass = self.fan_out(jobs, &ctx, cancel).await;
        let mut all = dedupe_candidates(first_pass);
        info!(found = all.len(), "Localized and curated discovery done");

        if all.len() < limit / 2 && !cancel.is_cancelled() {
            let countries: BTreeSet<String> = targets.iter().map(|t| t.iso2.to_uppercase()).collect();
            let direct_jobs: Vec<Job> = countries
                .iter()
                .flat_map(|iso2| self.sources.direct_feeds_for(iso2))
                .map(|url| Job::Direct { url: url.as_str() })
                .collect();

            if !direct_jobs.is_empty() {
                info!(
                    feeds = direct_jobs.len(),
                    keywords = ?ctx.direct_keywords,
                    "Few results; trying direct publisher feeds"
                );
                let mut direct = self.fan_out(direct_jobs, &ctx, cancel).await;
                direct.truncate(limit);
                all.extend(direct);
                all = dedupe_candidates(all);
            }
        }

        info!(total = all.len(), "Discovery complete");
        all
    }

    /// Run `jobs` with bounded concurrency until all settle or `cancel` fires.
    async fn fan_out(&self, jobs: Vec<Job<'_>>, ctx: &RunContext<'_>, cancel: &CancelToken) -> Vec<Candidate> {
        let total = jobs.len();
        let mut pending = stream::iter(jobs)
            .map(|job| self.run_job(job, ctx))
            .buffer_unordered(self.concurrency);

        let mut out = Vec::new();
        let mut settled = 0usize;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(settled, total, received = out.len(), "Discovery cancelled; keeping partial results");
                    break;
                }
                next = pending.next() => match next {
                    Some(batch) => {
                        settled += 1;
                        out.extend(batch);
                    }
                    None => break,
                },
            }
        }
        out
    }

    /// Run one job; failures are logged and yield nothing.
    async fn run_job(&self, job: Job<'_>, ctx: &RunContext<'_>) -> Vec<Candidate> {
        match job {
            Job::Localized { plan, target } => {
                match self.google.discover(plan, target, ctx.range).await {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(iso2 = %target.iso2, lang = %target.lang, query = %plan.query, error = %e, "Localized search failed");
                        Vec::new()
                    }
                }
            }
            Job::Curated { url } => match fetch_feed(&self.fetcher, url).await {
                Ok(feed) => {
                    let found: Vec<Candidate> = ctx
                        .plans
                        .iter()
                        .flat_map(|plan| match_curated(&feed, url, plan, ctx.range, CURATED_PER_PLAN_LIMIT))
                        .collect();
                    debug!(%url, found = found.len(), "Curated feed matched");
                    found
                }
                Err(e) => {
                    warn!(%url, error = %e, "Curated feed failed");
                    Vec::new()
                }
            },
            Job::Direct { url } => match fetch_feed(&self.fetcher, url).await {
                Ok(feed) => {
                    let found = match_direct(&feed, url, &ctx.direct_keywords, ctx.range, ctx.limit);
                    debug!(%url, found = found.len(), "Direct feed matched");
                    found
                }
                Err(e) => {
                    warn!(%url, error = %e, "Direct feed failed");
                    Vec::new()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_fetcher;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOCALIZED: &str = r#"<rss version="2.0"><channel><title>x</title>
<item>
  <title>Housing crisis deepens</title>
  <link>https://news.google.com/rss/articles/AAA</link>
  <pubDate>Tue, 06 May 2025 10:00:00 GMT</pubDate>
  <description>&lt;a href="https://pub.example.com/story-a"&gt;Housing crisis deepens&lt;/a&gt;</description>
</item>
</channel></rss>"#;

    const CURATED: &str = r#"<rss version="2.0"><channel><title>World desk</title>
<item>
  <title>Housing crisis deepens in Toronto</title>
  <link>https://pub.example.com/story-a?utm_source=rss</link>
  <pubDate>Tue, 06 May 2025 12:00:00 GMT</pubDate>
</item>
<item>
  <title>Housing tax credit announced</title>
  <link>https://pub.example.com/story-b</link>
  <pubDate>Mon, 05 May 2025 12:00:00 GMT</pubDate>
</item>
</channel></rss>"#;

    const DIRECT: &str = r#"<rss version="2.0"><channel><title>Direct</title>
<item>
  <title>Provincial plan</title>
  <link>https://direct.example.ca/housing-plan</link>
  <description>A new housing plan for renters.</description>
  <pubDate>Sun, 04 May 2025 12:00:00 GMT</pubDate>
</item>
</channel></rss>"#;

    fn may_2025() -> TimeRange {
        TimeRange {
            from: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2025, 5, 31, 23, 59, 59).unwrap(),
        }
    }

    fn plans() -> Vec<SearchPlan> {
        vec![SearchPlan {
            query: "housing crisis".to_string(),
            scope: "global".to_string(),
            focus: "mixed".to_string(),
            weight: 100,
            explain: "original user query".to_string(),
        }]
    }

    fn canada_en() -> Vec<DiscoveryTarget> {
        vec![DiscoveryTarget {
            iso2: "CA".to_string(),
            lang: "en".to_string(),
        }]
    }

    async fn mock_sources(server: &MockServer, direct_calls: u64) -> SourcesConfig {
        Mock::given(method("GET"))
            .and(path("/rss/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOCALIZED))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/curated.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CURATED))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/direct.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DIRECT))
            .expect(direct_calls)
            .mount(server)
            .await;

        SourcesConfig {
            news_search_base: server.uri(),
            curated_feeds: vec![
                format!("{}/curated.xml", server.uri()),
                format!("{}/gone.xml", server.uri()),
            ],
            direct_feeds: BTreeMap::from([("CA".to_string(), vec![format!("{}/direct.xml", server.uri())])]),
        }
    }

    fn discovery(sources: SourcesConfig) -> MultiSourceDiscovery {
        let fetcher = Arc::new(build_fetcher(Duration::from_secs(5)).unwrap());
        MultiSourceDiscovery::new(fetcher, sources, 4)
    }

    #[tokio::test]
    async fn test_merges_sources_and_falls_back_to_direct() {
        let server = MockServer::start().await;
        let d = discovery(mock_sources(&server, 1).await);

        let out = d
            .discover(&plans(), &may_2025(), &canada_en(), 10, &CancelToken::new())
            .await;

        let urls: Vec<_> = out.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                // curated copy is newer than the localized one
                "https://pub.example.com/story-a?utm_source=rss",
                "https://pub.example.com/story-b",
                "https://direct.example.ca/housing-plan",
            ]
        );
        assert!(out[2].found_by.starts_with("Direct RSS: "));
    }

    #[tokio::test]
    async fn test_direct_feeds_skipped_when_enough_results() {
        let server = MockServer::start().await;
        let d = discovery(mock_sources(&server, 0).await);

        let out = d
            .discover(&plans(), &may_2025(), &canada_en(), 4, &CancelToken::new())
            .await;
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_without_panicking() {
        let server = MockServer::start().await;
        let d = discovery(mock_sources(&server, 0).await);

        let cancel = CancelToken::new();
        cancel.cancel();
        let out = d.discover(&plans(), &may_2025(), &canada_en(), 10, &cancel).await;
        assert!(out.is_empty());
    }
}
