//! The search service: query in, ranked candidates out.
//!
//! One call to [`SearchService::search`] runs the whole pipeline:
//!
//! 1. intent extraction
//! 2. country resolution according to the [`ScopeMode`]
//! 3. discovery targets and search plans
//! 4. multi-source discovery
//! 5. relevance filter and consensus scoring
//!
//! A search never fails once the service is built. Resolution misses and
//! source failures shrink the result; only a missing dataset or unreadable
//! configuration stops [`SearchService::build`].

use crate::api::build_fetcher;
use crate::cancel::CancelToken;
use crate::config::SourcesConfig;
use crate::discovery::MultiSourceDiscovery;
use crate::error::NewsError;
use crate::geo::dataset::load_dataset;
use crate::geo::hints::extract_country_hints;
use crate::geo::rest_countries::DEFAULT_BASE_URL;
use crate::geo::targets::build_targets;
use crate::geo::{
    AutoCacheResolver, AutoCacheStore, CountryCache, CountryMatcher, CountryResolver,
    DatasetResolver, ResolverChain, RestCountriesResolver,
};
use crate::intent::extract_intent;
use crate::models::{CountryInfo, SearchResult, TimeRange};
use crate::plans::build_search_plans;
use crate::scoring::{apply_consensus, filter_candidates};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// How the geographic scope of a search is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeMode {
    /// Countries detected in the query text.
    Auto,
    /// Exactly this country, whatever the query mentions.
    Chosen(String),
    /// No country; searched through the fallback target.
    Global,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub time_range: TimeRange,
    pub scope: ScopeMode,
    /// Desired number of candidates; drives the direct-feed fallback.
    pub limit: usize,
}

/// Everything needed to assemble the production service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub dataset_path: PathBuf,
    pub auto_cache_path: PathBuf,
    pub cache_path: PathBuf,
    pub country_api_base: String,
    pub sources: SourcesConfig,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn new(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            auto_cache_path: PathBuf::from("data/country_auto_cache.json"),
            cache_path: PathBuf::from("data/country_cache.json"),
            country_api_base: DEFAULT_BASE_URL.to_string(),
            sources: SourcesConfig::default(),
            concurrency: 6,
            timeout: Duration::from_secs(20),
        }
    }
}

/// Cache → curated dataset → auto-cache → country API.
pub type DefaultResolver = ResolverChain<DatasetResolver, AutoCacheResolver<RestCountriesResolver>>;

#[derive(Debug)]
pub struct SearchService<R> {
    resolver: R,
    matcher: CountryMatcher,
    discovery: MultiSourceDiscovery,
}

impl SearchService<DefaultResolver> {
    /// Build the production service.
    ///
    /// # Errors
    ///
    /// [`NewsError::Config`] when the dataset or auto-cache cannot be loaded,
    /// or [`NewsError::Http`] when the HTTP client cannot be built.
    #[instrument(level = "info", skip_all, fields(dataset = %cfg.dataset_path.display()))]
    pub fn build(cfg: &ServiceConfig) -> Result<Self, NewsError> {
        let entries = load_dataset(&cfg.dataset_path)?;
        let dataset = DatasetResolver::from_entries(&entries);
        let matcher = CountryMatcher::from_entries(&entries);

        let fetcher = Arc::new(build_fetcher(cfg.timeout)?);
        let api = RestCountriesResolver::with_base_url(fetcher.clone(), &cfg.country_api_base);
        let auto = AutoCacheResolver::new(AutoCacheStore::open(&cfg.auto_cache_path)?, api);
        let resolver = ResolverChain::new(CountryCache::new(&cfg.cache_path), dataset, auto);

        let discovery = MultiSourceDiscovery::new(fetcher, cfg.sources.clone(), cfg.concurrency);
        info!(countries = entries.len(), "Search service ready");
        Ok(Self::new(resolver, matcher, discovery))
    }
}

impl<R> SearchService<R>
where
    R: CountryResolver,
{
    pub fn new(resolver: R, matcher: CountryMatcher, discovery: MultiSourceDiscovery) -> Self {
        Self {
            resolver,
            matcher,
            discovery,
        }
    }

    /// Run one search. Never fails; a cancelled search returns what it had.
    #[instrument(level = "info", skip_all, fields(query = %req.query, scope = ?req.scope))]
    pub async fn search(&self, req: &SearchRequest, cancel: &CancelToken) -> SearchResult {
        let query = req.query.trim();
        let mut intent = extract_intent(query);

        let names: Vec<String> = match &req.scope {
            ScopeMode::Auto => {
                let found = self.matcher.find_countries(query);
                if found.is_empty() {
                    intent.countries.clone()
                } else {
                    found
                }
            }
            ScopeMode::Chosen(country) => {
                intent.countries.clear();
                intent.regions.clear();
                vec![country.clone()]
            }
            ScopeMode::Global => {
                intent.countries.clear();
                intent.regions.clear();
                Vec::new()
            }
        };

        let mut resolved = self.resolve_all(&names, cancel).await;
        if req.scope == ScopeMode::Auto && names.is_empty() {
            if let Some(info) = self.resolve_from_hints(query, cancel).await {
                resolved.push(info);
            }
        }
        info!(
            resolved = ?resolved.iter().map(|c| c.iso2.as_str()).collect::<Vec<_>>(),
            "Countries resolved"
        );

        let targets = build_targets(&resolved);
        let forced: &[CountryInfo] = match req.scope {
            ScopeMode::Chosen(_) => &resolved,
            _ => &[],
        };
        let plans = build_search_plans(query, &intent, forced);
        info!(plans = plans.len(), targets = targets.len(), "Plans built");

        let candidates = self
            .discovery
            .discover(&plans, &req.time_range, &targets, req.limit, cancel)
            .await;
        let mut candidates = filter_candidates(candidates, query, &intent, &resolved, Utc::now());
        apply_consensus(&mut candidates);
        info!(candidates = candidates.len(), "Search complete");

        SearchResult {
            query: query.to_string(),
            intent,
            resolved,
            targets,
            plans,
            candidates,
        }
    }

    /// Resolve every name, skipping misses and duplicate countries.
    async fn resolve_all(&self, names: &[String], cancel: &CancelToken) -> Vec<CountryInfo> {
        let mut out: Vec<CountryInfo> = Vec::new();
        for name in names {
            match cancel.run(self.resolver.resolve_country(name)).await {
                Some(Ok(info)) => {
                    if !out.iter().any(|c| c.iso2 == info.iso2) {
                        out.push(info);
                    }
                }
                Some(Err(NewsError::NotFound(_))) => info!(%name, "Country not found"),
                Some(Err(e)) => warn!(%name, error = %e, "Country resolution failed"),
                None => {
                    warn!("Resolution cancelled");
                    break;
                }
            }
        }
        out
    }

    /// First query hint that resolves to a country with an ISO2 code and at
    /// least one language.
    async fn resolve_from_hints(&self, query: &str, cancel: &CancelToken) -> Option<CountryInfo> {
        for hint in extract_country_hints(query) {
            match cancel.run(self.resolver.resolve_country(&hint)).await? {
                Ok(info) if !info.iso2.is_empty() && !info.languages.is_empty() => {
                    info!(%hint, iso2 = %info.iso2, "Country resolved from query hint");
                    return Some(info);
                }
                Ok(_) => {}
                Err(e) => info!(%hint, error = %e, "Hint did not resolve"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_fetcher;
    use crate::models::DatasetEntry;
    use chrono::Duration as ChronoDuration;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Knows only "Ruritania".
    struct StubApi;

    impl CountryResolver for StubApi {
        async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError> {
            if name.eq_ignore_ascii_case("ruritania") {
                Ok(CountryInfo {
                    name: "Ruritania".to_string(),
                    iso2: "RT".to_string(),
                    languages: vec!["de".to_string()],
                })
            } else {
                Err(NewsError::NotFound(name.to_string()))
            }
        }
    }

    fn entries() -> BTreeMap<String, DatasetEntry> {
        BTreeMap::from([
            (
                "Canada".to_string(),
                DatasetEntry {
                    iso2: "CA".to_string(),
                    languages: vec!["en".to_string(), "fr".to_string()],
                    aliases: vec![],
                },
            ),
            (
                "Venezuela".to_string(),
                DatasetEntry {
                    iso2: "VE".to_string(),
                    languages: vec!["es".to_string()],
                    aliases: vec![],
                },
            ),
        ])
    }

    fn feed() -> String {
        let published = (Utc::now() - ChronoDuration::hours(1)).to_rfc2822();
        format!(
            r#"<rss version="2.0"><channel><title>x</title>
<item>
  <title>Housing crisis deepens</title>
  <link>https://news.google.com/rss/articles/AAA</link>
  <pubDate>{published}</pubDate>
  <description>&lt;a href="https://pub.example.com/housing"&gt;x&lt;/a&gt;</description>
</item>
<item>
  <title>Football scores</title>
  <link>https://news.google.com/rss/articles/BBB</link>
  <pubDate>Tue, 06 May 2014 10:00:00 GMT</pubDate>
  <description>&lt;a href="https://pub.example.com/football"&gt;x&lt;/a&gt;</description>
</item>
</channel></rss>"#
        )
    }

    async fn service(server: &MockServer) -> SearchService<ResolverChain<DatasetResolver, StubApi>> {
        Mock::given(method("GET"))
            .and(path("/rss/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed()))
            .mount(server)
            .await;

        let raw = entries();
        let resolver = ResolverChain::new(
            CountryCache::in_memory(),
            DatasetResolver::from_entries(&raw),
            StubApi,
        );
        let sources = SourcesConfig {
            news_search_base: server.uri(),
            curated_feeds: vec![],
            direct_feeds: BTreeMap::new(),
        };
        let fetcher = Arc::new(build_fetcher(Duration::from_secs(5)).unwrap());
        SearchService::new(
            resolver,
            CountryMatcher::from_entries(&raw),
            MultiSourceDiscovery::new(fetcher, sources, 4),
        )
    }

    fn request(query: &str, scope: ScopeMode) -> SearchRequest {
        let now = Utc::now();
        SearchRequest {
            query: query.to_string(),
            time_range: TimeRange {
                from: now - ChronoDuration::days(7),
                to: now,
            },
            scope,
            limit: 25,
        }
    }

    #[tokio::test]
    async fn test_auto_scope_uses_dataset_matches() {
        let server = MockServer::start().await;
        let svc = service(&server).await;

        let res = svc
            .search(&request("housing crisis in canada", ScopeMode::Auto), &CancelToken::new())
            .await;

        assert_eq!(res.resolved.len(), 1);
        assert_eq!(res.resolved[0].iso2, "CA");
        let langs: Vec<_> = res.targets.iter().map(|t| t.lang.as_str()).collect();
        assert_eq!(langs, vec!["en", "fr"]);
        assert!(res.plans.iter().all(|p| p.scope == "global"));
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].url, "https://pub.example.com/housing");
        // housing + crisis, recent
        assert_eq!(res.candidates[0].relevance_score, 22);
    }

    #[tokio::test]
    async fn test_auto_scope_falls_back_to_hints() {
        let server = MockServer::start().await;
        let svc = service(&server).await;

        // neither the dataset nor the lexicons know it, so hints are tried
        let res = svc
            .search(&request("Housing crisis grips Ruritania", ScopeMode::Auto), &CancelToken::new())
            .await;
        assert_eq!(res.resolved.len(), 1);
        assert_eq!(res.resolved[0].iso2, "RT");
    }

    #[tokio::test]
    async fn test_chosen_scope_forces_country_plans() {
        let server = MockServer::start().await;
        let svc = service(&server).await;

        let res = svc
            .search(
                &request("housing crisis in Venezuela", ScopeMode::Chosen("Canada".to_string())),
                &CancelToken::new(),
            )
            .await;
        assert!(res.intent.countries.is_empty());
        assert_eq!(res.resolved[0].name, "Canada");
        assert!(res.plans.iter().all(|p| p.scope == "country:CA"));
    }

    #[tokio::test]
    async fn test_global_scope_uses_fallback_target() {
        let server = MockServer::start().await;
        let svc = service(&server).await;

        let res = svc
            .search(&request("housing crisis in canada", ScopeMode::Global), &CancelToken::new())
            .await;
        assert!(res.resolved.is_empty());
        assert_eq!(res.targets.len(), 1);
        assert_eq!(res.targets[0].iso2, "US");
        assert_eq!(res.targets[0].lang, "en");
    }

    #[tokio::test]
    async fn test_cancelled_search_is_empty_not_an_error() {
        let server = MockServer::start().await;
        let svc = service(&server).await;

        let cancel = CancelToken::new();
        cancel.cancel();
        let res = svc
            .search(&request("housing crisis in canada", ScopeMode::Auto), &cancel)
            .await;
        assert!(res.resolved.is_empty());
        assert!(res.candidates.is_empty());
        assert!(!res.plans.is_empty());
    }
}
