//! External country-metadata API (REST Countries v3.1).
//!
//! Queried by URL-escaped name, asking only for the fields we use:
//!
//! ```text
//! GET {base}/name/{name}?fields=name,cca2,languages
//! [{"name": {"common": "Hungary"}, "cca2": "HU", "languages": {"hun": "Hungarian"}}]
//! ```

use super::CountryResolver;
use crate::api::{FetchText, Fetcher};
use crate::error::NewsError;
use crate::models::CountryInfo;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_BASE_URL: &str = "https://restcountries.com/v3.1";

#[derive(Debug, Deserialize)]
struct RcName {
    #[serde(default)]
    common: String,
}

#[derive(Debug, Deserialize)]
struct RcCountry {
    name: RcName,
    #[serde(default)]
    cca2: String,
    #[serde(default)]
    languages: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RestCountriesResolver {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl RestCountriesResolver {
    pub fn with_base_url(fetcher: Arc<Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl CountryResolver for RestCountriesResolver {
    #[instrument(level = "info", skip_all, fields(%name))]
    async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError> {
        let q = name.trim();
        if q.is_empty() {
            return Err(NewsError::NotFound(String::new()));
        }

        let endpoint = format!(
            "{}/name/{}?fields=name,cca2,languages",
            self.base_url,
            urlencoding::encode(q)
        );
        let body = match self.fetcher.fetch_text(&endpoint).await {
            Ok(b) => b,
            Err(NewsError::Status { status: 404, .. }) => {
                return Err(NewsError::NotFound(q.to_string()));
            }
            Err(e) => return Err(e),
        };

        let results: Vec<RcCountry> = serde_json::from_str(&body)?;
        let info = pick_country(results, q).ok_or_else(|| NewsError::NotFound(q.to_string()))?;
        info!(iso2 = %info.iso2, languages = ?info.languages, "Resolved from country API");
        Ok(info)
    }
}

/// Prefer a case-insensitive exact match on the common name, else the first result.
fn pick_country(results: Vec<RcCountry>, q: &str) -> Option<CountryInfo> {
    let idx = results
        .iter()
        .position(|c| c.name.common.trim().eq_ignore_ascii_case(q))
        .unwrap_or(0);
    let target = results.into_iter().nth(idx)?;

    let iso2 = target.cca2.trim().to_uppercase();
    if iso2.is_empty() {
        return None;
    }
    Some(CountryInfo {
        name: target.name.common.trim().to_string(),
        iso2,
        languages: extract_lang_codes(&target.languages),
    })
}

/// Keys of the languages map, lower-cased, 2..=8 chars, sorted.
fn extract_lang_codes(m: &BTreeMap<String, String>) -> Vec<String> {
    let mut out: Vec<String> = m
        .keys()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| (2..=8).contains(&k.len()))
        .collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_fetcher;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer) -> RestCountriesResolver {
        let fetcher = Arc::new(build_fetcher(Duration::from_secs(5)).unwrap());
        RestCountriesResolver::with_base_url(fetcher, &server.uri())
    }

    #[tokio::test]
    async fn test_prefers_exact_common_name() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            {"name": {"common": "South Sudan"}, "cca2": "SS", "languages": {"eng": "English"}},
            {"name": {"common": "Sudan"}, "cca2": "sd", "languages": {"ara": "Arabic", "eng": "English", "x": "bad"}}
        ]);
        Mock::given(method("GET"))
            .and(path("/name/sudan"))
            .and(query_param("fields", "name,cca2,languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let info = resolver(&server).resolve_country("sudan").await.unwrap();
        assert_eq!(info.name, "Sudan");
        assert_eq!(info.iso2, "SD");
        assert_eq!(info.languages, vec!["ara", "eng"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_first_result() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            {"name": {"common": "Hungary"}, "cca2": "HU", "languages": {"hun": "Hungarian"}}
        ]);
        Mock::given(method("GET"))
            .and(path("/name/Magyarorszag"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let info = resolver(&server)
            .resolve_country("Magyarorszag")
            .await
            .unwrap();
        assert_eq!(info.iso2, "HU");
    }

    #[tokio::test]
    async fn test_404_and_empty_are_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/name/Atlantis"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/name/Lemuria"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let r = resolver(&server);
        assert!(matches!(
            r.resolve_country("Atlantis").await,
            Err(NewsError::NotFound(_))
        ));
        assert!(matches!(
            r.resolve_country("Lemuria").await,
            Err(NewsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/name/Oops"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            resolver(&server).resolve_country("Oops").await,
            Err(NewsError::Json(_))
        ));
    }
}
