//! The full resolver chain: cache, then dataset, then the fallback resolver.

use super::{CountryCache, CountryResolver};
use crate::error::NewsError;
use crate::models::CountryInfo;
use crate::utils::normalize_key;
use tracing::{debug, instrument};

/// Cache → `dataset` → `next`, writing every success through to the cache.
///
/// In production `next` is an [`super::AutoCacheResolver`] wrapping the
/// external API; the chain itself does not care.
#[derive(Debug)]
pub struct ResolverChain<D, N> {
    cache: CountryCache,
    dataset: D,
    next: N,
}

impl<D, N> ResolverChain<D, N>
where
    D: CountryResolver,
    N: CountryResolver,
{
    pub fn new(cache: CountryCache, dataset: D, next: N) -> Self {
        Self {
            cache,
            dataset,
            next,
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &CountryCache {
        &self.cache
    }

    #[cfg(test)]
    pub fn next(&self) -> &N {
        &self.next
    }
}

impl<D, N> CountryResolver for ResolverChain<D, N>
where
    D: CountryResolver,
    N: CountryResolver,
{
    #[instrument(level = "debug", skip_all, fields(%name))]
    async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError> {
        if normalize_key(name).is_empty() {
            return Err(NewsError::NotFound(name.to_string()));
        }

        if let Some(info) = self.cache.get(name).await {
            debug!(iso2 = %info.iso2, "Cache hit");
            return Ok(info);
        }

        if let Ok(info) = self.dataset.resolve_country(name).await {
            self.cache.put(name, info.clone()).await;
            return Ok(info);
        }

        let info = self.next.resolve_country(name).await?;
        self.cache.put(name, info.clone()).await;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::DatasetResolver;
    use crate::models::DatasetEntry;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStub {
        calls: AtomicUsize,
    }

    impl CountryResolver for CountingStub {
        async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match normalize_key(name).as_str() {
                "bulgaria" => Ok(CountryInfo {
                    name: "Bulgaria".to_string(),
                    iso2: "BG".to_string(),
                    languages: vec!["bul".to_string()],
                }),
                _ => Err(NewsError::NotFound(name.to_string())),
            }
        }
    }

    fn dataset() -> DatasetResolver {
        let mut raw = BTreeMap::new();
        raw.insert(
            "Canada".to_string(),
            DatasetEntry {
                iso2: "CA".to_string(),
                languages: vec!["en".to_string(), "fr".to_string()],
                aliases: vec![],
            },
        );
        DatasetResolver::from_entries(&raw)
    }

    #[tokio::test]
    async fn test_second_resolution_hits_cache() {
        let chain = ResolverChain::new(
            CountryCache::in_memory(),
            dataset(),
            CountingStub::default(),
        );

        let first = chain.resolve_country("Bulgaria").await.unwrap();
        let second = chain.resolve_country("bulgaria ").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(chain.next().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dataset_before_fallback() {
        let chain = ResolverChain::new(
            CountryCache::in_memory(),
            dataset(),
            CountingStub::default(),
        );
        let ca = chain.resolve_country("canada").await.unwrap();
        assert_eq!(ca.iso2, "CA");
        assert_eq!(chain.next().calls.load(Ordering::SeqCst), 0);
        assert_eq!(chain.cache().len().await, 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let chain = ResolverChain::new(
            CountryCache::in_memory(),
            dataset(),
            CountingStub::default(),
        );
        assert!(chain.resolve_country("Atlantis").await.is_err());
        assert!(chain.resolve_country("Atlantis").await.is_err());
        assert_eq!(chain.next().calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            chain.resolve_country(" ?! ").await,
            Err(NewsError::NotFound(_))
        ));
    }
}
