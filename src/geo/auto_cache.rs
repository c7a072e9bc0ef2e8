//! Auto-learned country cache.
//!
//! Same shape as the curated dataset, but written at runtime: whenever the
//! external API resolves a country, the result is stored here so the next
//! process does not need the network.

use super::{CountryResolver, normalize_langs};
use crate::error::NewsError;
use crate::models::{CountryInfo, DatasetEntry};
use crate::utils::{normalize_key, write_json_atomic};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// On-disk store of learned entries, canonical name -> entry.
#[derive(Debug)]
pub struct AutoCacheStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, DatasetEntry>>,
}

impl AutoCacheStore {
    /// Open the store. A missing or empty file starts an empty store; an
    /// unparseable one is a configuration error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NewsError> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(b) if b.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(b) => serde_json::from_slice(&b).map_err(|e| {
                NewsError::Config(format!("cannot parse {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find an entry whose canonical name or any alias normalizes to `name`.
    pub async fn get(&self, name: &str) -> Option<(String, DatasetEntry)> {
        let key = normalize_key(name);
        if key.is_empty() {
            return None;
        }
        let data = self.data.lock().await;
        data.iter()
            .find(|(canon, e)| {
                normalize_key(canon) == key || e.aliases.iter().any(|a| normalize_key(a) == key)
            })
            .map(|(canon, e)| (canon.clone(), e.clone()))
    }

    /// Insert or replace `name` and persist atomically.
    ///
    /// Entries with an empty name, ISO2 or language list are skipped.
    pub async fn upsert(&self, name: &str, entry: DatasetEntry) -> Result<(), NewsError> {
        let name = name.trim();
        if name.is_empty() || entry.iso2.trim().is_empty() || entry.languages.is_empty() {
            return Ok(());
        }
        let mut data = self.data.lock().await;
        data.insert(name.to_string(), entry);
        write_json_atomic(&self.path, &*data).await?;
        Ok(())
    }
}

/// Auto-cache lookup, else delegate to `next` and learn the answer.
#[derive(Debug)]
pub struct AutoCacheResolver<R> {
    store: AutoCacheStore,
    next: R,
}

impl<R> AutoCacheResolver<R>
where
    R: CountryResolver,
{
    pub fn new(store: AutoCacheStore, next: R) -> Self {
        Self { store, next }
    }

    #[cfg(test)]
    pub fn next(&self) -> &R {
        &self.next
    }
}

impl<R> CountryResolver for AutoCacheResolver<R>
where
    R: CountryResolver,
{
    async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError> {
        if let Some((canon, e)) = self.store.get(name).await {
            let languages = normalize_langs(&e.languages);
            if !e.iso2.is_empty() && !languages.is_empty() {
                debug!(%name, iso2 = %e.iso2, "Resolved from auto-cache");
                return Ok(CountryInfo {
                    name: canon,
                    iso2: e.iso2.to_uppercase(),
                    languages,
                });
            }
        }

        let info = self.next.resolve_country(name).await?;

        // Remember what the user typed when the API canonicalized it.
        let mut aliases = Vec::new();
        if normalize_key(name) != normalize_key(&info.name) {
            aliases.push(name.trim().to_string());
        }
        let entry = DatasetEntry {
            iso2: info.iso2.clone(),
            languages: info.languages.clone(),
            aliases,
        };
        if let Err(e) = self.store.upsert(&info.name, entry).await {
            warn!(path = %self.store.path().display(), error = %e, "Failed to persist auto-cache entry");
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubApi {
        calls: AtomicUsize,
        languages: Vec<String>,
    }

    impl CountryResolver for StubApi {
        async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if normalize_key(name) == "magyarorszag" || normalize_key(name) == "hungary" {
                Ok(CountryInfo {
                    name: "Hungary".to_string(),
                    iso2: "HU".to_string(),
                    languages: self.languages.clone(),
                })
            } else {
                Err(NewsError::NotFound(name.to_string()))
            }
        }
    }

    fn stub(languages: &[&str]) -> StubApi {
        StubApi {
            calls: AtomicUsize::new(0),
            languages: languages.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_learns_and_reuses_api_answer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.json");

        let resolver = AutoCacheResolver::new(AutoCacheStore::open(&path).unwrap(), stub(&["hu"]));
        let first = resolver.resolve_country("Magyarorszag").await.unwrap();
        assert_eq!(first.iso2, "HU");
        let second = resolver.resolve_country("magyarorszag").await.unwrap();
        assert_eq!(second.name, "Hungary");
        assert_eq!(resolver.next().calls.load(Ordering::SeqCst), 1);

        // a fresh process sees the learned entry, alias included
        let reopened = AutoCacheStore::open(&path).unwrap();
        let (canon, entry) = reopened.get("MAGYARORSZAG").await.unwrap();
        assert_eq!(canon, "Hungary");
        assert_eq!(entry.aliases, vec!["Magyarorszag"]);
    }

    #[tokio::test]
    async fn test_skips_write_without_languages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.json");

        let resolver = AutoCacheResolver::new(AutoCacheStore::open(&path).unwrap(), stub(&[]));
        let info = resolver.resolve_country("Hungary").await.unwrap();
        assert!(info.languages.is_empty());
        assert!(!path.exists());

        resolver.resolve_country("Hungary").await.unwrap();
        assert_eq!(resolver.next().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_miss_propagates_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = AutoCacheResolver::new(
            AutoCacheStore::open(dir.path().join("auto.json")).unwrap(),
            stub(&["hu"]),
        );
        assert!(matches!(
            resolver.resolve_country("Atlantis").await,
            Err(NewsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(AutoCacheStore::open(&path), Err(NewsError::Config(_))));

        std::fs::write(&path, "  \n").unwrap();
        assert!(AutoCacheStore::open(&path).unwrap().get("x").await.is_none());
    }
}
