//! Resolution cache for the resolver chain.
//!
//! Keyed by [`normalize_key`] of the name the user typed. Loaded lazily from
//! disk on first use, and persisted with an atomic write-temp-then-rename on
//! every insert. A corrupt cache file is ignored rather than failing the
//! search.

use crate::models::CountryInfo;
use crate::utils::{normalize_key, write_json_atomic};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CacheState {
    in_mem: BTreeMap<String, CountryInfo>,
    loaded: bool,
}

/// In-process country cache with optional on-disk persistence.
#[derive(Debug)]
pub struct CountryCache {
    path: Option<PathBuf>,
    state: Mutex<CacheState>,
}

impl CountryCache {
    /// Cache persisted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Cache that never touches the filesystem.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub async fn get(&self, name: &str) -> Option<CountryInfo> {
        let key = normalize_key(name);
        let mut state = self.state.lock().await;
        self.load_locked(&mut state).await;
        state.in_mem.get(&key).cloned()
    }

    /// Insert and persist. Persistence failures are logged, never returned.
    ///
    /// The lock is held across the write so concurrent inserts reach the
    /// file in order.
    pub async fn put(&self, name: &str, info: CountryInfo) {
        let key = normalize_key(name);
        if key.is_empty() {
            return;
        }
        let mut state = self.state.lock().await;
        self.load_locked(&mut state).await;
        state.in_mem.insert(key, info);

        if let Some(path) = &self.path {
            if let Err(e) = write_json_atomic(path, &state.in_mem).await {
                warn!(path = %path.display(), error = %e, "Failed to persist country cache");
            }
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        let mut state = self.state.lock().await;
        self.load_locked(&mut state).await;
        state.in_mem.len()
    }

    async fn load_locked(&self, state: &mut CacheState) {
        if state.loaded {
            return;
        }
        state.loaded = true;

        let Some(path) = &self.path else {
            return;
        };
        let bytes = match fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read country cache");
                return;
            }
        };
        match serde_json::from_slice::<BTreeMap<String, CountryInfo>>(&bytes) {
            Ok(m) => {
                debug!(entries = m.len(), path = %path.display(), "Loaded country cache");
                state.in_mem.extend(m);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt country cache");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn hungary() -> CountryInfo {
        CountryInfo {
            name: "Hungary".to_string(),
            iso2: "HU".to_string(),
            languages: vec!["hu".to_string()],
        }
    }

    #[tokio::test]
    async fn test_get_uses_normalized_key() {
        let cache = CountryCache::in_memory();
        cache.put("  HUNGARY!", hungary()).await;
        assert_eq!(cache.get("hungary").await, Some(hungary()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("country_cache.json");

        let cache = CountryCache::new(&path);
        cache.put("Hungary", hungary()).await;
        assert!(path.exists());

        let reloaded = CountryCache::new(&path);
        assert_eq!(reloaded.get("hungary").await, Some(hungary()));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("country_cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = CountryCache::new(&path);
        assert_eq!(cache.get("hungary").await, None);
        cache.put("Hungary", hungary()).await;
        assert_eq!(CountryCache::new(&path).get("Hungary").await, Some(hungary()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_keep_file_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("country_cache.json");
        let cache = Arc::new(CountryCache::new(&path));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let mut info = hungary();
                    info.name = format!("Country {i}");
                    cache.put(&format!("country {i}"), info).await;
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(CountryCache::new(&path).len().await, 8);
    }
}
