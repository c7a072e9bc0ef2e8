//! Curated country dataset.
//!
//! The dataset file maps canonical names to [`DatasetEntry`] records:
//!
//! ```json
//! {
//!   "Canada": {"iso2": "CA", "languages": ["en", "fr"], "aliases": ["canadian"]}
//! }
//! ```
//!
//! A missing or unparseable dataset is a configuration error and fatal at
//! startup.

use super::{CountryResolver, normalize_langs};
use crate::error::NewsError;
use crate::models::{CountryInfo, DatasetEntry};
use crate::utils::normalize_key;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Read and parse a dataset-shaped JSON file.
pub fn load_dataset(path: &Path) -> Result<BTreeMap<String, DatasetEntry>, NewsError> {
    let bytes = std::fs::read(path)
        .map_err(|e| NewsError::Config(format!("cannot read {}: {e}", path.display())))?;
    let raw: BTreeMap<String, DatasetEntry> = serde_json::from_slice(&bytes)
        .map_err(|e| NewsError::Config(format!("cannot parse {}: {e}", path.display())))?;
    info!(countries = raw.len(), path = %path.display(), "Loaded country dataset");
    Ok(raw)
}

/// Resolves names and aliases from the curated dataset.
#[derive(Debug, Clone)]
pub struct DatasetResolver {
    by_key: HashMap<String, CountryInfo>,
}

impl DatasetResolver {
    pub fn from_entries(raw: &BTreeMap<String, DatasetEntry>) -> Self {
        let mut by_key = HashMap::new();
        for (name, entry) in raw {
            let info = CountryInfo {
                name: name.trim().to_string(),
                iso2: entry.iso2.trim().to_uppercase(),
                languages: normalize_langs(&entry.languages),
            };
            if info.iso2.is_empty() {
                continue;
            }
            for alias in entry.aliases.iter().filter(|a| !a.trim().is_empty()) {
                by_key.insert(normalize_key(alias), info.clone());
            }
            // canonical name wins over an alias that collides with it
            by_key.insert(normalize_key(name), info);
        }
        Self { by_key }
    }

    pub fn lookup(&self, name: &str) -> Option<&CountryInfo> {
        self.by_key.get(&normalize_key(name))
    }
}

impl CountryResolver for DatasetResolver {
    async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError> {
        match self.lookup(name) {
            Some(info) => {
                debug!(%name, iso2 = %info.iso2, "Resolved from dataset");
                Ok(info.clone())
            }
            None => Err(NewsError::NotFound(name.to_string())),
        }
    }
}
