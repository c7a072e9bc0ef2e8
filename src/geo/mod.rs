//! Geographic scope resolution.
//!
//! Turns free-text country mentions into [`CountryInfo`] records and those
//! into localized [`crate::models::DiscoveryTarget`]s.
//!
//! # Resolver chain
//!
//! Resolution is a stack of [`CountryResolver`] implementations composed by
//! wrapping, first success wins:
//!
//! ```text
//! ResolverChain
//! ├── CountryCache            (in-process + on-disk, keyed by normalized name)
//! ├── DatasetResolver         (curated data/country_languages.json)
//! └── AutoCacheResolver       (learned data/country_auto_cache.json)
//!     └── RestCountriesResolver (external country-metadata API)
//! ```
//!
//! Every success of the chain is written through to the cache.

pub mod auto_cache;
pub mod cache;
pub mod chain;
pub mod dataset;
pub mod hints;
pub mod matcher;
pub mod rest_countries;
pub mod targets;

use crate::error::NewsError;
use crate::models::CountryInfo;

pub use auto_cache::{AutoCacheResolver, AutoCacheStore};
pub use cache::CountryCache;
pub use chain::ResolverChain;
pub use dataset::DatasetResolver;
pub use matcher::CountryMatcher;
pub use rest_countries::RestCountriesResolver;

/// Something that can resolve a country name.
pub trait CountryResolver {
    /// Resolve `name` to a country, or [`NewsError::NotFound`].
    async fn resolve_country(&self, name: &str) -> Result<CountryInfo, NewsError>;
}

/// Lower-case, trim, drop codes outside 2..=8 chars, dedupe preserving order.
pub fn normalize_langs<S: AsRef<str>>(langs: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(langs.len());
    for l in langs {
        let l = l.as_ref().trim().to_lowercase();
        if !(2..=8).contains(&l.chars().count()) {
            continue;
        }
        if !out.contains(&l) {
            out.push(l);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_langs() {
        assert_eq!(
            normalize_langs(&[" EN ", "fr", "en", "", "x", "toolongcode"]),
            vec!["en".to_string(), "fr".to_string()]
        );
    }
}
