//! Country mention detection over free text.

use crate::models::DatasetEntry;
use crate::utils::normalize_key;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Phrase dictionary built from the curated dataset (canonical names + aliases).
///
/// Phrases are tried longest first so "United States" wins over "United".
#[derive(Debug, Clone)]
pub struct CountryMatcher {
    phrases: Vec<String>,
    to_canon: HashMap<String, String>,
}

impl CountryMatcher {
    pub fn from_entries(raw: &BTreeMap<String, DatasetEntry>) -> Self {
        let mut to_canon: HashMap<String, String> = HashMap::new();
        let mut phrases = Vec::with_capacity(raw.len() * 2);

        for (canon, entry) in raw {
            let canon = canon.trim();
            if canon.is_empty() || entry.iso2.trim().is_empty() {
                continue;
            }
            for phrase in std::iter::once(canon).chain(entry.aliases.iter().map(String::as_str)) {
                let key = normalize_key(phrase);
                if key.is_empty() || to_canon.contains_key(&key) {
                    continue;
                }
                to_canon.insert(key.clone(), canon.to_string());
                phrases.push(key);
            }
        }

        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { phrases, to_canon }
    }

    /// Canonical names mentioned in `text`, without duplicates, in
    /// phrase-length-descending match order.
    pub fn find_countries(&self, text: &str) -> Vec<String> {
        let haystack = format!(" {} ", normalize_key(text));
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for phrase in &self.phrases {
            if !haystack.contains(&format!(" {phrase} ")) {
                continue;
            }
            let canon = &self.to_canon[phrase];
            if seen.insert(canon.clone()) {
                out.push(canon.clone());
            }
        }
        out
    }
}
