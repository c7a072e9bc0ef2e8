//! Aggregation and scoring of discovered candidates.
//!
//! - [`dedupe_candidates`]: one candidate per normalized URL, newest wins
//! - [`filter_candidates`]: keyword/country/recency relevance, zero dropped
//! - [`apply_consensus`]: cross-source title overlap counts

use crate::intent::extract_keywords;
use crate::models::{Candidate, CountryInfo, Intent};
use crate::utils::normalize_url;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

const KEYWORD_POINTS: u32 = 10;
const COUNTRY_POINTS: u32 = 5;
const RECENCY_POINTS: u32 = 2;
const CONSENSUS_MIN_SHARED: usize = 2;

/// Collapse candidates sharing a normalized URL, keeping the most recently
/// published one, and sort by publication time, newest first.
///
/// The surviving candidate keeps its URL as found.
pub fn dedupe_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut best: HashMap<String, Candidate> = HashMap::with_capacity(candidates.len());
    for c in candidates {
        let key = normalize_url(&c.url);
        if key.is_empty() {
            continue;
        }
        match best.get(&key) {
            Some(existing) if existing.published_at >= c.published_at => {}
            _ => {
                best.insert(key, c);
            }
        }
    }

    let mut out: Vec<Candidate> = best.into_values().collect();
    out.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.url.cmp(&b.url))
    });
    out
}

/// Score candidates for relevance and drop those scoring zero.
///
/// Score = 10 per query/intent keyword found in the title, 5 per resolved
/// country name found in the title, 2 if published within 24h of `now`.
/// Each distinct keyword counts once. Survivors are sorted by score,
/// highest first, with the score written to `relevance_score`.
#[instrument(level = "info", skip_all, fields(candidates = candidates.len()))]
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    query: &str,
    intent: &Intent,
    resolved: &[CountryInfo],
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let terms: BTreeSet<String> = extract_keywords(query)
        .into_iter()
        .chain(intent.keywords.iter().map(|k| k.to_lowercase()))
        .filter(|k| !k.is_empty())
        .collect();
    let countries: Vec<String> = resolved
        .iter()
        .map(|c| c.name.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    let total = candidates.len();
    let mut scored: Vec<Candidate> = candidates
        .into_iter()
        .filter_map(|mut c| {
            let title = c.title.to_lowercase();
            let keyword_hits = terms.iter().filter(|t| title.contains(t.as_str())).count() as u32;
            let country_hits = countries.iter().filter(|n| title.contains(n.as_str())).count() as u32;
            let recent = now.signed_duration_since(c.published_at) <= Duration::hours(24);

            let score = KEYWORD_POINTS * keyword_hits
                + COUNTRY_POINTS * country_hits
                + if recent { RECENCY_POINTS } else { 0 };
            if score == 0 {
                return None;
            }
            c.relevance_score = score;
            Some(c)
        })
        .collect();

    scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    debug!(total, kept = scored.len(), "Relevance filter applied");
    scored
}

/// Count, for each candidate, the other candidates whose titles share at
/// least two keyword tokens with it.
///
/// Every ordered pair is compared, so an overlapping pair raises both
/// counters.
pub fn apply_consensus(candidates: &mut [Candidate]) {
    let token_sets: Vec<HashSet<String>> = candidates
        .iter()
        .map(|c| extract_keywords(&c.title).into_iter().collect())
        .collect();

    for (i, cand) in candidates.iter_mut().enumerate() {
        let agreeing = token_sets
            .iter()
            .enumerate()
            .filter(|(j, other)| {
                *j != i && token_sets[i].intersection(other).count() >= CONSENSUS_MIN_SHARED
            })
            .count() as u32;
        cand.consensus_score += agreeing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cand(title: &str, url: &str, hour: u32) -> Candidate {
        Candidate {
            title: title.to_string(),
            url: url.to_string(),
            source: "test".to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 5, 6, hour, 0, 0).unwrap(),
            found_by: "global | test".to_string(),
            relevance_score: 0,
            consensus_score: 0,
        }
    }

    fn canada() -> CountryInfo {
        CountryInfo {
            name: "Canada".to_string(),
            iso2: "CA".to_string(),
            languages: vec!["en".to_string(), "fr".to_string()],
        }
    }

    #[test]
    fn test_dedupe_keeps_latest_duplicate() {
        let out = dedupe_candidates(vec![
            cand("a", "https://Example.com/story?utm_source=rss", 8),
            cand("b", "https://example.com/story#comments", 12),
            cand("c", "https://example.com/story", 10),
            cand("d", "https://other.com/x", 9),
            cand("empty", "", 23),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "b");
        assert_eq!(out[0].url, "https://example.com/story#comments");
        assert_eq!(out[1].title, "d");
    }

    #[test]
    fn test_filter_scores_and_drops_zero() {
        let now = Utc.with_ymd_and_hms(2025, 5, 6, 23, 0, 0).unwrap();
        let old = Candidate {
            published_at: Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            ..cand("Canada housing crisis worsens", "https://a.com/1", 0)
        };
        let unrelated_old = Candidate {
            published_at: Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            ..cand("Football scores", "https://a.com/2", 0)
        };
        let recent_unrelated = cand("Weather today", "https://a.com/3", 20);

        let intent = crate::intent::extract_intent("housing crisis");
        let out = filter_candidates(
            vec![unrelated_old, recent_unrelated, old],
            "housing crisis",
            &intent,
            &[canada()],
            now,
        );

        assert_eq!(out.len(), 2);
        // housing + crisis once each, plus the country
        assert_eq!(out[0].title, "Canada housing crisis worsens");
        assert_eq!(out[0].relevance_score, 25);
        assert_eq!(out[1].title, "Weather today");
        assert_eq!(out[1].relevance_score, 2);
        assert!(out.iter().all(|c| c.relevance_score > 0));
    }

    #[test]
    fn test_consensus_is_symmetric() {
        let mut cands = vec![
            cand("Canada housing starts slump in April", "https://a.com/1", 1),
            cand("April housing starts fall across Canada", "https://b.com/1", 2),
            cand("Housing prices climb", "https://c.com/1", 3),
            cand("Football scores", "https://d.com/1", 4),
        ];
        apply_consensus(&mut cands);
        // first two share canada, housing, starts, april
        assert_eq!(cands[0].consensus_score, 1);
        assert_eq!(cands[1].consensus_score, 1);
        // only "housing" in common with the others
        assert_eq!(cands[2].consensus_score, 0);
        assert_eq!(cands[3].consensus_score, 0);
    }
}
