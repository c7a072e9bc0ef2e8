//! Rule-based intent extraction.
//!
//! Topics, themes, regions and countries come from hand-authored lexicons
//! (label -> substring patterns, matched case-insensitively). Keywords are
//! the most frequent non-stopword tokens. There is no stemming and no NLP;
//! swap the [`Lexicons`] to change the classification rules.

use crate::models::Intent;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};

/// One lexicon: label and the substrings that trigger it.
pub type Lexicon = &'static [(&'static str, &'static [&'static str])];

pub const REGION_LEXICON: Lexicon = &[
    ("South America", &["south america", "latin america", "latam"]),
    ("Caribbean", &["caribbean", "west indies"]),
    ("North America", &["north america"]),
    ("Europe", &["europe", "eu"]),
    ("Africa", &["africa"]),
    ("Middle East", &["middle east"]),
    ("Asia", &["asia"]),
    ("World", &["world", "global", "international"]),
];

pub const COUNTRY_LEXICON: Lexicon = &[
    ("Argentina", &["argentina"]),
    ("Bolivia", &["bolivia"]),
    ("Brazil", &["brazil"]),
    ("Chile", &["chile"]),
    ("Colombia", &["colombia"]),
    ("Ecuador", &["ecuador"]),
    ("Guyana", &["guyana"]),
    ("Paraguay", &["paraguay"]),
    ("Peru", &["peru"]),
    ("Suriname", &["suriname"]),
    ("Uruguay", &["uruguay"]),
    ("Venezuela", &["venezuela"]),
    ("Haiti", &["haiti"]),
    ("Jamaica", &["jamaica"]),
    ("Dominican Republic", &["dominican republic", "dr"]),
    ("Cuba", &["cuba"]),
    ("Trinidad and Tobago", &["trinidad", "trinidad and tobago"]),
    ("Barbados", &["barbados"]),
    ("Bahamas", &["bahamas"]),
];

pub const TOPIC_LEXICON: Lexicon = &[
    (
        "Politics",
        &["politic", "government", "parliament", "congress", "president", "prime minister", "minister"],
    ),
    (
        "Economy",
        &["economy", "inflation", "gdp", "recession", "interest rate", "central bank", "imf", "debt"],
    ),
    (
        "Security",
        &["security", "military", "attack", "terror", "violence", "cartel", "gang"],
    ),
    ("Health", &["health", "outbreak", "virus", "hospital", "public health"]),
    ("Tech", &["technology", "tech", "ai", "cyber", "hacker", "data breach"]),
];

pub const THEME_LEXICON: Lexicon = &[
    ("Elections", &["election", "vote", "ballot", "runoff", "campaign"]),
    ("Protests", &["protest", "demonstration", "strike", "unrest", "riot"]),
    ("Sanctions", &["sanction"]),
    ("Corruption", &["corruption", "bribery", "embezzle"]),
    ("Courts", &["court", "supreme court", "ruling", "judge"]),
    ("Legislation", &["bill", "law", "legislation", "act"]),
    ("Foreign policy", &["diplomacy", "treaty", "summit", "un", "oas"]),
];

/// The set of lexicons [`extract_intent_with`] classifies against.
#[derive(Debug, Clone, Copy)]
pub struct Lexicons {
    pub regions: Lexicon,
    pub countries: Lexicon,
    pub topics: Lexicon,
    pub themes: Lexicon,
}

impl Default for Lexicons {
    fn default() -> Self {
        Self {
            regions: REGION_LEXICON,
            countries: COUNTRY_LEXICON,
            topics: TOPIC_LEXICON,
            themes: THEME_LEXICON,
        }
    }
}

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "to", "of", "in", "on", "for", "with", "is", "are", "was",
    "were", "be", "been", "being", "this", "that", "these", "those", "what", "who", "where",
    "when", "why", "how", "latest", "major", "developments", "development",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());
static RE_ALL_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\p{P}\p{S}\s]+$").unwrap());
static RE_WORD_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}{3,}").unwrap());

const MAX_KEYWORDS: usize = 12;

pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Whether `token` is a label of any built-in lexicon (case-insensitive).
pub fn is_lexicon_label(token: &str) -> bool {
    let l = Lexicons::default();
    [l.regions, l.countries, l.topics, l.themes]
        .iter()
        .flat_map(|lex| lex.iter())
        .any(|(label, _)| label.eq_ignore_ascii_case(token))
}

/// Classify `text` with the built-in lexicons.
pub fn extract_intent(text: &str) -> Intent {
    extract_intent_with(text, &Lexicons::default())
}

pub fn extract_intent_with(text: &str, lexicons: &Lexicons) -> Intent {
    let t = text.to_lowercase();
    Intent {
        topics: match_any(&t, lexicons.topics),
        regions: match_any(&t, lexicons.regions),
        countries: match_any(&t, lexicons.countries),
        themes: match_any(&t, lexicons.themes),
        keywords: extract_keywords(&t),
    }
}

/// Labels whose patterns occur in the (already lower-cased) text, sorted.
fn match_any(text: &str, lexicon: Lexicon) -> Vec<String> {
    lexicon
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| text.contains(p)))
        .map(|(label, _)| label.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Top 12 tokens by frequency, ties broken lexicographically.
///
/// Tokens split on anything that is not a letter or digit; tokens shorter
/// than 3 characters and stopwords are dropped. Input is lower-cased.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let text = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tok in RE_NON_WORD.split(&text) {
        if tok.chars().count() < 3 || is_stopword(tok) {
            continue;
        }
        *counts.entry(tok).or_default() += 1;
    }

    let mut all: Vec<(&str, usize)> = counts.into_iter().collect();
    all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    all.into_iter()
        .take(MAX_KEYWORDS)
        .map(|(k, _)| k.to_string())
        .collect()
}

/// Reject queries that cannot produce a meaningful search.
///
/// Returns the reason on rejection.
pub fn validate_query(q: &str) -> Result<(), &'static str> {
    let q = q.trim();
    if q.is_empty() {
        return Err("empty");
    }
    if RE_ALL_PUNCT.is_match(q) {
        return Err("no words detected");
    }
    if !RE_WORD_TOKEN.is_match(q) {
        return Err("no real word token found");
    }

    let non_space: Vec<char> = q.chars().filter(|c| !c.is_whitespace()).collect();
    let letters = non_space.iter().filter(|c| c.is_alphabetic()).count();
    if (letters as f64) / (non_space.len() as f64) < 0.30 {
        return Err("too many non-letter characters");
    }

    if q.split_whitespace().count() < 2 {
        let longest = RE_WORD_TOKEN
            .find(q)
            .map(|m| m.as_str().chars().count())
            .unwrap_or(0);
        if longest < 4 {
            return Err("too few words");
        }
    }
    Ok(())
}
