//! Country hints for queries the dataset matcher could not place.
//!
//! Only plausible candidates are sent to the resolver chain so that random
//! words do not turn into country-API calls.

use crate::intent::{is_lexicon_label, is_stopword};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_WORD_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}{3,}").unwrap());
static RE_ALL_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\p{P}\p{S}\s]+$").unwrap());

const MAX_HINTS: usize = 5;

/// Whether `q` plausibly names a country worth an API lookup.
pub fn looks_resolvable_country_query(q: &str) -> bool {
    let q = q.trim();
    if q.is_empty() || RE_ALL_PUNCT.is_match(q) || !RE_WORD_LIKE.is_match(q) {
        return false;
    }
    if q.split_whitespace().any(|t| capitalized(t).is_some()) {
        return true;
    }

    let l = q.to_lowercase();
    if l.contains(" in ") || l.contains(" from ") || l.contains(" for ") {
        return true;
    }

    let compact = q.split_whitespace().collect::<Vec<_>>().join(" ");
    compact.chars().count() <= 40
}

/// Candidate country names from `q`: capitalized bigrams first, then single
/// capitalized tokens, in order of appearance, without stopwords or
/// lexicon labels.
pub fn extract_country_hints(q: &str) -> Vec<String> {
    if !looks_resolvable_country_query(q) {
        return Vec::new();
    }

    let tokens: Vec<Option<&str>> = q.split_whitespace().map(capitalized).collect();
    let mut hints: Vec<String> = Vec::new();
    let mut push = |h: String| {
        if !hints.iter().any(|x| x.eq_ignore_ascii_case(&h)) {
            hints.push(h);
        }
    };

    for pair in tokens.windows(2) {
        if let [Some(a), Some(b)] = pair {
            push(format!("{a} {b}"));
        }
    }
    for t in tokens.iter().flatten() {
        if !is_stopword(&t.to_lowercase()) && !is_lexicon_label(t) {
            push(t.to_string());
        }
    }

    hints.truncate(MAX_HINTS);
    hints
}

/// The token with surrounding punctuation trimmed, if it is 3+ chars,
/// starts uppercase and contains a letter.
fn capitalized(token: &str) -> Option<&str> {
    let t = token.trim_matches(|c: char| !c.is_alphanumeric());
    if t.chars().count() < 3 {
        return None;
    }
    let first = t.chars().next()?;
    (first.is_uppercase() && t.chars().any(char::is_alphabetic)).then_some(t)
}
