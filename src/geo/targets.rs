//! Discovery targets: which (country, language) variants of the localized
//! news search to query.

use crate::models::{CountryInfo, DiscoveryTarget};
use std::collections::BTreeSet;

/// Target used when no country could be resolved.
pub const FALLBACK_TARGET: (&str, &str) = ("US", "en");

/// Map common ISO-639-2/3 codes to the ISO-639-1 codes news search expects.
///
/// Anything not in the table is returned lower-cased and trimmed.
pub fn to_news_lang(code: &str) -> String {
    let code = code.trim().to_lowercase();
    let mapped = match code.as_str() {
        "eng" => "en",
        "bul" => "bg",
        "zho" | "chi" => "zh",
        "jpn" => "ja",
        "kor" => "ko",
        "ron" | "rum" => "ro",
        "ces" | "cze" => "cs",
        "deu" | "ger" => "de",
        "fra" | "fre" => "fr",
        "spa" => "es",
        "por" => "pt",
        "ita" => "it",
        "nld" | "dut" => "nl",
        "pol" => "pl",
        "hun" => "hu",
        "ukr" => "uk",
        "rus" => "ru",
        "srp" => "sr",
        "hrv" => "hr",
        "slk" | "slo" => "sk",
        "slv" => "sl",
        "lit" => "lt",
        "lav" => "lv",
        "est" => "et",
        "ell" | "gre" => "el",
        "tur" => "tr",
        "ara" => "ar",
        "heb" => "he",
        "hin" => "hi",
        "swe" => "sv",
        "nor" | "nob" => "no",
        "dan" => "da",
        "fin" => "fi",
        _ => return code,
    };
    mapped.to_string()
}

/// Targets for one country: each distinct normalized language, plus English
/// when `include_english`, sorted by language.
pub fn targets_for_country(country: &CountryInfo, include_english: bool) -> Vec<DiscoveryTarget> {
    let iso2 = country.iso2.trim().to_uppercase();
    if iso2.is_empty() {
        return Vec::new();
    }

    let mut langs: BTreeSet<String> = country
        .languages
        .iter()
        .map(|l| to_news_lang(l))
        .filter(|l| !l.is_empty())
        .collect();
    if include_english {
        langs.insert("en".to_string());
    }

    langs
        .into_iter()
        .map(|lang| DiscoveryTarget {
            iso2: iso2.clone(),
            lang,
        })
        .collect()
}

/// Targets for all resolved countries, deduplicated and sorted by ISO2 then
/// language. English is always included. Falls back to [`FALLBACK_TARGET`].
pub fn build_targets(resolved: &[CountryInfo]) -> Vec<DiscoveryTarget> {
    if resolved.is_empty() {
        return vec![DiscoveryTarget {
            iso2: FALLBACK_TARGET.0.to_string(),
            lang: FALLBACK_TARGET.1.to_string(),
        }];
    }

    let set: BTreeSet<DiscoveryTarget> = resolved
        .iter()
        .flat_map(|c| targets_for_country(c, true))
        .collect();
    set.into_iter().collect()
}

/// Localized query parameters `(hl, gl, ceid)`, e.g. `("hu-HU", "HU", "HU:hu")`.
///
/// `None` when either part is empty.
pub fn news_params(iso2: &str, lang: &str) -> Option<(String, String, String)> {
    let iso2 = iso2.trim().to_uppercase();
    let lang = to_news_lang(lang);
    if iso2.is_empty() || lang.is_empty() {
        return None;
    }
    Some((
        format!("{lang}-{iso2}"),
        iso2.clone(),
        format!("{iso2}:{lang}"),
    ))
}
