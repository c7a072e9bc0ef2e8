//! Search plan generation.
//!
//! Expands one user query into a ranked list of scoped sub-queries:
//!
//! | Weight | Plan                                 | Focus         |
//! |--------|--------------------------------------|---------------|
//! | 100    | original normalized query            | `mixed`       |
//! | 85     | top extracted keywords               | `mixed`       |
//! | 80     | query + topic                        | `topic:<t>`   |
//! | 75     | query + theme                        | `theme:<t>`   |
//! | 70     | query + country, expanded from region| `mixed`       |
//!
//! Every plan except the region expansion is emitted once per scope.

use crate::models::{CountryInfo, Intent, SearchPlan};
use crate::utils::normalize_query;
use std::collections::{BTreeSet, HashMap};

pub const MAX_PLANS: usize = 40;

const W_ORIGINAL: u32 = 100;
const W_KEYWORDS: u32 = 85;
const W_TOPIC: u32 = 80;
const W_THEME: u32 = 75;
const W_REGION_COUNTRY: u32 = 70;

/// Countries searched individually when a region is mentioned without any
/// specific country.
pub const REGION_COUNTRIES: &[(&str, &[&str])] = &[
    (
        "South America",
        &[
            "Argentina", "Bolivia", "Brazil", "Chile", "Colombia", "Ecuador", "Guyana", "Paraguay",
            "Peru", "Suriname", "Uruguay", "Venezuela",
        ],
    ),
    (
        "Caribbean",
        &[
            "Haiti", "Jamaica", "Dominican Republic", "Cuba", "Trinidad and Tobago", "Barbados",
            "Bahamas",
        ],
    ),
];

/// Build the ranked, deduplicated, capped plan list.
///
/// When `forced_countries` is non-empty the scopes are exactly those
/// countries; otherwise they come from the intent's regions and countries,
/// defaulting to `global`.
pub fn build_search_plans(
    original: &str,
    intent: &Intent,
    forced_countries: &[CountryInfo],
) -> Vec<SearchPlan> {
    let base = normalize_query(original);
    let scopes = if forced_countries.is_empty() {
        build_scopes(intent)
    } else {
        forced_countries
            .iter()
            .map(|c| format!("country:{}", c.iso2))
            .collect()
    };

    let mut plans = Vec::new();
    let mut emit = |query: String, scope: &str, focus: String, weight: u32, explain: &str| {
        plans.push(SearchPlan {
            query,
            scope: scope.to_string(),
            focus,
            weight,
            explain: explain.to_string(),
        });
    };

    for scope in &scopes {
        emit(base.clone(), scope.as_str(), "mixed".into(), W_ORIGINAL, "original user query");
    }

    if !intent.keywords.is_empty() {
        let kw = intent.keywords.join(" ");
        for scope in &scopes {
            emit(kw.clone(), scope.as_str(), "mixed".into(), W_KEYWORDS, "top extracted keywords");
        }
    }

    for topic in &intent.topics {
        for scope in &scopes {
            emit(
                format!("{base} {}", topic.to_lowercase()),
                scope.as_str(),
                format!("topic:{topic}"),
                W_TOPIC,
                "topic expansion",
            );
        }
    }

    for theme in &intent.themes {
        for scope in &scopes {
            emit(
                format!("{base} {}", theme.to_lowercase()),
                scope.as_str(),
                format!("theme:{theme}"),
                W_THEME,
                "theme expansion",
            );
        }
    }

    if intent.countries.is_empty() && !intent.regions.is_empty() {
        for country in countries_for_regions(&intent.regions) {
            emit(
                format!("{base} {}", country.to_lowercase()),
                format!("country:{country}").as_str(),
                "mixed".into(),
                W_REGION_COUNTRY,
                "country expansion from region",
            );
        }
    }

    let mut plans = dedupe_plans(plans);
    plans.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| a.scope.cmp(&b.scope))
            .then_with(|| a.query.cmp(&b.query))
    });
    plans.truncate(MAX_PLANS);
    plans
}

/// `region:<r>` for each region, `country:<c>` for each country, sorted;
/// `global` when there are neither.
fn build_scopes(intent: &Intent) -> Vec<String> {
    let scopes: BTreeSet<String> = intent
        .regions
        .iter()
        .map(|r| format!("region:{r}"))
        .chain(intent.countries.iter().map(|c| format!("country:{c}")))
        .collect();
    if scopes.is_empty() {
        return vec!["global".to_string()];
    }
    scopes.into_iter().collect()
}

/// Union of the static member lists of `regions`, sorted.
pub fn countries_for_regions(regions: &[String]) -> Vec<&'static str> {
    let set: BTreeSet<&'static str> = regions
        .iter()
        .filter_map(|r| REGION_COUNTRIES.iter().find(|(name, _)| *name == r.as_str()))
        .flat_map(|(_, members)| members.iter().copied())
        .collect();
    set.into_iter().collect()
}

/// Keep one plan per (scope, focus, query), the highest weight.
fn dedupe_plans(plans: Vec<SearchPlan>) -> Vec<SearchPlan> {
    let mut seen: HashMap<(String, String, String), SearchPlan> = HashMap::new();
    for p in plans {
        let key = (p.scope.clone(), p.focus.clone(), p.query.clone());
        match seen.get(&key) {
            Some(existing) if existing.weight >= p.weight => {}
            _ => {
                seen.insert(key, p);
            }
        }
    }
    seen.into_values().collect()
}

/// Plan query with its scope's place name appended, as sent to localized search.
pub fn scoped_query(query: &str, scope: &str) -> String {
    let q = query.trim();
    match scope
        .strip_prefix("region:")
        .or_else(|| scope.strip_prefix("country:"))
    {
        Some(place) if !place.is_empty() => format!("{q} {place}"),
        _ => q.to_string(),
    }
}
