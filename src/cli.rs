//! Command-line interface definitions for newscheck.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use crate::models::TimeRange;
use crate::service::ScopeMode;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Relative search windows ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Window {
    #[value(name = "24h")]
    Day,
    #[value(name = "7d")]
    Week,
    #[value(name = "30d")]
    Month,
}

impl Window {
    pub fn duration(self) -> Duration {
        match self {
            Window::Day => Duration::hours(24),
            Window::Week => Duration::days(7),
            Window::Month => Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scope {
    /// Countries detected in the query
    Auto,
    /// The country named by --country
    Country,
    /// No country scoping
    Global,
}

/// Command-line arguments for newscheck.
///
/// # Examples
///
/// ```sh
/// # Last 7 days, countries detected from the query
/// newscheck "housing crisis in Canada"
///
/// # Fixed dates, forced country, JSON written to ./out
/// newscheck "elections" --from 2025-05-01 --to 2025-05-07 --country Hungary -j ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Free-text topic to search for
    #[arg(env = "NEWSCHECK_QUERY")]
    pub query: String,

    /// Relative window ending now (ignored when --from/--to are given)
    #[arg(short, long, value_enum, env = "NEWSCHECK_WINDOW", default_value = "7d")]
    pub window: Window,

    /// Start date of a custom range (YYYY-MM-DD, UTC)
    #[arg(long, env = "NEWSCHECK_FROM", requires = "to")]
    pub from: Option<NaiveDate>,

    /// End date of a custom range, inclusive of the whole day
    #[arg(long, env = "NEWSCHECK_TO", requires = "from")]
    pub to: Option<NaiveDate>,

    /// How countries are chosen
    #[arg(short, long, value_enum, env = "NEWSCHECK_SCOPE", default_value = "auto")]
    pub scope: Scope,

    /// Country to scope to; implies --scope country unless --scope global
    #[arg(short = 'C', long, env = "NEWSCHECK_COUNTRY")]
    pub country: Option<String>,

    /// Curated country dataset (JSON)
    #[arg(long, env = "NEWSCHECK_DATASET", default_value = "data/country_languages.json")]
    pub dataset: PathBuf,

    /// Auto-learned country cache (JSON, written at runtime)
    #[arg(long, env = "NEWSCHECK_AUTO_CACHE", default_value = "data/country_auto_cache.json")]
    pub auto_cache: PathBuf,

    /// Resolution cache (JSON, written at runtime)
    #[arg(long, env = "NEWSCHECK_CACHE", default_value = "data/country_cache.json")]
    pub cache: PathBuf,

    /// Optional YAML file overriding the feed source tables
    #[arg(long, env = "NEWSCHECK_SOURCES")]
    pub sources: Option<PathBuf>,

    /// Output directory for the search result JSON
    #[arg(short, long, env = "NEWSCHECK_JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<String>,

    /// Desired number of candidates
    #[arg(short, long, env = "NEWSCHECK_LIMIT", default_value_t = 25)]
    pub limit: usize,

    /// Maximum concurrent network calls during discovery
    #[arg(long, env = "NEWSCHECK_CONCURRENCY", default_value_t = 6)]
    pub concurrency: usize,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "NEWSCHECK_TIMEOUT_SECS", default_value_t = 20)]
    pub timeout_secs: u64,

    /// Deadline for the whole search in seconds
    #[arg(long, env = "NEWSCHECK_DEADLINE_SECS", default_value_t = 120)]
    pub deadline_secs: u64,

    /// Number of candidates printed
    #[arg(short, long, env = "NEWSCHECK_TOP", default_value_t = 20)]
    pub top: usize,
}

impl Cli {
    /// The scope mode the flags ask for.
    pub fn scope_mode(&self) -> Result<ScopeMode, String> {
        let country = self
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        match (self.scope, country) {
            (Scope::Global, _) => Ok(ScopeMode::Global),
            (Scope::Country | Scope::Auto, Some(c)) => Ok(ScopeMode::Chosen(c.to_string())),
            (Scope::Country, None) => Err("--scope country requires --country".to_string()),
            (Scope::Auto, None) => Ok(ScopeMode::Auto),
        }
    }

    /// The publication window, from `--from/--to` or `--window` ending at `now`.
    pub fn time_range(&self, now: DateTime<Utc>) -> Result<TimeRange, String> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => {
                if from > to {
                    return Err(format!("--from {from} is after --to {to}"));
                }
                let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
                Ok(TimeRange {
                    from: from.and_time(NaiveTime::MIN).and_utc(),
                    to: to.and_time(end_of_day).and_utc(),
                })
            }
            _ => Ok(TimeRange {
                from: now - self.window.duration(),
                to: now,
            }),
        }
    }
}
