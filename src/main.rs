//! # newscheck
//!
//! Finds recent news articles about a free-text topic, scoped to the
//! countries the topic is about, across localized news search, curated
//! global feeds and direct publisher feeds.
//!
//! ## Usage
//!
//! ```sh
//! newscheck "housing crisis in Canada" --window 7d -j ./json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Intent**: classify the query into topics, themes, regions, countries, keywords
//! 2. **Geography**: resolve countries and derive (country, language) targets
//! 3. **Plans**: expand the query into weighted, scoped sub-queries
//! 4. **Discovery**: fan out over all sources, then deduplicate
//! 5. **Scoring**: relevance filter and cross-source consensus
//! 6. **Output**: print the ranking and optionally write JSON

use chrono::{SecondsFormat, Utc};
use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cancel;
mod cli;
mod config;
mod discovery;
mod error;
mod geo;
mod intent;
mod models;
mod outputs;
mod plans;
mod scoring;
mod service;
mod utils;

use cancel::CancelToken;
use cli::Cli;
use models::SearchResult;
use outputs::json;
use service::{SearchRequest, SearchService, ServiceConfig};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newscheck starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(reason) = intent::validate_query(&args.query) {
        error!(query = %args.query, reason, "Query rejected");
        return Err(format!("invalid query: {reason}").into());
    }
    let scope = args.scope_mode()?;
    let time_range = args.time_range(Utc::now())?;

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Build service ----
    let sources = config::load_sources(args.sources.as_deref())?;
    let service_config = ServiceConfig {
        auto_cache_path: args.auto_cache.clone(),
        cache_path: args.cache.clone(),
        sources,
        concurrency: args.concurrency,
        timeout: Duration::from_secs(args.timeout_secs),
        ..ServiceConfig::new(&args.dataset)
    };
    let service = SearchService::build(&service_config)?;

    // ---- Cancellation: Ctrl-C or deadline ----
    let cancel = CancelToken::with_deadline(Duration::from_secs(args.deadline_secs));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; finishing with partial results");
                cancel.cancel();
            }
        });
    }

    // ---- Search ----
    let request = SearchRequest {
        query: args.query.clone(),
        time_range,
        scope,
        limit: args.limit,
    };
    let result = service.search(&request, &cancel).await;
    if cancel.is_cancelled() {
        warn!(deadline_secs = args.deadline_secs, "Search was cut short");
    }

    print_result(&result, args.top);

    // ---- JSON output ----
    if let Some(dir) = &args.json_output_dir {
        match json::write_search_result(&result, dir).await {
            Ok(path) => info!(path = %path.display(), "Search result saved"),
            Err(e) => error!(error = %e, "Failed to write search result JSON"),
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        candidates = result.candidates.len(),
        "Execution complete"
    );

    Ok(())
}

/// Human-readable summary of a search on stdout.
fn print_result(result: &SearchResult, top: usize) {
    let list = |v: &[String]| if v.is_empty() { "-".to_string() } else { v.iter().join(", ") };

    println!("Query:     {}", result.query);
    println!("Topics:    {}", list(&result.intent.topics));
    println!("Themes:    {}", list(&result.intent.themes));
    println!("Regions:   {}", list(&result.intent.regions));
    println!("Countries: {}", list(&result.intent.countries));
    println!("Keywords:  {}", list(&result.intent.keywords));
    println!(
        "Resolved:  {}",
        result
            .resolved
            .iter()
            .map(|c| format!("{} ({}: {})", c.name, c.iso2, c.languages.join("/")))
            .join(", ")
    );
    println!(
        "Targets:   {}",
        result
            .targets
            .iter()
            .map(|t| format!("{}/{}", t.iso2, t.lang))
            .join(" ")
    );

    println!("\nPlans ({}):", result.plans.len());
    for p in &result.plans {
        println!("  [{:>3}] {:<28} {:<22} {}  ({})", p.weight, p.scope, p.focus, p.query, p.explain);
    }

    if result.candidates.is_empty() {
        println!("\nNo relevant articles found in the requested window.");
        return;
    }

    println!("\nTop {} of {} candidates:", top.min(result.candidates.len()), result.candidates.len());
    for (i, c) in result.candidates.iter().take(top).enumerate() {
        let consensus = if c.consensus_score > 1 {
            format!(" [{} sources agree]", c.consensus_score)
        } else {
            String::new()
        };
        println!("{:>3}. {}{}", i + 1, c.title, consensus);
        println!("     relevance {} | {}", c.relevance_score, c.url);
        println!(
            "     {} | {}",
            c.published_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            c.source
        );
    }
}
