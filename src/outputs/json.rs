//! JSON output of a whole [`SearchResult`].
//!
//! Files are grouped by the local date of the run and named after the query:
//! `{json_output_dir}/{YYYY-MM-DD}/{query-slug}.json`. Running the same query
//! twice on one day replaces the earlier file.

use crate::models::SearchResult;
use crate::utils::slugify_title;
use chrono::Local;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// File stem used when the query has no characters usable in a slug.
const FALLBACK_STEM: &str = "search";

/// Serialize `result` and write it under `json_output_dir`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_search_result(
    result: &SearchResult,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(result)?;

    let local_date = Local::now().date_naive().to_string();
    let full_json_dir = PathBuf::from(json_output_dir).join(local_date);

    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join(format!("{}.json", file_stem(&result.query)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), candidates = result.candidates.len(), "Wrote search result JSON");

    Ok(path)
}

fn file_stem(query: &str) -> String {
    let slug = slugify_title(&query.split_whitespace().collect::<Vec<_>>().join(" "));
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        slug.to_string()
    }
}
