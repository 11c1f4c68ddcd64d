//! Post extraction entry point
//!
//! Runs the content pass and the stats pass concurrently against the same
//! loaded page and merges them into one record.

use anyhow::{Context, Result};
use log::warn;

use super::content::{ExtractionError, extract_content};
use super::js_scripts::INLINE_SCRIPTS_SCRIPT;
use super::schema::{PostRecord, PostStats};
use super::stats::extract_stats;
use crate::browser::BrowserPage;

/// Extract a full post record from a loaded post page.
///
/// A missing content region fails the extraction; a stats failure only costs
/// the counters, which fall back to zero.
///
/// # Errors
/// `ExtractionError::MissingContent` or `ExtractionError::Page`.
pub async fn extract_post(
    page: &dyn BrowserPage,
    canonical_url: &str,
) -> Result<PostRecord, ExtractionError> {
    let (content, stats) = tokio::join!(
        content_pass(page, canonical_url),
        stats_pass(page, canonical_url)
    );

    let mut record = content?;
    record.stats = stats.unwrap_or_else(|e| {
        warn!("Stats unavailable for {}: {:#}", canonical_url, e);
        PostStats::default()
    });
    Ok(record)
}

async fn content_pass(
    page: &dyn BrowserPage,
    canonical_url: &str,
) -> Result<PostRecord, ExtractionError> {
    let html = page.content().await.map_err(ExtractionError::Page)?;
    extract_content(&html, canonical_url)
}

async fn stats_pass(page: &dyn BrowserPage, canonical_url: &str) -> Result<PostStats> {
    let value = page
        .evaluate(INLINE_SCRIPTS_SCRIPT)
        .await
        .context("Failed to collect inline scripts")?;
    let scripts: Vec<String> =
        serde_json::from_value(value).context("Inline scripts were not a string array")?;
    Ok(extract_stats(&scripts, canonical_url))
}
