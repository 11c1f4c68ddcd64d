//! Timeout utilities for page operations
//!
//! Every browser wait in the crawl goes through one of these helpers so a
//! stalled tab cannot hang a worker.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

use crate::browser::BrowserPage;

/// Extra time granted on top of a selector wait before the guard fires
const WAIT_GUARD_GRACE: Duration = Duration::from_secs(2);

/// Wrap an async page operation with an explicit timeout.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout_secs` - Timeout duration in seconds
/// * `operation_name` - Human-readable name for error messages
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - Either the operation failed or the timeout was reached
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {timeout_secs} seconds"
        )),
    }
}

/// Wait for `selector`, treating both absence and a stalled driver as `false`.
pub async fn wait_or_absent(page: &dyn BrowserPage, selector: &str, timeout: Duration) -> bool {
    tokio::time::timeout(
        timeout + WAIT_GUARD_GRACE,
        page.wait_for_selector(selector, timeout),
    )
    .await
    .unwrap_or(false)
}
