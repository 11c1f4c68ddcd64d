//! Browser cleanup after a run

use chromiumoxide::Browser;
use log::{debug, warn};
use tokio::task::JoinHandle;

/// Result of cleanup operations
#[derive(Debug, Clone)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Close the browser, wait for its process, then stop the CDP handler.
///
/// The handler must outlive `close()` or the close command is never delivered.
pub async fn cleanup_browser(mut browser: Browser, handler: JoinHandle<()>) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "postcrawl::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "postcrawl::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    // Wait for browser process to fully exit
    if let Err(e) = browser.wait().await {
        warn!(target: "postcrawl::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    handler.abort();
    if let Err(e) = handler.await
        && !e.is_cancelled()
    {
        warn!(target: "postcrawl::cleanup", "Handler task failed during abort: {e}");
        errors.push(format!("Handler task failed: {e}"));
    }

    if errors.is_empty() {
        CleanupResult::Success
    } else {
        CleanupResult::PartialFailure(errors)
    }
}
