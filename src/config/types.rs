//! Core configuration types for post crawling
//!
//! `CrawlConfig` carries every tunable of a run. Required fields are enforced
//! by the typestate builder in `builder.rs`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::browser::{DeviceProfile, Viewport};
use crate::utils::constants::{
    DEFAULT_BLOCKED_URL_PATTERNS, DEFAULT_CHECKPOINT_INTERVAL_SECS, DEFAULT_COOKIE_MAX_ATTEMPTS,
    DEFAULT_COOKIE_RETRY_INTERVAL_MS, DEFAULT_MAX_CONCURRENT_PAGES, DEFAULT_MAX_REQUEST_RETRIES,
    DEFAULT_MOBILE_MARKERS_TIMEOUT_SECS, DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SESSION_MAX_ERRORS, DEFAULT_SESSION_MAX_USAGE,
    DEFAULT_VIDEO_ELEMENT_TIMEOUT_SECS, DEFAULT_VIDEO_POSTER_TIMEOUT_SECS,
    DEFAULT_VIDEO_SETTLE_DELAY_MS,
};

/// Outbound proxy hint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// `scheme://[user:pass@]host:port`
    pub url: Option<String>,
    /// Residential exits are preferred by the platform; informational only.
    #[serde(default)]
    pub require_residential: bool,
}

/// Main configuration struct for a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Directory holding the state file and the dataset.
    pub(crate) storage_dir: PathBuf,
    pub(crate) start_urls: Vec<String>,
    pub(crate) headless: bool,

    /// Tabs open at once. Default: 5, Range: 1-50
    pub(crate) max_concurrent_pages: usize,
    /// Retries after the first attempt before a request is given up.
    pub(crate) max_request_retries: u8,
    /// Upper bound on one request, navigation to follow-up enqueue.
    pub(crate) request_timeout_secs: u64,
    /// Timeout in seconds for `page.goto()` operations
    pub(crate) page_load_timeout_secs: u64,
    pub(crate) mobile_markers_timeout_secs: u64,

    pub(crate) video_poster_timeout_secs: u64,
    pub(crate) video_settle_delay_ms: u64,
    pub(crate) video_element_timeout_secs: u64,
    pub(crate) cookie_retry_interval_ms: u64,
    pub(crate) cookie_max_attempts: u32,

    pub(crate) checkpoint_interval_secs: u64,
    pub(crate) session_max_usage: u32,
    pub(crate) session_max_errors: u32,

    pub(crate) default_device: DeviceProfile,
    pub(crate) mobile_viewport: Viewport,
    pub(crate) desktop_viewport: Viewport,
    /// Applied with `Network.setBlockedURLs` before every navigation
    pub(crate) blocked_url_patterns: Vec<String>,
    pub(crate) proxy: ProxyConfig,

    /// Chrome user data directory; a temporary profile is used when unset
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./storage"),
            start_urls: Vec::new(),
            headless: true,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            max_request_retries: DEFAULT_MAX_REQUEST_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            mobile_markers_timeout_secs: DEFAULT_MOBILE_MARKERS_TIMEOUT_SECS,
            video_poster_timeout_secs: DEFAULT_VIDEO_POSTER_TIMEOUT_SECS,
            video_settle_delay_ms: DEFAULT_VIDEO_SETTLE_DELAY_MS,
            video_element_timeout_secs: DEFAULT_VIDEO_ELEMENT_TIMEOUT_SECS,
            cookie_retry_interval_ms: DEFAULT_COOKIE_RETRY_INTERVAL_MS,
            cookie_max_attempts: DEFAULT_COOKIE_MAX_ATTEMPTS,
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL_SECS,
            session_max_usage: DEFAULT_SESSION_MAX_USAGE,
            session_max_errors: DEFAULT_SESSION_MAX_ERRORS,
            default_device: DeviceProfile::Mobile,
            mobile_viewport: Viewport::mobile_preset(),
            desktop_viewport: Viewport::desktop_preset(),
            blocked_url_patterns: DEFAULT_BLOCKED_URL_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            proxy: ProxyConfig::default(),
            chrome_data_dir: None,
        }
    }
}
