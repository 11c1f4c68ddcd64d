//! Getter methods for `CrawlConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from a `CrawlConfig` instance.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{CrawlConfig, ProxyConfig};
use crate::browser::{DeviceProfile, LaunchOptions, Viewport};
use crate::page_extractor::VideoTimings;
use crate::utils::constants::{DATASET_FILE_NAME, STATE_FILE_NAME};

impl CrawlConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.storage_dir.join(STATE_FILE_NAME)
    }

    #[must_use]
    pub fn dataset_file(&self) -> PathBuf {
        self.storage_dir.join(DATASET_FILE_NAME)
    }

    #[must_use]
    pub fn start_urls(&self) -> &[String] {
        &self.start_urls
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn max_concurrent_pages(&self) -> usize {
        self.max_concurrent_pages
    }

    #[must_use]
    pub fn max_request_retries(&self) -> u8 {
        self.max_request_retries
    }

    #[must_use]
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    #[must_use]
    pub fn page_load_timeout_secs(&self) -> u64 {
        self.page_load_timeout_secs
    }

    #[must_use]
    pub fn mobile_markers_timeout(&self) -> Duration {
        Duration::from_secs(self.mobile_markers_timeout_secs)
    }

    #[must_use]
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }

    #[must_use]
    pub fn session_max_usage(&self) -> u32 {
        self.session_max_usage
    }

    #[must_use]
    pub fn session_max_errors(&self) -> u32 {
        self.session_max_errors
    }

    #[must_use]
    pub fn default_device(&self) -> DeviceProfile {
        self.default_device
    }

    #[must_use]
    pub fn viewport(&self, device: DeviceProfile) -> Viewport {
        match device {
            DeviceProfile::Mobile => self.mobile_viewport,
            DeviceProfile::Desktop => self.desktop_viewport,
        }
    }

    #[must_use]
    pub fn blocked_url_patterns(&self) -> &[String] {
        &self.blocked_url_patterns
    }

    #[must_use]
    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    /// Step bounds for the video subflow.
    #[must_use]
    pub fn video_timings(&self) -> VideoTimings {
        VideoTimings {
            poster_timeout: Duration::from_secs(self.video_poster_timeout_secs),
            settle_delay: Duration::from_millis(self.video_settle_delay_ms),
            element_timeout: Duration::from_secs(self.video_element_timeout_secs),
            cookie_retry_interval: Duration::from_millis(self.cookie_retry_interval_ms),
            cookie_max_attempts: self.cookie_max_attempts,
        }
    }

    /// Browser launch options; the window follows the default device.
    #[must_use]
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir.clone(),
            proxy_url: self.proxy.url.clone(),
            window: self.viewport(self.default_device),
        }
    }
}
