//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::CrawlConfigBuilder;
use super::types::ProxyConfig;
use crate::browser::{DeviceProfile, Viewport};

impl<State> CrawlConfigBuilder<State> {
    /// Set browser headless mode. Headed mode needs a display server.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Tabs open at once; clamped to 1-50 at build time.
    #[must_use]
    pub fn max_concurrent_pages(mut self, pages: usize) -> Self {
        self.config.max_concurrent_pages = pages;
        self
    }

    /// Retries after the first attempt. Set to 0 to make every failure final.
    #[must_use]
    pub fn max_request_retries(mut self, retries: u8) -> Self {
        self.config.max_request_retries = retries;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn mobile_markers_timeout_secs(mut self, secs: u64) -> Self {
        self.config.mobile_markers_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn video_poster_timeout_secs(mut self, secs: u64) -> Self {
        self.config.video_poster_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn video_settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.video_settle_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn video_element_timeout_secs(mut self, secs: u64) -> Self {
        self.config.video_element_timeout_secs = secs;
        self
    }

    /// Cookie banner dismissal: pause between clicks and click budget.
    #[must_use]
    pub fn cookie_retry(mut self, interval_ms: u64, max_attempts: u32) -> Self {
        self.config.cookie_retry_interval_ms = interval_ms;
        self.config.cookie_max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn checkpoint_interval_secs(mut self, secs: u64) -> Self {
        self.config.checkpoint_interval_secs = secs;
        self
    }

    /// Session budget before it is reported exhausted.
    #[must_use]
    pub fn session_limits(mut self, max_usage: u32, max_errors: u32) -> Self {
        self.config.session_max_usage = max_usage;
        self.config.session_max_errors = max_errors;
        self
    }

    #[must_use]
    pub fn default_device(mut self, device: DeviceProfile) -> Self {
        self.config.default_device = device;
        self
    }

    #[must_use]
    pub fn viewport(mut self, device: DeviceProfile, viewport: Viewport) -> Self {
        match device {
            DeviceProfile::Mobile => self.config.mobile_viewport = viewport,
            DeviceProfile::Desktop => self.config.desktop_viewport = viewport,
        }
        self
    }

    /// Replace the blocked resource patterns (`*` wildcards).
    #[must_use]
    pub fn blocked_url_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.blocked_url_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = proxy;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.chrome_data_dir = Some(dir.into());
        self
    }
}
