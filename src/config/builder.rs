//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! `build()` only exists once both the storage directory and the start URLs
//! have been provided; optional settings can be applied in any state.

use log::warn;
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::CrawlConfig;
use crate::utils::constants::MAX_CONCURRENT_PAGES_LIMIT;

/// Invalid crawl configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one start URL is required")]
    MissingStartUrls,

    #[error("`{0}` must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid proxy URL `{url}`: {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("failed to read input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Type states for the builder
pub struct WithStorageDir;
pub struct WithStartUrl;

pub struct CrawlConfigBuilder<State = ()> {
    /// Settings carried through every state; required fields are filled in
    /// by the transitions.
    pub(crate) config: CrawlConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            config: CrawlConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl CrawlConfigBuilder<()> {
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithStorageDir> {
        self.config.storage_dir = dir.into();
        CrawlConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<WithStorageDir> {
    pub fn start_urls<I, S>(mut self, urls: I) -> CrawlConfigBuilder<WithStartUrl>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.start_urls = urls
            .into_iter()
            .map(Into::into)
            .map(|url: String| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        CrawlConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl CrawlConfigBuilder<WithStartUrl> {
    /// Validate and produce the configuration.
    ///
    /// # Errors
    /// Empty start URLs, a zero timeout, or an unparseable proxy URL.
    pub fn build(self) -> Result<CrawlConfig, ConfigError> {
        let mut config = self.config;

        if config.start_urls.is_empty() {
            return Err(ConfigError::MissingStartUrls);
        }

        for (name, value) in [
            ("request_timeout_secs", config.request_timeout_secs),
            ("page_load_timeout_secs", config.page_load_timeout_secs),
            ("mobile_markers_timeout_secs", config.mobile_markers_timeout_secs),
            ("video_poster_timeout_secs", config.video_poster_timeout_secs),
            ("video_element_timeout_secs", config.video_element_timeout_secs),
            ("checkpoint_interval_secs", config.checkpoint_interval_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }

        let clamped = config
            .max_concurrent_pages
            .clamp(1, MAX_CONCURRENT_PAGES_LIMIT);
        if clamped != config.max_concurrent_pages {
            warn!(
                "max_concurrent_pages {} out of range, using {}",
                config.max_concurrent_pages, clamped
            );
            config.max_concurrent_pages = clamped;
        }
        config.session_max_usage = config.session_max_usage.max(1);
        config.session_max_errors = config.session_max_errors.max(1);

        if let Some(proxy) = config.proxy.url.as_deref() {
            let parsed = Url::parse(proxy).map_err(|e| ConfigError::InvalidProxy {
                url: proxy.to_string(),
                reason: e.to_string(),
            })?;
            if parsed.host_str().is_none() {
                return Err(ConfigError::InvalidProxy {
                    url: proxy.to_string(),
                    reason: "missing host".to_string(),
                });
            }
        }

        Ok(config)
    }
}
