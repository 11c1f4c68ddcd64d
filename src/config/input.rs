//! JSON run input
//!
//! The input file names the seed permalinks and optional overrides:
//!
//! ```json
//! {
//!   "startUrls": ["https://www.facebook.com/alice/posts/1", { "url": "..." }],
//!   "maxConcurrency": 3,
//!   "proxy": { "url": "http://proxy.local:8080" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::builder::{ConfigError, CrawlConfigBuilder, WithStartUrl};
use super::types::{CrawlConfig, ProxyConfig};
use crate::browser::DeviceProfile;

/// Seed given either as a bare string or as `{ "url": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartUrl {
    Plain(String),
    Request { url: String },
}

impl StartUrl {
    #[must_use]
    pub fn into_url(self) -> String {
        match self {
            Self::Plain(url) | Self::Request { url } => url,
        }
    }
}

impl From<String> for StartUrl {
    fn from(url: String) -> Self {
        Self::Plain(url)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlInput {
    #[serde(default)]
    pub start_urls: Vec<StartUrl>,
    pub max_concurrency: Option<usize>,
    pub max_request_retries: Option<u8>,
    pub request_timeout_secs: Option<u64>,
    pub headless: Option<bool>,
    pub device: Option<DeviceProfile>,
    pub proxy: Option<ProxyConfig>,
}

impl CrawlInput {
    /// Read and parse an input file.
    ///
    /// # Errors
    /// `ConfigError::Io` or `ConfigError::Parse`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builder seeded from this input; further overrides can still be applied.
    pub fn into_builder(self, storage_dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithStartUrl> {
        let mut builder = CrawlConfig::builder()
            .storage_dir(storage_dir)
            .start_urls(self.start_urls.into_iter().map(StartUrl::into_url));

        if let Some(pages) = self.max_concurrency {
            builder = builder.max_concurrent_pages(pages);
        }
        if let Some(retries) = self.max_request_retries {
            builder = builder.max_request_retries(retries);
        }
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.request_timeout_secs(secs);
        }
        if let Some(headless) = self.headless {
            builder = builder.headless(headless);
        }
        if let Some(device) = self.device {
            builder = builder.default_device(device);
        }
        if let Some(proxy) = self.proxy {
            builder = builder.proxy(proxy);
        }
        builder
    }
}

impl CrawlConfig {
    /// Load and validate a configuration from a JSON input file.
    ///
    /// # Errors
    /// Unreadable or invalid input, or a failed validation.
    pub fn from_input_file(
        path: &Path,
        storage_dir: impl Into<PathBuf>,
    ) -> Result<CrawlConfig, ConfigError> {
        CrawlInput::from_file(path)?.into_builder(storage_dir).build()
    }
}
