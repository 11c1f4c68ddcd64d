//! Core types for crawl operations.
//!
//! The top-level crawl error, queued request tasks and their priorities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::browser::DeviceProfile;
use crate::classifier::{ClassifiedUrl, RequestLabel};
use crate::utils::to_mobile_url;

/// Custom error type for crawl operations
#[derive(Debug, Clone)]
pub enum CrawlError {
    /// Configuration error
    ConfigError(String),
    /// Browser error
    BrowserError(String),
    /// State or dataset storage error
    StorageError(String),
    /// Other errors
    Other(String),
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::BrowserError(msg) => write!(f, "Browser error: {msg}"),
            Self::StorageError(msg) => write!(f, "Storage error: {msg}"),
            Self::Other(msg) => write!(f, "Crawl error: {msg}"),
        }
    }
}

impl std::error::Error for CrawlError {}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Queue position for a new task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Back of the queue
    Normal,
    /// Front of the queue
    High,
}

/// One unit of work for a crawl worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTask {
    /// Diagnostics back-reference
    pub id: Uuid,
    pub url: String,
    pub label: RequestLabel,
    pub author_id: String,
    /// Canonical permalink for post and photo requests
    pub canonical_url: Option<String>,
    pub device: DeviceProfile,
    /// Number of retry attempts for this task (0 = first attempt)
    #[serde(default)]
    pub retry_count: u8,
}

impl RequestTask {
    /// Task for a classified seed URL.
    ///
    /// Video seeds carry no post permalink, so they get no canonical URL.
    #[must_use]
    pub fn from_seed(seed: ClassifiedUrl, device: DeviceProfile) -> Self {
        let canonical_url = match seed.label {
            RequestLabel::Post | RequestLabel::Photo => Some(seed.canonical_url),
            RequestLabel::Video => None,
        };
        let url = match seed.label {
            RequestLabel::Video => to_mobile_url(&seed.url),
            RequestLabel::Post | RequestLabel::Photo => seed.url,
        };
        Self {
            id: Uuid::new_v4(),
            url,
            label: seed.label,
            author_id: seed.author_id,
            canonical_url,
            device,
            retry_count: 0,
        }
    }

    /// Video sub-page follow-up for an author; always navigated as mobile.
    #[must_use]
    pub fn video_follow_up(author_id: &str, video_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: video_url.to_string(),
            label: RequestLabel::Video,
            author_id: author_id.to_string(),
            canonical_url: None,
            device: DeviceProfile::Mobile,
            retry_count: 0,
        }
    }

    /// Queue dedupe key.
    #[must_use]
    pub fn unique_key(&self) -> String {
        match self.label {
            RequestLabel::Video => format!("video:{}:{}", self.author_id, self.url),
            label => format!(
                "{}:{}",
                label.as_str().to_lowercase(),
                self.canonical_url.as_deref().unwrap_or(&self.url)
            ),
        }
    }

    /// URL to load for the task's device profile.
    #[must_use]
    pub fn navigation_url(&self) -> String {
        match self.device {
            DeviceProfile::Mobile => to_mobile_url(&self.url),
            DeviceProfile::Desktop => self.url.clone(),
        }
    }
}

impl fmt::Display for RequestTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (author {}, attempt {})",
            self.label,
            self.url,
            self.author_id,
            self.retry_count + 1
        )
    }
}
