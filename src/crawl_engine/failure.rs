//! Failure classification for crawl requests
//!
//! Handler failures either carry a namespace, which decides whether the
//! browser session is burned, or are unclassified driver/network errors that
//! go straight back to the retry ceiling.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::page_extractor::ExtractionError;

/// Classified failure namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureNamespace {
    /// Anti-bot challenge page
    Captcha,
    /// Mobile layout markers never appeared
    MobileMeta,
    /// Platform's generic error page
    Internal,
    /// Redirected to an auth wall
    Login,
    /// Session exceeded its usage or error budget
    Threshold,
    /// Content region absent after load
    MissingContent,
}

impl FailureNamespace {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Captcha => "captcha",
            Self::MobileMeta => "mobile-meta",
            Self::Internal => "internal",
            Self::Login => "login",
            Self::Threshold => "threshold",
            Self::MissingContent => "missing-content",
        }
    }

    /// Whether this failure burns the browser session and its tab.
    #[must_use]
    pub const fn retires_session(self) -> bool {
        match self {
            Self::Captcha | Self::MobileMeta | Self::Internal | Self::Login | Self::Threshold => {
                true
            }
            Self::MissingContent => false,
        }
    }

    /// Whether the page was a block rather than a layout problem.
    #[must_use]
    pub const fn is_block(self) -> bool {
        self.retires_session()
    }
}

impl fmt::Display for FailureNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the per-request handler
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("[{namespace}] {message}")]
    Classified {
        namespace: FailureNamespace,
        message: String,
    },

    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl HandlerError {
    #[must_use]
    pub fn classified(namespace: FailureNamespace, message: impl Into<String>) -> Self {
        Self::Classified {
            namespace,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<FailureNamespace> {
        match self {
            Self::Classified { namespace, .. } => Some(*namespace),
            Self::Unclassified(_) => None,
        }
    }
}

impl From<ExtractionError> for HandlerError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::MissingContent { .. } => {
                Self::classified(FailureNamespace::MissingContent, err.to_string())
            }
            ExtractionError::Page(e) => Self::Unclassified(e),
        }
    }
}
