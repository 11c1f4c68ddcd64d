//! Block-page detection run before any extraction

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use super::failure::{FailureNamespace, HandlerError};
use super::page_timeout::wait_or_absent;
use crate::browser::{BrowserPage, DeviceProfile};
use crate::utils::constants::{
    CAPTCHA_SELECTOR, ERROR_PAGE_TITLE, LOGIN_URL_PATTERN, MOBILE_META_MARKERS,
};

static LOGIN_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(LOGIN_URL_PATTERN).expect("Invalid login URL regex"));

/// Whether a resolved URL is an auth-wall redirect.
#[must_use]
pub fn is_login_redirect(url: &str) -> bool {
    LOGIN_URL_RE.is_match(url)
}

/// Classify a loaded page as blocked, or pass it on.
///
/// # Errors
/// A `Classified` error naming the block; driver failures are `Unclassified`.
pub async fn check_page(
    page: &dyn BrowserPage,
    device: DeviceProfile,
    markers_timeout: Duration,
) -> Result<(), HandlerError> {
    let resolved = page.url().await?;
    if is_login_redirect(&resolved) {
        return Err(HandlerError::classified(
            FailureNamespace::Login,
            format!("redirected to {resolved}"),
        ));
    }

    if page.exists(CAPTCHA_SELECTOR).await {
        return Err(HandlerError::classified(
            FailureNamespace::Captcha,
            "captcha challenge served",
        ));
    }

    if device.is_mobile() {
        for marker in MOBILE_META_MARKERS {
            if !wait_or_absent(page, marker, markers_timeout).await {
                return Err(HandlerError::classified(
                    FailureNamespace::MobileMeta,
                    format!("mobile layout marker `{marker}` missing"),
                ));
            }
        }
    }

    if page.title().await?.as_deref() == Some(ERROR_PAGE_TITLE) {
        return Err(HandlerError::classified(
            FailureNamespace::Internal,
            "platform error page",
        ));
    }

    debug!("Block check passed for {}", resolved);
    Ok(())
}
