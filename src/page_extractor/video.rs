//! Video sub-page acquisition
//!
//! Dismisses the cookie banner, activates the poster and reads the playable
//! source. Every step is bounded, and a missing video is a data outcome rather
//! than an error.

use log::{debug, info};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use super::js_scripts::{VIDEO_SOURCE_FN, VISIBILITY_FN};
use crate::browser::BrowserPage;
use crate::crawl_engine::page_timeout::wait_or_absent;
use crate::utils::constants::{
    COOKIE_CONSENT_SELECTOR, VIDEO_PLAYABLE_SELECTOR, VIDEO_POSTER_SELECTOR,
};

/// Bounds for each step of the subflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTimings {
    pub poster_timeout: Duration,
    pub settle_delay: Duration,
    pub element_timeout: Duration,
    pub cookie_retry_interval: Duration,
    pub cookie_max_attempts: u32,
}

/// Why no playable source was recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentReason {
    PosterMissing,
    ActivationFailed,
    NoSource,
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::PosterMissing => "poster control never appeared",
            Self::ActivationFailed => "poster click failed",
            Self::NoSource => "no playable source after activation",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    Found(String),
    Absent(AbsentReason),
}

impl VideoOutcome {
    /// Playable URL, if one was found.
    #[must_use]
    pub fn into_url(self) -> Option<String> {
        match self {
            Self::Found(url) => Some(url),
            Self::Absent(_) => None,
        }
    }
}

/// Recover the playable source of the video on a loaded sub-page.
pub async fn acquire_video(page: &dyn BrowserPage, timings: &VideoTimings) -> VideoOutcome {
    dismiss_cookie_banner(page, timings).await;

    if !wait_or_absent(page, VIDEO_POSTER_SELECTOR, timings.poster_timeout).await {
        return absent(AbsentReason::PosterMissing);
    }

    tokio::time::sleep(timings.settle_delay).await;
    if let Err(e) = page.click(VIDEO_POSTER_SELECTOR).await {
        debug!(target: "postcrawl::video", "Poster activation failed: {:#}", e);
        return absent(AbsentReason::ActivationFailed);
    }

    if !wait_or_absent(page, VIDEO_PLAYABLE_SELECTOR, timings.element_timeout).await {
        return absent(AbsentReason::NoSource);
    }
    match page
        .query_selector_eval(VIDEO_PLAYABLE_SELECTOR, VIDEO_SOURCE_FN)
        .await
    {
        Ok(Some(Value::String(src))) if !src.is_empty() => VideoOutcome::Found(src),
        Ok(_) => absent(AbsentReason::NoSource),
        Err(e) => {
            debug!(target: "postcrawl::video", "Reading video source failed: {:#}", e);
            absent(AbsentReason::NoSource)
        }
    }
}

fn absent(reason: AbsentReason) -> VideoOutcome {
    info!(target: "postcrawl::video", "Video absent: {}", reason);
    VideoOutcome::Absent(reason)
}

/// Click the consent control until it disappears or attempts run out.
async fn dismiss_cookie_banner(page: &dyn BrowserPage, timings: &VideoTimings) {
    for attempt in 1..=timings.cookie_max_attempts {
        if !page.exists(COOKIE_CONSENT_SELECTOR).await {
            return;
        }
        let visible = matches!(
            page.query_selector_eval(COOKIE_CONSENT_SELECTOR, VISIBILITY_FN)
                .await,
            Ok(Some(Value::Bool(true)))
        );
        if !visible {
            return;
        }
        if let Err(e) = page.click(COOKIE_CONSENT_SELECTOR).await {
            debug!(
                target: "postcrawl::video",
                "Cookie banner click {} of {} failed: {:#}",
                attempt, timings.cookie_max_attempts, e
            );
        }
        tokio::time::sleep(timings.cookie_retry_interval).await;
    }
    debug!(target: "postcrawl::video", "Cookie banner still present, continuing");
}
