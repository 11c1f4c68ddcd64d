//! Per-request handling
//!
//! Drives one loaded page through block detection, extraction and
//! aggregation:
//!
//! `Dequeued -> BlockCheck -> Extracting -> Aggregating -> (EnqueueFollowUp) -> Done`
//!
//! or `Dequeued -> BlockCheck -> Failed`. Navigation and tab lifecycle belong
//! to the worker; this module only sees a loaded page and the engine hooks.

use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::block_check::check_page;
use super::crawl_types::{Priority, RequestTask};
use super::failure::{FailureNamespace, HandlerError};
use super::worker::EngineHandle;
use crate::browser::BrowserPage;
use crate::classifier::RequestLabel;
use crate::page_extractor::{VideoRef, VideoTimings, acquire_video, extract_post};
use crate::store::AggregationStore;
use crate::utils::safe_truncate_chars;

const LOG_PREVIEW_CHARS: usize = 60;

/// Shared state every request handler needs
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub store: Arc<AggregationStore>,
    pub video_timings: VideoTimings,
    pub mobile_markers_timeout: Duration,
}

/// Position of a request in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Dequeued,
    BlockCheck,
    Extracting,
    Aggregating,
    EnqueueFollowUp,
    Done,
    Failed,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dequeued => "dequeued",
            Self::BlockCheck => "block-check",
            Self::Extracting => "extracting",
            Self::Aggregating => "aggregating",
            Self::EnqueueFollowUp => "enqueue-follow-up",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn transition(task: &RequestTask, state: RequestState) {
    debug!(target: "postcrawl::crawl", "[{}] {} -> {}", task.id, task.url, state);
}

/// Handle one loaded page.
///
/// # Errors
/// Classified block and layout failures, or unclassified driver errors.
pub async fn handle_request(
    page: &dyn BrowserPage,
    engine: &dyn EngineHandle,
    task: &RequestTask,
    ctx: &HandlerContext,
) -> Result<(), HandlerError> {
    transition(task, RequestState::Dequeued);

    transition(task, RequestState::BlockCheck);
    if let Err(e) = check_page(page, task.device, ctx.mobile_markers_timeout).await {
        transition(task, RequestState::Failed);
        return Err(e);
    }

    let result = match task.label {
        RequestLabel::Post | RequestLabel::Photo => handle_post(page, engine, task, ctx).await,
        RequestLabel::Video => {
            handle_video(page, task, ctx).await;
            Ok(())
        }
    };

    match &result {
        Ok(()) => transition(task, RequestState::Done),
        Err(_) => transition(task, RequestState::Failed),
    }
    result
}

async fn handle_post(
    page: &dyn BrowserPage,
    engine: &dyn EngineHandle,
    task: &RequestTask,
    ctx: &HandlerContext,
) -> Result<(), HandlerError> {
    transition(task, RequestState::Extracting);
    let canonical_url = task.canonical_url.as_deref().unwrap_or(&task.url);
    let record = extract_post(page, canonical_url).await?;

    transition(task, RequestState::Aggregating);
    let preview = record
        .post_text
        .as_deref()
        .map(|text| safe_truncate_chars(text, LOG_PREVIEW_CHARS).to_string())
        .unwrap_or_default();
    let mut pending_video = None;
    ctx.store.append(&task.author_id, |existing| {
        let merged = match existing {
            Some(mut current) => {
                current.absorb_post(record);
                current
            }
            None => record,
        };
        pending_video = merged.pending_video_url.clone();
        merged
    });
    info!(
        target: "postcrawl::crawl",
        "Stored post for author {}: {:?}", task.author_id, preview
    );

    if let Some(video_url) = pending_video {
        transition(task, RequestState::EnqueueFollowUp);
        let follow_up = RequestTask::video_follow_up(&task.author_id, &video_url);
        if !engine.enqueue(follow_up, Priority::High).await {
            debug!(target: "postcrawl::crawl", "Video follow-up {} already queued", video_url);
        }
    }
    Ok(())
}

/// Video absence is recorded like success so the record stops waiting on it.
async fn handle_video(page: &dyn BrowserPage, task: &RequestTask, ctx: &HandlerContext) {
    transition(task, RequestState::Extracting);
    let outcome = acquire_video(page, &ctx.video_timings).await;

    transition(task, RequestState::Aggregating);
    let video = VideoRef {
        post_url: task.url.clone(),
        url: outcome.into_url(),
    };
    let found = video.url.is_some();
    ctx.store.append(&task.author_id, move |existing| {
        let mut record = existing.unwrap_or_default();
        record.resolve_video(video);
        record
    });
    info!(
        target: "postcrawl::crawl",
        "Resolved video for author {} (source found: {})", task.author_id, found
    );
}

/// Log a failed request and burn its session when the namespace calls for it.
///
/// The error is handed back unchanged for the retry decision.
pub async fn handle_failure(
    engine: &dyn EngineHandle,
    task: &RequestTask,
    error: HandlerError,
) -> HandlerError {
    match error.namespace() {
        Some(FailureNamespace::Login) => {
            warn!(
                target: "postcrawl::crawl",
                "{} hit the login wall, expected to keep failing: {}", task, error
            );
        }
        Some(_) => warn!(target: "postcrawl::crawl", "{} failed: {}", task, error),
        None => warn!(target: "postcrawl::crawl", "{} failed unclassified: {:#}", task, error),
    }

    if error.namespace().is_some_and(FailureNamespace::retires_session) {
        engine.retire_session().await;
        engine.close_current_page().await;
    }
    error
}
