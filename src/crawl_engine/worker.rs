//! One request on one tab
//!
//! A worker leases the current session, opens and prepares a tab, navigates,
//! runs the handler under the request deadline, and settles the outcome with
//! the queue.

use anyhow::anyhow;
use async_trait::async_trait;
use chromiumoxide::Browser;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::crawl_types::{Priority, RequestTask};
use super::failure::{FailureNamespace, HandlerError};
use super::page_enhancer::{clear_cookies, enhance_page};
use super::page_processor::{HandlerContext, handle_failure, handle_request};
use super::page_timeout::with_page_timeout;
use super::request_queue::{RequestQueue, RetryDecision};
use super::session_pool::{SessionLease, SessionPool};
use crate::browser::{BrowserPage, ChromiumPage};
use crate::classifier::RequestLabel;
use crate::config::CrawlConfig;

/// Engine hooks available to a request handler
#[async_trait]
pub trait EngineHandle: Send + Sync {
    /// Queue a derived request. `false` when it was already known.
    async fn enqueue(&self, task: RequestTask, priority: Priority) -> bool;

    /// Burn the session that served this request.
    async fn retire_session(&self);

    /// Close the tab this request ran on.
    async fn close_current_page(&self);
}

/// Production hooks for one request
pub struct WorkerHandle {
    queue: Arc<RequestQueue>,
    sessions: Arc<SessionPool>,
    session_id: u64,
    page: Option<ChromiumPage>,
    closed: AtomicBool,
}

impl WorkerHandle {
    fn new(
        queue: Arc<RequestQueue>,
        sessions: Arc<SessionPool>,
        session_id: u64,
        page: Option<ChromiumPage>,
    ) -> Self {
        Self {
            queue,
            sessions,
            session_id,
            page,
            closed: AtomicBool::new(false),
        }
    }

    /// Close the tab unless a handler already did.
    async fn close_if_open(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(page) = &self.page
            && let Err(e) = page.clone().close().await
        {
            debug!("Failed to close tab: {:#}", e);
        }
    }
}

#[async_trait]
impl EngineHandle for WorkerHandle {
    async fn enqueue(&self, task: RequestTask, priority: Priority) -> bool {
        self.queue.enqueue(task, priority)
    }

    async fn retire_session(&self) {
        self.sessions.retire(self.session_id);
    }

    async fn close_current_page(&self) {
        self.close_if_open().await;
    }
}

/// What became of one dequeued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Succeeded(RequestLabel),
    Retried(Option<FailureNamespace>),
    Exhausted(Option<FailureNamespace>),
}

/// Shared state for all workers of a run
pub struct WorkerContext {
    pub browser: Arc<Browser>,
    pub queue: Arc<RequestQueue>,
    pub sessions: Arc<SessionPool>,
    pub config: Arc<CrawlConfig>,
    pub handler: HandlerContext,
}

/// Run one request to completion and settle it with the queue.
pub async fn run_request(task: RequestTask, ctx: Arc<WorkerContext>) -> RequestOutcome {
    let (handle, result) = match ctx.sessions.acquire() {
        Ok(lease) => attempt(&task, &ctx, lease).await,
        Err(exhausted) => {
            let handle = WorkerHandle::new(
                Arc::clone(&ctx.queue),
                Arc::clone(&ctx.sessions),
                exhausted.id,
                None,
            );
            let error = HandlerError::classified(FailureNamespace::Threshold, exhausted.to_string());
            (handle, Err(error))
        }
    };

    let outcome = match result {
        Ok(()) => RequestOutcome::Succeeded(task.label),
        Err(error) => {
            ctx.sessions.record_error(handle.session_id);
            let error = handle_failure(&handle, &task, error).await;
            let namespace = error.namespace();
            match ctx
                .queue
                .requeue_or_fail(task, &error, ctx.config.max_request_retries())
            {
                RetryDecision::Requeued => RequestOutcome::Retried(namespace),
                RetryDecision::Exhausted => RequestOutcome::Exhausted(namespace),
            }
        }
    };
    handle.close_if_open().await;
    outcome
}

async fn attempt(
    task: &RequestTask,
    ctx: &WorkerContext,
    lease: SessionLease,
) -> (WorkerHandle, Result<(), HandlerError>) {
    let config = &ctx.config;
    let page = match with_page_timeout(
        async {
            ctx.browser
                .new_page("about:blank")
                .await
                .map_err(anyhow::Error::from)
        },
        config.page_load_timeout_secs(),
        "Tab creation",
    )
    .await
    {
        Ok(page) => ChromiumPage::new(page),
        Err(e) => {
            let handle = WorkerHandle::new(
                Arc::clone(&ctx.queue),
                Arc::clone(&ctx.sessions),
                lease.id,
                None,
            );
            return (handle, Err(HandlerError::Unclassified(e)));
        }
    };
    let handle = WorkerHandle::new(
        Arc::clone(&ctx.queue),
        Arc::clone(&ctx.sessions),
        lease.id,
        Some(page.clone()),
    );

    if lease.needs_reset
        && let Err(e) = clear_cookies(page.inner()).await
    {
        warn!("Cookie reset for session {} failed: {:#}", lease.id, e);
    }
    if let Err(e) = enhance_page(
        page.inner(),
        task.device,
        config.viewport(task.device),
        config.blocked_url_patterns(),
    )
    .await
    {
        warn!("Failed to prepare tab for {}: {:#}", task.url, e);
    }

    let request_timeout = config.request_timeout_secs();
    let work = async {
        let url = task.navigation_url();
        with_page_timeout(page.goto(&url), config.page_load_timeout_secs(), "Navigation").await?;
        handle_request(&page, &handle, task, &ctx.handler).await
    };
    let result = match tokio::time::timeout(Duration::from_secs(request_timeout), work).await {
        Ok(result) => result,
        Err(_) => Err(HandlerError::Unclassified(anyhow!(
            "Request timeout after {request_timeout} seconds"
        ))),
    };
    (handle, result)
}
