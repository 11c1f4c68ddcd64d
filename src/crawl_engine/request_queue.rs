//! Request queue with dedupe, priorities and a bounded retry ceiling
//!
//! Exhausted requests are kept on a failed list with their last error so the
//! run report can tell blocks from genuine failures.

use dashmap::DashSet;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::crawl_types::{Priority, RequestTask};
use super::failure::{FailureNamespace, HandlerError};

/// Request that exhausted its retries
#[derive(Debug, Clone)]
pub struct FailedRequest {
    pub task: RequestTask,
    pub namespace: Option<FailureNamespace>,
    pub error: String,
}

/// What happened to a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Requeued,
    Exhausted,
}

#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: Mutex<VecDeque<RequestTask>>,
    /// Unique keys ever accepted
    seen: DashSet<String>,
    failed: Mutex<Vec<FailedRequest>>,
}

impl RequestQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task unless its unique key was already accepted.
    pub fn enqueue(&self, task: RequestTask, priority: Priority) -> bool {
        if !self.seen.insert(task.unique_key()) {
            debug!("Skipping duplicate request {}", task.unique_key());
            return false;
        }
        let mut pending = self.pending.lock();
        match priority {
            Priority::High => pending.push_front(task),
            Priority::Normal => pending.push_back(task),
        }
        true
    }

    #[must_use]
    pub fn pop(&self) -> Option<RequestTask> {
        self.pending.lock().pop_front()
    }

    /// Put a failed task back, or move it to the failed list once
    /// `max_retries` retries have been spent.
    pub fn requeue_or_fail(
        &self,
        mut task: RequestTask,
        error: &HandlerError,
        max_retries: u8,
    ) -> RetryDecision {
        if task.retry_count < max_retries {
            task.retry_count += 1;
            debug!(
                "Re-queueing {} (retry {}/{})",
                task.url, task.retry_count, max_retries
            );
            self.pending.lock().push_back(task);
            return RetryDecision::Requeued;
        }

        info!("Giving up on {} after {} retries", task.url, task.retry_count);
        self.failed.lock().push(FailedRequest {
            task,
            namespace: error.namespace(),
            error: format!("{error:#}"),
        });
        RetryDecision::Exhausted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Take the permanently failed requests.
    #[must_use]
    pub fn take_failed(&self) -> Vec<FailedRequest> {
        std::mem::take(&mut *self.failed.lock())
    }
}
