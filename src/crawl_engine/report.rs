//! End-of-run summary

use log::{error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::failure::FailureNamespace;
use super::request_queue::FailedRequest;
use super::worker::RequestOutcome;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub seeds: usize,
    pub unrecognized_seeds: usize,
    /// Seeds whose author was already complete in the restored state
    pub skipped_complete: usize,
    /// Pending video sub-pages re-enqueued from the restored state
    pub resumed_videos: usize,
    pub succeeded: usize,
    pub retried: usize,
    /// Exhausted requests by namespace
    pub failed: BTreeMap<FailureNamespace, usize>,
    pub failed_unclassified: usize,
    pub records_written: usize,
    pub session_rotations: u64,
    pub interrupted: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunReport {
    pub fn record(&mut self, outcome: RequestOutcome) {
        match outcome {
            RequestOutcome::Succeeded(_) => self.succeeded += 1,
            RequestOutcome::Retried(_) => self.retried += 1,
            RequestOutcome::Exhausted(Some(namespace)) => {
                *self.failed.entry(namespace).or_insert(0) += 1;
            }
            RequestOutcome::Exhausted(None) => self.failed_unclassified += 1,
        }
    }

    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.failed.values().sum::<usize>() + self.failed_unclassified
    }

    /// Log every exhausted request, blocks at info and real failures at error.
    pub fn log_failed_requests(failed: &[FailedRequest]) {
        for request in failed {
            match request.namespace {
                Some(namespace) if namespace.is_block() => info!(
                    target: "postcrawl::crawl",
                    "Blocked ({}) after {} retries: {}",
                    namespace, request.task.retry_count, request.task.url
                ),
                _ => error!(
                    target: "postcrawl::crawl",
                    "Failed after {} retries: {}: {}",
                    request.task.retry_count, request.task.url, request.error
                ),
            }
        }
    }

    pub fn log_summary(&self) {
        info!(
            target: "postcrawl::crawl",
            "Run finished in {:.1}s: {} succeeded, {} retried, {} failed, {} records",
            self.elapsed.as_secs_f64(),
            self.succeeded,
            self.retried,
            self.total_failed(),
            self.records_written
        );
        if self.unrecognized_seeds > 0 || self.skipped_complete > 0 || self.resumed_videos > 0 {
            info!(
                target: "postcrawl::crawl",
                "Seeds: {} total, {} unrecognized, {} already complete, {} videos resumed",
                self.seeds, self.unrecognized_seeds, self.skipped_complete, self.resumed_videos
            );
        }
        for (namespace, count) in &self.failed {
            info!(target: "postcrawl::crawl", "  {}: {}", namespace, count);
        }
        if self.interrupted {
            info!(target: "postcrawl::crawl", "Run was interrupted; state is checkpointed for resume");
        }
    }
}
