//! Crawl run orchestration
//!
//! Coordinates a full run:
//! - State restore and seed planning (resume skips seeds already stored)
//! - Browser lifecycle management
//! - Bounded concurrent request execution
//! - Periodic checkpoints and graceful interruption
//! - Final dataset push

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use super::cleanup::{CleanupResult, cleanup_browser};
use super::crawl_types::{CrawlError, CrawlResult, Priority, RequestTask};
use super::page_processor::HandlerContext;
use super::report::RunReport;
use super::request_queue::RequestQueue;
use super::session_pool::SessionPool;
use super::worker::{WorkerContext, run_request};
use crate::browser::launch_browser;
use crate::classifier::{Classification, RequestLabel, classify};
use crate::config::CrawlConfig;
use crate::page_extractor::PostRecord;
use crate::store::{AggregationStore, DatasetSink, JsonFileStorage, JsonLinesDataset, StateStorage};

/// Seed planning totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedPlan {
    pub enqueued: usize,
    pub unrecognized: usize,
    pub skipped_complete: usize,
    pub resumed_videos: usize,
}

/// Classify seeds and fill the queue, taking restored state into account.
///
/// Pending video sub-pages from the store go first. Seeds whose result the
/// author's record already holds are skipped.
pub fn plan_requests(
    config: &CrawlConfig,
    store: &AggregationStore,
    queue: &RequestQueue,
) -> SeedPlan {
    let mut plan = SeedPlan::default();

    for (author_id, video_url) in store.pending_videos() {
        if queue.enqueue(
            RequestTask::video_follow_up(&author_id, &video_url),
            Priority::High,
        ) {
            plan.resumed_videos += 1;
        }
    }

    for url in config.start_urls() {
        let seed = match classify(url) {
            Classification::Recognized(seed) => seed,
            Classification::Unrecognized { url, reason } => {
                warn!(target: "postcrawl::crawl", "Skipping unrecognized URL {}: {}", url, reason);
                plan.unrecognized += 1;
                continue;
            }
        };
        let task = RequestTask::from_seed(seed, config.default_device());
        if let Some(record) = store.get(&task.author_id)
            && holds_result(&record, &task)
        {
            // Complete, or waiting on a video that was re-enqueued above
            debug!(target: "postcrawl::crawl", "{} already stored for {}, skipping", url, task.author_id);
            plan.skipped_complete += usize::from(record.is_complete());
            continue;
        }
        if queue.enqueue(task, Priority::Normal) {
            plan.enqueued += 1;
        }
    }

    info!(
        target: "postcrawl::crawl",
        "Planned {} seed requests ({} unrecognized, {} complete, {} videos resumed)",
        plan.enqueued, plan.unrecognized, plan.skipped_complete, plan.resumed_videos
    );
    plan
}

/// Whether a restored record already carries what `task` would extract.
fn holds_result(record: &PostRecord, task: &RequestTask) -> bool {
    match task.label {
        RequestLabel::Video => record.videos.iter().any(|video| video.post_url == task.url),
        RequestLabel::Post | RequestLabel::Photo => {
            record.post_url.is_some() && record.post_url == task.canonical_url
        }
    }
}

/// In-process crawl engine for one run
pub struct CrawlRunner {
    config: Arc<CrawlConfig>,
    store: Arc<AggregationStore>,
    state_storage: Box<dyn StateStorage>,
    dataset: Box<dyn DatasetSink>,
}

impl CrawlRunner {
    /// Runner writing state and dataset into the configured storage dir.
    #[must_use]
    pub fn new(config: CrawlConfig) -> Self {
        let state_storage = Box::new(JsonFileStorage::new(config.state_file()));
        let dataset = Box::new(JsonLinesDataset::new(config.dataset_file()));
        Self {
            config: Arc::new(config),
            store: Arc::new(AggregationStore::new()),
            state_storage,
            dataset,
        }
    }

    #[must_use]
    pub fn with_state_storage(mut self, storage: impl StateStorage + 'static) -> Self {
        self.state_storage = Box::new(storage);
        self
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset: impl DatasetSink + 'static) -> Self {
        self.dataset = Box::new(dataset);
        self
    }

    /// Shared store, for inspection while or after a run.
    #[must_use]
    pub fn store(&self) -> Arc<AggregationStore> {
        Arc::clone(&self.store)
    }

    /// Execute the run to completion or interruption.
    ///
    /// # Errors
    /// State restore, browser launch or final dataset failures. Individual
    /// request failures only show up in the report.
    pub async fn run(self) -> CrawlResult<RunReport> {
        let start_time = Instant::now();
        let config = Arc::clone(&self.config);
        let mut report = RunReport {
            seeds: config.start_urls().len(),
            ..RunReport::default()
        };

        self.store
            .load(self.state_storage.as_ref())
            .map_err(|e| CrawlError::StorageError(e.to_string()))?;

        let queue = Arc::new(RequestQueue::new());
        let plan = plan_requests(&config, &self.store, &queue);
        report.unrecognized_seeds = plan.unrecognized;
        report.skipped_complete = plan.skipped_complete;
        report.resumed_videos = plan.resumed_videos;

        if queue.is_empty() {
            info!(target: "postcrawl::crawl", "Nothing to crawl");
        } else {
            self.execute(&queue, &mut report).await?;
        }

        self.store
            .checkpoint(self.state_storage.as_ref())
            .map_err(|e| CrawlError::StorageError(e.to_string()))?;

        let failed = queue.take_failed();
        RunReport::log_failed_requests(&failed);

        let items = self.store.to_dataset();
        report.records_written = items.len();
        self.dataset
            .push(items)
            .map_err(|e| CrawlError::StorageError(e.to_string()))?;

        report.elapsed = start_time.elapsed();
        report.log_summary();
        Ok(report)
    }

    async fn execute(&self, queue: &Arc<RequestQueue>, report: &mut RunReport) -> CrawlResult<()> {
        let config = &self.config;
        let launched = launch_browser(config.launch_options())
            .await
            .map_err(|e| CrawlError::BrowserError(format!("{e:#}")))?;
        let browser = Arc::new(launched.browser);

        let sessions = Arc::new(SessionPool::new(
            config.session_max_usage(),
            config.session_max_errors(),
        ));
        let ctx = Arc::new(WorkerContext {
            browser: Arc::clone(&browser),
            queue: Arc::clone(queue),
            sessions: Arc::clone(&sessions),
            config: Arc::clone(config),
            handler: HandlerContext {
                store: Arc::clone(&self.store),
                video_timings: config.video_timings(),
                mobile_markers_timeout: config.mobile_markers_timeout(),
            },
        });

        // Concurrency control
        let concurrency = config.max_concurrent_pages();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut active_tasks = FuturesUnordered::new();
        let mut last_checkpoint = Instant::now();
        let mut shutting_down = false;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            // Fill up to concurrency limit
            while !shutting_down && active_tasks.len() < concurrency {
                let Some(task) = queue.pop() else {
                    break;
                };
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    error!("Semaphore closed unexpectedly");
                    break;
                };
                let ctx = Arc::clone(&ctx);
                active_tasks.push(tokio::spawn(async move {
                    let _permit = permit; // Hold until task completes
                    run_request(task, ctx).await
                }));
            }

            if active_tasks.is_empty() {
                break;
            }

            tokio::select! {
                next = active_tasks.next() => match next {
                    Some(Ok(outcome)) => report.record(outcome),
                    Some(Err(e)) => error!("Request task panicked: {e}"),
                    None => {}
                },
                _ = &mut ctrl_c, if !shutting_down => {
                    warn!(target: "postcrawl::crawl", "Interrupted, finishing {} in-flight requests", active_tasks.len());
                    shutting_down = true;
                    report.interrupted = true;
                }
            }

            if last_checkpoint.elapsed() >= config.checkpoint_interval() {
                match self.store.checkpoint(self.state_storage.as_ref()) {
                    Ok(count) => debug!(target: "postcrawl::store", "Checkpointed {} records", count),
                    Err(e) => warn!(target: "postcrawl::store", "Checkpoint failed: {}", e),
                }
                last_checkpoint = Instant::now();
            }
        }

        report.session_rotations = sessions.rotations();
        drop(ctx);

        // Close the browser before stopping its handler
        match Arc::try_unwrap(browser) {
            Ok(browser) => match cleanup_browser(browser, launched.handler).await {
                CleanupResult::Success => debug!("Browser cleanup completed"),
                CleanupResult::PartialFailure(errors) => {
                    warn!("Cleanup completed with failures: {errors:?}");
                }
            },
            Err(arc) => {
                warn!(
                    "Browser still has {} strong references, cleanup will happen on drop",
                    Arc::strong_count(&arc)
                );
                launched.handler.abort();
            }
        }
        drop(launched.profile);
        Ok(())
    }
}

/// Run a crawl with the default file-backed state and dataset.
///
/// # Errors
/// See [`CrawlRunner::run`].
pub async fn crawl(config: CrawlConfig) -> CrawlResult<RunReport> {
    CrawlRunner::new(config).run().await
}
