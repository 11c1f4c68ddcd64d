//! Crawl Engine Module
//!
//! Request planning, per-tab workers, block classification, session
//! rotation and run orchestration.

// Sub-modules
pub mod block_check;
pub mod cleanup;
pub mod crawl_types;
pub mod failure;
pub mod orchestrator;
pub mod page_enhancer;
pub mod page_processor;
pub mod page_timeout;
pub mod report;
pub mod request_queue;
pub mod session_pool;
pub mod worker;

// Re-export orchestration types
pub use orchestrator::{CrawlRunner, SeedPlan, crawl, plan_requests};
pub use report::RunReport;

// Re-export crawl types
pub use crawl_types::{CrawlError, CrawlResult, Priority, RequestTask};
pub use failure::{FailureNamespace, HandlerError};

// Re-export request handling
pub use block_check::{check_page, is_login_redirect};
pub use page_processor::{HandlerContext, RequestState, handle_failure, handle_request};
pub use page_timeout::{wait_or_absent, with_page_timeout};
pub use request_queue::{FailedRequest, RequestQueue, RetryDecision};
pub use session_pool::{SessionExhausted, SessionLease, SessionPool};
pub use worker::{EngineHandle, RequestOutcome, WorkerContext, WorkerHandle, run_request};
