pub mod browser;
pub mod classifier;
pub mod config;
pub mod crawl_engine;
pub mod page_extractor;
pub mod store;
pub mod utils;

pub use browser::{BrowserPage, ChromiumPage, DeviceProfile, launch_browser};
pub use classifier::{Classification, ClassifiedUrl, RequestLabel, classify};
pub use config::{CrawlConfig, CrawlInput};
pub use crawl_engine::{
    CrawlError, CrawlResult, CrawlRunner, EngineHandle, FailureNamespace, HandlerError, RunReport,
    crawl,
};
pub use page_extractor::schema::*;
pub use store::{AggregationStore, DatasetItem, StoreError};
