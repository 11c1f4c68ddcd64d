//! Configuration module for post crawling
//!
//! This module provides the `CrawlConfig` struct, its type-safe builder and
//! the JSON input format the binary reads.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod input;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{ConfigError, CrawlConfigBuilder, WithStartUrl, WithStorageDir};
pub use input::{CrawlInput, StartUrl};
pub use types::{CrawlConfig, ProxyConfig};
