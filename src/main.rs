//! postcrawl command line
//!
//! Reads start URLs from a JSON input file or the command line, runs one
//! crawl, and writes the dataset into the storage directory.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use postcrawl::config::{CrawlConfigBuilder, StartUrl, WithStartUrl};
use postcrawl::{CrawlConfig, CrawlInput, CrawlRunner};

#[derive(Parser, Debug)]
#[command(name = "postcrawl")]
#[command(about = "Crawl social-network post pages into a resumable dataset")]
#[command(version)]
struct Cli {
    /// JSON input file with `startUrls` and optional settings
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Directory for crawl state and the final dataset
    #[arg(long, default_value = "./storage")]
    storage_dir: PathBuf,

    /// Run the browser without a window
    #[arg(long, action = ArgAction::Set)]
    headless: Option<bool>,

    /// Concurrent tabs (1-50)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Retries per request before it is reported as failed
    #[arg(long)]
    max_retries: Option<u8>,

    /// Start URLs, appended after any from the input file
    urls: Vec<String>,
}

impl Cli {
    fn into_builder(self) -> Result<CrawlConfigBuilder<WithStartUrl>> {
        let mut builder = match &self.input {
            Some(path) => {
                let mut input = CrawlInput::from_file(path)
                    .with_context(|| format!("Failed to read input file {}", path.display()))?;
                input
                    .start_urls
                    .extend(self.urls.iter().cloned().map(StartUrl::from));
                input.into_builder(&self.storage_dir)
            }
            None if self.urls.is_empty() => bail!("No start URLs given, pass --input or URLs"),
            None => CrawlConfig::builder()
                .storage_dir(&self.storage_dir)
                .start_urls(self.urls.iter().cloned()),
        };

        if let Some(headless) = self.headless {
            builder = builder.headless(headless);
        }
        if let Some(concurrency) = self.concurrency {
            builder = builder.max_concurrent_pages(concurrency);
        }
        if let Some(retries) = self.max_retries {
            builder = builder.max_request_retries(retries);
        }
        Ok(builder)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("chromiumoxide::handler", log::LevelFilter::Off)
        .filter_module("chromiumoxide::conn", log::LevelFilter::Off)
        .init();

    let config = Cli::parse()
        .into_builder()?
        .build()
        .context("Invalid crawl configuration")?;
    let storage_dir = config.storage_dir().to_path_buf();

    let report = CrawlRunner::new(config)
        .run()
        .await
        .context("Crawl failed")?;

    log::info!(
        "Dataset written to {} ({} records)",
        storage_dir.display(),
        report.records_written
    );
    Ok(())
}
