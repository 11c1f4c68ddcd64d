//! Browser page abstraction
//!
//! The crawl pipeline only talks to a page through [`BrowserPage`], so block
//! detection, extraction and the video subflow run unchanged against a real
//! Chromium tab or an in-memory fake.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::page::Page;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::page_extractor::js_scripts::query_selector_eval_script;

/// Poll interval for selector waits
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Driver operations the crawl pipeline needs from a loaded page.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and wait for the load event.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait until `selector` matches, up to `timeout`. Absence is `false`, not an error.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool;

    /// Immediate presence probe.
    async fn exists(&self, selector: &str) -> bool {
        self.wait_for_selector(selector, Duration::ZERO).await
    }

    /// Run an element function (`el => ...`) against the first match of `selector`.
    /// `Ok(None)` when nothing matches or the function returns null.
    async fn query_selector_eval(&self, selector: &str, function: &str) -> Result<Option<Value>>;

    /// Evaluate an expression in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Click the first match of `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Current (post-redirect) URL.
    async fn url(&self) -> Result<String>;

    /// Document title, if any.
    async fn title(&self) -> Result<Option<String>>;

    /// Serialized DOM.
    async fn content(&self) -> Result<String>;
}

/// [`BrowserPage`] backed by a chromiumoxide tab
#[derive(Debug, Clone)]
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Underlying CDP page, for emulation and network commands
    #[must_use]
    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// Close the tab.
    pub async fn close(self) -> Result<()> {
        self.page.close().await.context("Failed to close page")
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        self.page
            .wait_for_navigation()
            .await
            .context("Failed to wait for page load")?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if start.elapsed() >= timeout {
                trace!("Selector `{}` absent after {:?}", selector, timeout);
                return false;
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn query_selector_eval(&self, selector: &str, function: &str) -> Result<Option<Value>> {
        let script = query_selector_eval_script(selector, function);
        match self.evaluate(&script).await? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("Failed to evaluate script")?;
        // `undefined` results carry no value
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("Element `{selector}` not found"))?;
        element
            .click()
            .await
            .with_context(|| format!("Failed to click `{selector}`"))?;
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        match self.page.url().await {
            Ok(Some(url)) => Ok(url),
            Ok(None) => {
                trace!("Page URL is None (page not yet navigated)");
                Ok("about:blank".to_string())
            }
            Err(e) => Err(anyhow::anyhow!("Failed to read page URL: {e}")),
        }
    }

    async fn title(&self) -> Result<Option<String>> {
        self.page
            .get_title()
            .await
            .context("Failed to read page title")
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to read page content")
    }
}
