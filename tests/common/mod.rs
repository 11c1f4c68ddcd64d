//! Shared fakes and fixtures for the postcrawl test suite

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use postcrawl::crawl_engine::{EngineHandle, HandlerContext, Priority, RequestTask};
use postcrawl::page_extractor::VideoTimings;
use postcrawl::store::AggregationStore;
use postcrawl::utils::constants::MOBILE_META_MARKERS;
use postcrawl::BrowserPage;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const POST_URL: &str = "https://www.facebook.com/alice/posts/123";
pub const MOBILE_POST_URL: &str = "https://m.facebook.com/alice/posts/123";
pub const VIDEO_PAGE_URL: &str = "https://m.facebook.com/alice/videos/555/";
pub const VIDEO_SOURCE: &str = "https://video.xx.fbcdn.net/v/t42/clip.mp4?oh=1";

/// Install a test subscriber once; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory page: a fixed set of matching selectors plus scripted answers.
#[derive(Default)]
pub struct FakePage {
    url: String,
    title: Option<String>,
    html: String,
    present: Mutex<HashSet<String>>,
    /// Selectors that start matching once the key is clicked
    reveals: HashMap<String, Vec<String>>,
    element_results: HashMap<String, Value>,
    inline_scripts: Option<Value>,
    clicks: Mutex<Vec<String>>,
}

impl FakePage {
    /// Well-formed mobile page at `url` with no content.
    pub fn mobile(url: &str) -> Self {
        let page = Self {
            url: url.to_string(),
            inline_scripts: Some(Value::Array(Vec::new())),
            ..Self::default()
        };
        MOBILE_META_MARKERS
            .iter()
            .fold(page, |page, marker| page.with_selector(marker))
    }

    /// Post page serving `html` and the given inline scripts.
    pub fn post(html: &str, scripts: &[&str]) -> Self {
        Self::mobile(MOBILE_POST_URL)
            .with_html(html)
            .with_inline_scripts(scripts)
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_selector(self, selector: &str) -> Self {
        self.present.lock().insert(selector.to_string());
        self
    }

    pub fn without_selector(self, selector: &str) -> Self {
        self.present.lock().remove(selector);
        self
    }

    pub fn revealing_on_click(mut self, clicked: &str, revealed: &str) -> Self {
        self.reveals
            .entry(clicked.to_string())
            .or_default()
            .push(revealed.to_string());
        self
    }

    pub fn with_element_result(mut self, selector: &str, value: Value) -> Self {
        self.element_results.insert(selector.to_string(), value);
        self
    }

    pub fn with_inline_scripts(mut self, scripts: &[&str]) -> Self {
        self.inline_scripts = Some(Value::Array(
            scripts.iter().map(|s| Value::String((*s).to_string())).collect(),
        ));
        self
    }

    /// Make the inline-script evaluation fail.
    pub fn with_failing_scripts(mut self) -> Self {
        self.inline_scripts = None;
        self
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().clone()
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> bool {
        self.present.lock().contains(selector)
    }

    async fn query_selector_eval(&self, selector: &str, _function: &str) -> Result<Option<Value>> {
        if !self.present.lock().contains(selector) {
            return Ok(None);
        }
        Ok(self.element_results.get(selector).cloned())
    }

    async fn evaluate(&self, _script: &str) -> Result<Value> {
        self.inline_scripts
            .clone()
            .ok_or_else(|| anyhow!("Execution context was destroyed"))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut present = self.present.lock();
        if !present.contains(selector) {
            return Err(anyhow!("No element matches {selector}"));
        }
        self.clicks.lock().push(selector.to_string());
        if let Some(revealed) = self.reveals.get(selector) {
            present.extend(revealed.iter().cloned());
        }
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn title(&self) -> Result<Option<String>> {
        Ok(self.title.clone())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html.clone())
    }
}

/// Engine hooks that only record what the handler asked for
#[derive(Default)]
pub struct RecordingEngine {
    enqueued: Mutex<Vec<(RequestTask, Priority)>>,
    retired: AtomicUsize,
    closed: AtomicUsize,
}

impl RecordingEngine {
    pub fn enqueued(&self) -> Vec<(RequestTask, Priority)> {
        self.enqueued.lock().clone()
    }

    pub fn retired(&self) -> usize {
        self.retired.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineHandle for RecordingEngine {
    async fn enqueue(&self, task: RequestTask, priority: Priority) -> bool {
        self.enqueued.lock().push((task, priority));
        true
    }

    async fn retire_session(&self) {
        self.retired.fetch_add(1, Ordering::SeqCst);
    }

    async fn close_current_page(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn fast_timings() -> VideoTimings {
    VideoTimings {
        poster_timeout: Duration::from_millis(20),
        settle_delay: Duration::ZERO,
        element_timeout: Duration::from_millis(20),
        cookie_retry_interval: Duration::from_millis(1),
        cookie_max_attempts: 3,
    }
}

pub fn handler_context(store: Arc<AggregationStore>) -> HandlerContext {
    HandlerContext {
        store,
        video_timings: fast_timings(),
        mobile_markers_timeout: Duration::from_millis(20),
    }
}

/// Mobile post page with header, timestamp, two paragraphs, a lightbox
/// image, an outbound link card and an inline video.
pub const POST_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Alice Example</title></head>
<body>
<div id="viewport"><div id="objects_container">
<div class="story_body_container">
  <header>
    <a href="/alice">Alice Example</a>
    <i role="img" style="background-image: url('https\3a //scontent.xx.fbcdn.net/v/avatar.jpg');"></i>
  </header>
  <abbr data-store='{"time":1700000000}'>14 Nov</abbr>
  <p>First paragraph</p>
  <p>Second paragraph</p>
  <a href="/photo.php?fbid=9&amp;id=alice" data-sigil="photo-image"><img src="https://scontent.xx.fbcdn.net/v/p1.jpg"></a>
  <a href="https://lm.facebook.com/l.php?u=https%3A%2F%2Fexample.org%2Farticle&amp;h=AT0" aria-label="Read the article">
    <img src="https://external.xx.fbcdn.net/thumb.jpg">
    <h3>Article title</h3>
    <span class="domain">example.org</span>
  </a>
  <div class="media">
    <div data-sigil="inlineVideo"></div>
    <a href="/alice/videos/555/?refsrc=timeline#comments">Open video</a>
  </div>
</div>
</div></div>
</body>
</html>"#;

/// Post page with text only.
pub const TEXT_ONLY_HTML: &str = r#"<html><body>
<div class="story_body_container">
  <header><a href="/bob">Bob</a></header>
  <p>Just words</p>
</div>
</body></html>"#;

/// Page whose content region is missing.
pub const EMPTY_LAYOUT_HTML: &str = r#"<html><body><div id="root"></div></body></html>"#;

/// Inline script carrying counters and a reaction breakdown for `POST_URL`.
pub const STATS_SCRIPT: &str = r#"{"story":"https:\/\/www.facebook.com\/alice\/posts\/123","comment_count":{"total_count":7},"reaction_count":{"count":42},"share_count":{"count":3},"top_reactions":{"edges":[{"node":{"reaction_type":"LIKE"},"reaction_count":40},{"node":{"reaction_type":"HAHA"},"reaction_count":2}]}}"#;
