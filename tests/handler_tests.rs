//! Request handler scenarios against in-memory pages

use postcrawl::classifier::classify;
use postcrawl::crawl_engine::{
    FailureNamespace, Priority, RequestTask, handle_failure, handle_request,
};
use postcrawl::page_extractor::{PostRecord, PostStats, VideoRef};
use postcrawl::store::AggregationStore;
use postcrawl::utils::constants::{
    CAPTCHA_SELECTOR, MOBILE_META_MARKERS, VIDEO_PLAYABLE_SELECTOR, VIDEO_POSTER_SELECTOR,
};
use postcrawl::{DeviceProfile, RequestLabel};
use serde_json::json;
use std::sync::Arc;

mod common;
use common::*;

fn post_task() -> RequestTask {
    let seed = classify(POST_URL).recognized().unwrap();
    RequestTask::from_seed(seed, DeviceProfile::Mobile)
}

fn video_task() -> RequestTask {
    RequestTask::video_follow_up("alice", VIDEO_PAGE_URL)
}

fn video_page() -> FakePage {
    FakePage::mobile(VIDEO_PAGE_URL)
        .with_selector(VIDEO_POSTER_SELECTOR)
        .revealing_on_click(VIDEO_POSTER_SELECTOR, VIDEO_PLAYABLE_SELECTOR)
        .with_element_result(VIDEO_PLAYABLE_SELECTOR, json!(VIDEO_SOURCE))
}

#[tokio::test]
async fn test_post_with_video_stores_record_and_enqueues_follow_up() {
    init_logging();
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = FakePage::post(POST_HTML, &[STATS_SCRIPT]);

    handle_request(&page, &engine, &post_task(), &ctx)
        .await
        .unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.post_url.as_deref(), Some(POST_URL));
    assert_eq!(record.author_name.as_deref(), Some("Alice Example"));
    assert_eq!(
        record.author_avatar.as_deref(),
        Some("https://scontent.xx.fbcdn.net/v/avatar.jpg")
    );
    assert_eq!(record.post_date.as_deref(), Some("2023-11-14T22:13:20Z"));
    assert_eq!(
        record.post_text.as_deref(),
        Some("First paragraph\nSecond paragraph")
    );

    assert_eq!(record.images.len(), 1);
    assert_eq!(record.images[0].src, "https://scontent.xx.fbcdn.net/v/p1.jpg");
    assert_eq!(
        record.images[0].link,
        "https://m.facebook.com/photo.php?fbid=9&id=alice"
    );

    assert_eq!(record.links.len(), 1);
    let link = &record.links[0];
    assert_eq!(link.url, "https://example.org/article");
    assert_eq!(link.title.as_deref(), Some("Article title"));
    assert_eq!(link.domain.as_deref(), Some("example.org"));
    assert_eq!(link.text.as_deref(), Some("Read the article"));
    assert_eq!(
        link.thumbnail.as_deref(),
        Some("https://external.xx.fbcdn.net/thumb.jpg")
    );

    assert_eq!(record.stats.comments, 7);
    assert_eq!(record.stats.reactions, 42);
    assert_eq!(record.stats.shares, 3);
    assert_eq!(record.stats.reaction_types.get("like"), Some(&40));
    assert_eq!(record.stats.reaction_types.get("haha"), Some(&2));

    assert_eq!(record.pending_video_url.as_deref(), Some(VIDEO_PAGE_URL));
    assert!(!store.is_complete("alice"));

    let enqueued = engine.enqueued();
    assert_eq!(enqueued.len(), 1);
    let (follow_up, priority) = &enqueued[0];
    assert_eq!(*priority, Priority::High);
    assert_eq!(follow_up.label, RequestLabel::Video);
    assert_eq!(follow_up.author_id, "alice");
    assert_eq!(follow_up.url, VIDEO_PAGE_URL);
    assert_eq!(follow_up.device, DeviceProfile::Mobile);
    assert_eq!(engine.retired(), 0);
}

#[tokio::test]
async fn test_post_without_video_is_complete_and_enqueues_nothing() {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = FakePage::post(TEXT_ONLY_HTML, &[]);
    let task = RequestTask::from_seed(
        classify("https://www.facebook.com/bob/posts/7")
            .recognized()
            .unwrap(),
        DeviceProfile::Mobile,
    );

    handle_request(&page, &engine, &task, &ctx).await.unwrap();

    assert!(store.is_complete("bob"));
    assert!(engine.enqueued().is_empty());
    let record = store.snapshot().remove("bob").unwrap();
    assert_eq!(record.post_text.as_deref(), Some("Just words"));
    assert_eq!(record.author_name.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn test_video_found_resolves_pending_record() {
    let store = Arc::new(AggregationStore::new());
    store.write(
        "alice",
        PostRecord {
            post_url: Some(POST_URL.to_string()),
            pending_video_url: Some(VIDEO_PAGE_URL.to_string()),
            ..PostRecord::default()
        },
    );
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = video_page();

    handle_request(&page, &engine, &video_task(), &ctx)
        .await
        .unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.pending_video_url, None);
    assert_eq!(record.post_url.as_deref(), Some(POST_URL));
    assert_eq!(
        record.videos,
        vec![VideoRef {
            post_url: VIDEO_PAGE_URL.to_string(),
            url: Some(VIDEO_SOURCE.to_string()),
        }]
    );
    assert_eq!(page.clicks(), vec![VIDEO_POSTER_SELECTOR.to_string()]);
    assert!(engine.enqueued().is_empty());
}

#[tokio::test]
async fn test_video_absent_still_clears_pending() {
    let store = Arc::new(AggregationStore::new());
    store.write(
        "alice",
        PostRecord {
            pending_video_url: Some(VIDEO_PAGE_URL.to_string()),
            ..PostRecord::default()
        },
    );
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = FakePage::mobile(VIDEO_PAGE_URL);

    handle_request(&page, &engine, &video_task(), &ctx)
        .await
        .unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert!(record.is_complete());
    assert_eq!(record.videos.len(), 1);
    assert_eq!(record.videos[0].url, None);
    assert_eq!(engine.retired(), 0);
}

#[tokio::test]
async fn test_video_for_unknown_author_creates_record() {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();

    handle_request(&video_page(), &engine, &video_task(), &ctx)
        .await
        .unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.videos[0].url.as_deref(), Some(VIDEO_SOURCE));
    assert_eq!(record.post_text, None);
}

#[tokio::test]
async fn test_cookie_banner_is_dismissed_before_activation() {
    use postcrawl::utils::constants::COOKIE_CONSENT_SELECTOR;

    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = video_page()
        .with_selector(COOKIE_CONSENT_SELECTOR)
        .with_element_result(COOKIE_CONSENT_SELECTOR, json!(true));

    handle_request(&page, &engine, &video_task(), &ctx)
        .await
        .unwrap();

    let clicks = page.clicks();
    assert_eq!(clicks.first().map(String::as_str), Some(COOKIE_CONSENT_SELECTOR));
    assert_eq!(clicks.last().map(String::as_str), Some(VIDEO_POSTER_SELECTOR));
    // The banner never goes away here, so every attempt clicks it
    assert_eq!(clicks.len(), 4);
}

async fn assert_block_retires(page: FakePage, expected: FailureNamespace) {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let task = post_task();

    let error = handle_request(&page, &engine, &task, &ctx)
        .await
        .unwrap_err();
    assert_eq!(error.namespace(), Some(expected));

    let error = handle_failure(&engine, &task, error).await;
    assert_eq!(error.namespace(), Some(expected));
    assert_eq!(engine.retired(), 1);
    assert_eq!(engine.closed(), 1);
    assert!(store.is_empty());
    assert!(engine.enqueued().is_empty());
}

#[tokio::test]
async fn test_captcha_retires_session() {
    let page = FakePage::post(POST_HTML, &[]).with_selector(CAPTCHA_SELECTOR);
    assert_block_retires(page, FailureNamespace::Captcha).await;
}

#[tokio::test]
async fn test_login_redirect_retires_session() {
    let page = FakePage::mobile("https://m.facebook.com/login.php?next=%2Falice%2Fposts%2F123")
        .with_html(POST_HTML);
    assert_block_retires(page, FailureNamespace::Login).await;
}

#[tokio::test]
async fn test_missing_mobile_markers_retire_session() {
    let page = FakePage::post(POST_HTML, &[]).without_selector(MOBILE_META_MARKERS[1]);
    assert_block_retires(page, FailureNamespace::MobileMeta).await;
}

#[tokio::test]
async fn test_error_page_retires_session() {
    let page = FakePage::post(POST_HTML, &[]).with_title("Error");
    assert_block_retires(page, FailureNamespace::Internal).await;
}

#[tokio::test]
async fn test_desktop_requests_skip_mobile_markers() {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = FakePage::post(TEXT_ONLY_HTML, &[])
        .without_selector(MOBILE_META_MARKERS[0])
        .without_selector(MOBILE_META_MARKERS[1]);
    let task = RequestTask::from_seed(
        classify("https://www.facebook.com/bob/posts/7")
            .recognized()
            .unwrap(),
        DeviceProfile::Desktop,
    );

    handle_request(&page, &engine, &task, &ctx).await.unwrap();
    assert!(store.contains("bob"));
}

#[tokio::test]
async fn test_missing_content_fails_without_retiring() {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = FakePage::post(EMPTY_LAYOUT_HTML, &[STATS_SCRIPT]);
    let task = post_task();

    let error = handle_request(&page, &engine, &task, &ctx)
        .await
        .unwrap_err();
    assert_eq!(error.namespace(), Some(FailureNamespace::MissingContent));

    let error = handle_failure(&engine, &task, error).await;
    assert_eq!(error.namespace(), Some(FailureNamespace::MissingContent));
    assert_eq!(engine.retired(), 0);
    assert_eq!(engine.closed(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_stats_failure_defaults_to_zero() {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let page = FakePage::post(POST_HTML, &[STATS_SCRIPT]).with_failing_scripts();

    handle_request(&page, &engine, &post_task(), &ctx)
        .await
        .unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.stats, PostStats::default());
    assert_eq!(record.author_name.as_deref(), Some("Alice Example"));
    assert!(record.pending_video_url.is_some());
}

#[tokio::test]
async fn test_post_after_video_keeps_resolved_video() {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let video_seed = RequestTask::from_seed(
        classify("https://www.facebook.com/alice/videos/555")
            .recognized()
            .unwrap(),
        DeviceProfile::Mobile,
    );

    handle_request(&video_page(), &engine, &video_seed, &ctx)
        .await
        .unwrap();
    handle_request(&FakePage::post(POST_HTML, &[STATS_SCRIPT]), &engine, &post_task(), &ctx)
        .await
        .unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.videos.len(), 1);
    assert_eq!(record.videos[0].url.as_deref(), Some(VIDEO_SOURCE));
    assert_eq!(record.post_url.as_deref(), Some(POST_URL));
    assert_eq!(record.author_name.as_deref(), Some("Alice Example"));
    assert_eq!(record.stats.reactions, 42);
    assert!(record.is_complete());
    assert!(engine.enqueued().is_empty());
}

#[tokio::test]
async fn test_second_post_for_author_merges_into_first() {
    let store = Arc::new(AggregationStore::new());
    let ctx = handler_context(Arc::clone(&store));
    let engine = RecordingEngine::default();
    let second = RequestTask::from_seed(
        classify("https://www.facebook.com/alice/posts/124")
            .recognized()
            .unwrap(),
        DeviceProfile::Mobile,
    );

    handle_request(&FakePage::post(POST_HTML, &[STATS_SCRIPT]), &engine, &post_task(), &ctx)
        .await
        .unwrap();
    handle_request(&FakePage::post(TEXT_ONLY_HTML, &[]), &engine, &second, &ctx)
        .await
        .unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.post_url.as_deref(), Some(POST_URL));
    assert_eq!(
        record.post_text.as_deref(),
        Some("First paragraph\nSecond paragraph")
    );
    assert_eq!(record.pending_video_url.as_deref(), Some(VIDEO_PAGE_URL));
    assert_eq!(record.stats.reactions, 42);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_video_results_keep_one_video_per_author() {
    let store = Arc::new(AggregationStore::new());
    let authors: Vec<String> = (0..16).map(|n| format!("author{n}")).collect();

    let handles: Vec<_> = authors
        .iter()
        .flat_map(|author| {
            ["555", "556"].map(|id| {
                (
                    author.clone(),
                    format!("https://m.facebook.com/{author}/videos/{id}/"),
                )
            })
        })
        .map(|(author, sub_page)| {
            let ctx = handler_context(Arc::clone(&store));
            tokio::spawn(async move {
                let engine = RecordingEngine::default();
                let page = FakePage::mobile(&sub_page)
                    .with_selector(VIDEO_POSTER_SELECTOR)
                    .revealing_on_click(VIDEO_POSTER_SELECTOR, VIDEO_PLAYABLE_SELECTOR)
                    .with_element_result(VIDEO_PLAYABLE_SELECTOR, json!(VIDEO_SOURCE));
                let task = RequestTask::video_follow_up(&author, &sub_page);
                handle_request(&page, &engine, &task, &ctx).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.len(), authors.len());
    for (author, record) in store.snapshot() {
        assert_eq!(record.videos.len(), 1, "{author} should hold one video");
        assert_eq!(record.videos[0].url.as_deref(), Some(VIDEO_SOURCE));
        assert!(record.is_complete());
    }
}
