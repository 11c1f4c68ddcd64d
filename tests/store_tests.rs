//! Aggregation store, state persistence and dataset output

use postcrawl::page_extractor::{ImageRef, LinkRef, PostRecord, PostStats, VideoRef};
use postcrawl::store::{
    AggregationStore, DatasetItem, DatasetSink, JsonFileStorage, JsonLinesDataset, StoreError,
};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

fn image(n: usize) -> ImageRef {
    ImageRef {
        link: format!("https://m.facebook.com/photo.php?fbid={n}"),
        src: format!("https://scontent.xx.fbcdn.net/v/{n}.jpg"),
    }
}

fn sample_record() -> PostRecord {
    let mut record = PostRecord {
        author_name: Some("Alice Example".to_string()),
        post_url: Some("https://www.facebook.com/alice/posts/123".to_string()),
        post_date: Some("2023-11-14T22:13:20Z".to_string()),
        post_text: Some("Hello".to_string()),
        pending_video_url: Some("https://m.facebook.com/alice/videos/555/".to_string()),
        stats: PostStats {
            reactions: 42,
            shares: 3,
            comments: 7,
            reaction_types: BTreeMap::from([("like".to_string(), 40)]),
        },
        ..PostRecord::default()
    };
    record.push_image(image(1));
    record.push_link(LinkRef {
        title: Some("Article".to_string()),
        ..LinkRef::new("https://example.org/article")
    });
    record
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_lose_no_update() {
    let store = Arc::new(AggregationStore::new());
    let mut handles = Vec::new();
    for n in 0..64 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.append("alice", |existing| {
                let mut record = existing.unwrap_or_default();
                record.push_image(image(n));
                record
            });
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.images.len(), 64);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_write_replaces_and_append_merges() {
    let store = AggregationStore::new();
    store.write("alice", sample_record());
    store.append("alice", |existing| {
        let mut record = existing.unwrap();
        record.resolve_video(VideoRef {
            post_url: "https://m.facebook.com/alice/videos/555/".to_string(),
            url: None,
        });
        record
    });
    assert!(store.is_complete("alice"));
    assert!(store.pending_videos().is_empty());

    store.write("alice", PostRecord::default());
    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record, PostRecord::default());
}

#[test]
fn test_checkpoint_and_reload_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(temp_dir.path().join("state").join("crawl_state.json"));

    let store = AggregationStore::new();
    store.write("alice", sample_record());
    store.write("bob", PostRecord::default());
    assert_eq!(store.checkpoint(&storage).unwrap(), 2);
    assert!(storage.path().exists());

    let restored = AggregationStore::new();
    assert_eq!(restored.load(&storage).unwrap(), 2);
    assert_eq!(restored.snapshot(), store.snapshot());
    assert_eq!(
        restored.pending_videos(),
        vec![(
            "alice".to_string(),
            "https://m.facebook.com/alice/videos/555/".to_string()
        )]
    );
}

#[test]
fn test_load_without_state_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(temp_dir.path().join("crawl_state.json"));
    let store = AggregationStore::new();
    assert_eq!(store.load(&storage).unwrap(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_corrupt_state_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("crawl_state.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = AggregationStore::new();
    let err = store.load(&JsonFileStorage::new(&path)).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[test]
fn test_load_merges_into_existing_records() {
    let temp_dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(temp_dir.path().join("crawl_state.json"));
    let persisted = AggregationStore::new();
    persisted.write("alice", sample_record());
    persisted.checkpoint(&storage).unwrap();

    let store = AggregationStore::new();
    store.write(
        "alice",
        PostRecord {
            author_name: Some("Alice".to_string()),
            ..PostRecord::default()
        },
    );
    store.load(&storage).unwrap();

    let record = store.snapshot().remove("alice").unwrap();
    assert_eq!(record.author_name.as_deref(), Some("Alice"));
    assert_eq!(record.post_text.as_deref(), Some("Hello"));
    assert_eq!(record.stats.reactions, 42);
}

#[test]
fn test_dataset_is_one_json_object_per_line() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = JsonLinesDataset::new(temp_dir.path().join("dataset.jsonl"));

    let store = AggregationStore::new();
    store.write("bob", PostRecord::default());
    store.write("alice", sample_record());
    dataset.push(store.to_dataset()).unwrap();

    let written = std::fs::read_to_string(dataset.path()).unwrap();
    let items: Vec<DatasetItem> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].author_id, "alice");
    assert_eq!(items[1].author_id, "bob");
    assert_eq!(items[0].record, sample_record());
    assert_eq!(items[0].schema_version, 1);

    let first: serde_json::Value = serde_json::from_str(written.lines().next().unwrap()).unwrap();
    assert_eq!(first["authorId"], "alice");
    assert_eq!(first["postText"], "Hello");
    assert_eq!(first["stats"]["reactionTypes"]["like"], 40);
}

fn optional_text() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z]{1,8}")
}

fn link_ref() -> impl Strategy<Value = LinkRef> {
    (optional_text(), optional_text(), optional_text(), optional_text()).prop_map(
        |(thumbnail, domain, title, text)| LinkRef {
            url: "https://example.org/a".to_string(),
            thumbnail,
            domain,
            title,
            text,
        },
    )
}

fn filled(link: &LinkRef) -> [bool; 4] {
    [
        link.thumbnail.is_some(),
        link.domain.is_some(),
        link.title.is_some(),
        link.text.is_some(),
    ]
}

proptest! {
    #[test]
    fn link_merge_fills_the_same_fields_in_either_order(a in link_ref(), b in link_ref()) {
        let mut ab = a.clone();
        ab.merge_from(b.clone());
        let mut ba = b.clone();
        ba.merge_from(a.clone());
        prop_assert_eq!(filled(&ab), filled(&ba));
    }

    #[test]
    fn link_merge_never_overwrites(a in link_ref(), b in link_ref()) {
        let mut merged = a.clone();
        merged.merge_from(b);
        for (before, after) in [
            (&a.thumbnail, &merged.thumbnail),
            (&a.domain, &merged.domain),
            (&a.title, &merged.title),
            (&a.text, &merged.text),
        ] {
            if before.is_some() {
                prop_assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn link_merge_is_idempotent(a in link_ref(), b in link_ref()) {
        let mut once = a.clone();
        once.merge_from(b.clone());
        let mut twice = once.clone();
        twice.merge_from(b);
        prop_assert_eq!(once, twice);
    }
}
