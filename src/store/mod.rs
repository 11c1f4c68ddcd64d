//! Per-author aggregation store
//!
//! One record per author identity, shared by every worker through an `Arc`.
//! `write` and `append` are the only mutators; `append` runs its merge under
//! the entry's shard lock so concurrent merges for one author never lose an
//! update.

pub mod dataset;
pub mod storage;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use dataset::{DatasetItem, DatasetSink, JsonLinesDataset};
pub use storage::{JsonFileStorage, StateStorage};

use crate::page_extractor::PostRecord;

/// Storage and dataset failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct AggregationStore {
    records: DashMap<String, PostRecord>,
}

impl AggregationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `author_id`.
    pub fn write(&self, author_id: &str, record: PostRecord) {
        self.records.insert(author_id.to_string(), record);
    }

    /// Atomically merge into the record for `author_id`.
    ///
    /// `merge` receives the current record (if any) and returns its
    /// replacement; the shard stays locked for the duration.
    pub fn append<F>(&self, author_id: &str, merge: F)
    where
        F: FnOnce(Option<PostRecord>) -> PostRecord,
    {
        match self.records.entry(author_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let current = std::mem::take(entry.get_mut());
                *entry.get_mut() = merge(Some(current));
            }
            Entry::Vacant(entry) => {
                entry.insert(merge(None));
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, author_id: &str) -> bool {
        self.records.contains_key(author_id)
    }

    /// Copy of the record for `author_id`.
    #[must_use]
    pub fn get(&self, author_id: &str) -> Option<PostRecord> {
        self.records.get(author_id).map(|entry| entry.value().clone())
    }

    /// Whether `author_id` has a record with nothing left to resolve.
    #[must_use]
    pub fn is_complete(&self, author_id: &str) -> bool {
        self.records
            .get(author_id)
            .is_some_and(|record| record.is_complete())
    }

    /// `(author_id, video sub-page)` for every unresolved video.
    #[must_use]
    pub fn pending_videos(&self) -> Vec<(String, String)> {
        let mut pending: Vec<(String, String)> = self
            .records
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .pending_video_url
                    .clone()
                    .map(|url| (entry.key().clone(), url))
            })
            .collect();
        pending.sort();
        pending
    }

    /// Ordered copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, PostRecord> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Restore persisted state, merging into any records already present.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn load(&self, storage: &dyn StateStorage) -> Result<usize, StoreError> {
        let Some(state) = storage.load()? else {
            return Ok(0);
        };
        let restored = state.len();
        for (author_id, record) in state {
            self.append(&author_id, |existing| match existing {
                Some(mut current) => {
                    current.merge_from(record);
                    current
                }
                None => record,
            });
        }
        info!(target: "postcrawl::store", "Restored {} records from previous run", restored);
        Ok(restored)
    }

    /// Persist a snapshot of the current state.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn checkpoint(&self, storage: &dyn StateStorage) -> Result<usize, StoreError> {
        let snapshot = self.snapshot();
        storage.persist(&snapshot)?;
        Ok(snapshot.len())
    }

    /// Dataset items for the current state, ordered by author.
    #[must_use]
    pub fn to_dataset(&self) -> Vec<DatasetItem> {
        let completed_at = Utc::now();
        self.snapshot()
            .into_iter()
            .map(|(author_id, record)| DatasetItem::new(author_id, record, completed_at))
            .collect()
    }
}
