//! Durable state storage

use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::StoreError;
use crate::page_extractor::PostRecord;

/// Key-value storage for the aggregation state
pub trait StateStorage: Send + Sync {
    /// Previously persisted state, or `None` on a first run.
    ///
    /// # Errors
    /// Unreadable or corrupt state.
    fn load(&self) -> Result<Option<BTreeMap<String, PostRecord>>, StoreError>;

    /// Replace the persisted state.
    ///
    /// # Errors
    /// Serialization or I/O failure.
    fn persist(&self, state: &BTreeMap<String, PostRecord>) -> Result<(), StoreError>;
}

/// State kept as one pretty-printed JSON object, replaced atomically
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<BTreeMap<String, PostRecord>>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn persist(&self, state: &BTreeMap<String, PostRecord>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(state)?;

        // Write then rename so a crash never leaves a torn state file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(target: "postcrawl::store", "Persisted {} records to {}", state.len(), self.path.display());
        Ok(())
    }
}
