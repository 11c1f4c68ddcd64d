//! Final dataset output

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::StoreError;
use crate::page_extractor::PostRecord;
use crate::utils::constants::SCHEMA_VERSION;

/// One dataset row: a flattened post record plus output metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetItem {
    pub author_id: String,
    #[serde(flatten)]
    pub record: PostRecord,
    pub schema_version: u32,
    pub completed_at: DateTime<Utc>,
}

impl DatasetItem {
    #[must_use]
    pub fn new(author_id: String, record: PostRecord, completed_at: DateTime<Utc>) -> Self {
        Self {
            author_id,
            record,
            schema_version: SCHEMA_VERSION,
            completed_at,
        }
    }
}

/// Destination of the final dataset
pub trait DatasetSink: Send + Sync {
    /// Push the complete dataset.
    ///
    /// # Errors
    /// Serialization or I/O failure.
    fn push(&self, items: Vec<DatasetItem>) -> Result<(), StoreError>;
}

/// Newline-delimited JSON file
#[derive(Debug, Clone)]
pub struct JsonLinesDataset {
    path: PathBuf,
}

impl JsonLinesDataset {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSink for JsonLinesDataset {
    fn push(&self, items: Vec<DatasetItem>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut writer = BufWriter::new(File::create(&self.path).map_err(io_err)?);
        for item in &items {
            serde_json::to_writer(&mut writer, item)?;
            writer.write_all(b"\n").map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;

        info!(target: "postcrawl::store", "Wrote {} dataset items to {}", items.len(), self.path.display());
        Ok(())
    }
}
