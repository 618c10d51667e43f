use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;

use crate::batch::BatchItem;
use crate::models::instagram::ProfileRecord;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes extracted profiles as pretty JSON under a single directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_path(&self, username: &str) -> PathBuf {
        self.root.join(format!("{}.json", username))
    }

    pub fn batch_path(&self, finished_at: DateTime<Utc>) -> PathBuf {
        self.root
            .join(format!("bulk_results_{}.json", finished_at.format("%Y%m%d_%H%M%S")))
    }

    /// Writes `<root>/<username>.json`, replacing an earlier save.
    pub async fn save_profile(&self, record: &ProfileRecord) -> Result<PathBuf, StorageError> {
        let path = self.profile_path(record.username());
        self.write_json(&path, record).await?;
        info!("Saved profile {} to {}", record.username(), path.display());
        Ok(path)
    }

    /// Writes every item of a batch into `<root>/bulk_results_<timestamp>.json`.
    pub async fn save_batch(&self, items: &[BatchItem], finished_at: DateTime<Utc>) -> Result<PathBuf, StorageError> {
        let path = self.batch_path(finished_at);
        self.write_json(&path, items).await?;
        info!("Saved {} batch results to {}", items.len(), path.display());
        Ok(path)
    }

    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let body = serde_json::to_vec_pretty(value)?;

        fs::create_dir_all(&self.root).await.map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;
        fs::write(path, body).await.map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
