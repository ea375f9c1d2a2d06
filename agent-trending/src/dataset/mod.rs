//! The persisted trending dataset.
//!
//! `fetch` writes it, `render` and `sync` read it. Repository order is the
//! ranking order and survives a save/load cycle.

mod error;

pub use error::DatasetError;

use crate::aggregate::RepoRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Ranked repositories plus fetch metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingDataset {
    /// When the search ran.
    pub fetched_at: DateTime<Utc>,

    /// Number of entries in `repositories`.
    pub total_count: usize,

    /// Records in ranking order.
    pub repositories: Vec<RepoRecord>,
}

impl TrendingDataset {
    /// Wraps ranked records.
    #[must_use]
    pub fn new(fetched_at: DateTime<Utc>, repositories: Vec<RepoRecord>) -> Self {
        Self {
            fetched_at,
            total_count: repositories.len(),
            repositories,
        }
    }

    /// Returns true when no repositories were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Sum of stars across all repositories.
    #[must_use]
    pub fn total_stars(&self) -> u64 {
        self.repositories
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.stars))
    }

    /// Writes the dataset as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), DatasetError> {
        let io_error = |source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| DatasetError::Json {
            path: path.display().to_string(),
            source: e,
        })?;
        fs::write(path, json + "\n").map_err(io_error)?;

        info!(path = %path.display(), repositories = self.repositories.len(), "Saved dataset");
        Ok(())
    }

    /// Reads and validates a dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file is unreadable, is not a dataset,
    /// or contains empty or duplicate `full_name`s.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut dataset: Self =
            serde_json::from_str(&contents).map_err(|e| DatasetError::Json {
                path: path.display().to_string(),
                source: e,
            })?;

        dataset.validate().map_err(|message| DatasetError::Validation {
            path: path.display().to_string(),
            message,
        })?;
        dataset.total_count = dataset.repositories.len();

        Ok(dataset)
    }

    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for record in &self.repositories {
            if record.full_name.trim().is_empty() {
                return Err("repository with empty full_name".to_string());
            }
            if !seen.insert(record.full_name.as_str()) {
                return Err(format!("duplicate repository '{}'", record.full_name));
            }
        }
        Ok(())
    }
}
