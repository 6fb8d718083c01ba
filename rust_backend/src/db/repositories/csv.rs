//! CSV file history source.

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};

use crate::db::repository::*;
use crate::parsing::csv_parser::parse_history_csv;
use crate::parsing::HistoryRow;

/// Reads job history from a delimited text file with a header row.
#[derive(Debug, Clone)]
pub struct CsvHistorySource {
    path: PathBuf,
}

impl CsvHistorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Repository for CsvHistorySource {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.path.is_file())
    }
}

#[async_trait]
impl HistorySource for CsvHistorySource {
    async fn fetch_history(&self) -> RepositoryResult<Vec<HistoryRow>> {
        let path = self.path.clone();
        debug!("Reading job history from {}", path.display());

        // polars parsing is synchronous and may be slow for large files
        let rows = tokio::task::spawn_blocking(move || parse_history_csv(&path))
            .await
            .map_err(|e| RepositoryError::InternalError(format!("CSV reader task failed: {}", e)))??;

        debug!("Read {} history rows", rows.len());
        Ok(rows)
    }
}
