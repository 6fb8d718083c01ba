//! In-memory local repository implementation.
//!
//! This module provides a local implementation of both repository traits
//! suitable for unit testing and local development. Data lives behind a
//! single lock, so a cloned handle observes every write.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::DelayRecord;
use crate::parsing::HistoryRow;

/// In-memory local repository.
///
/// # Example
/// ```
/// use job_overlap::db::repositories::LocalRepository;
/// use job_overlap::db::repository::DelaySink;
/// use job_overlap::models::DelayRecord;
///
/// let repo = LocalRepository::new();
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let record = DelayRecord {
///     job_name: "nightly-backup".to_string(),
///     delay_seconds: 4,
/// };
/// runtime.block_on(repo.replace_delays(&[record])).unwrap();
/// assert_eq!(repo.delays().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    history: Vec<HistoryRow>,
    delays: Vec<DelayRecord>,

    // Number of successful replace_delays calls
    write_count: usize,

    // Failure injection
    is_healthy: bool,
    fail_writes: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            delays: Vec::new(),
            write_count: 0,
            is_healthy: true,
            fail_writes: false,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with history rows.
    pub fn with_history(history: Vec<HistoryRow>) -> Self {
        let repo = Self::new();
        repo.set_history(history);
        repo
    }

    /// Replace the stored history.
    pub fn set_history(&self, history: Vec<HistoryRow>) {
        self.data.write().history = history;
    }

    /// Seed stored delays without counting as a write.
    pub fn seed_delays(&self, delays: Vec<DelayRecord>) {
        self.data.write().delays = delays;
    }

    /// Snapshot of the stored delays.
    pub fn delays(&self) -> Vec<DelayRecord> {
        self.data.read().delays.clone()
    }

    /// Number of successful `replace_delays` calls.
    pub fn write_count(&self) -> usize {
        self.data.read().write_count
    }

    /// Set the health status (for testing connection failures).
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make every subsequent `replace_delays` call fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.data.write().fail_writes = fail;
    }

    fn ensure_healthy(data: &LocalData) -> RepositoryResult<()> {
        if data.is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::ConnectionError(
                "Local repository marked unhealthy".to_string(),
            ))
        }
    }
}

#[async_trait]
impl Repository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}

#[async_trait]
impl HistorySource for LocalRepository {
    async fn fetch_history(&self) -> RepositoryResult<Vec<HistoryRow>> {
        let data = self.data.read();
        Self::ensure_healthy(&data)?;
        Ok(data.history.clone())
    }
}

#[async_trait]
impl DelaySink for LocalRepository {
    async fn replace_delays(&self, delays: &[DelayRecord]) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        Self::ensure_healthy(&data)?;
        if data.fail_writes {
            return Err(RepositoryError::QueryError(
                "Simulated write failure".to_string(),
            ));
        }

        data.delays = delays.to_vec();
        data.write_count += 1;
        Ok(delays.len())
    }
}
