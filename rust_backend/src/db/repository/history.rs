//! Job history source trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use super::Repository;
use crate::parsing::HistoryRow;

/// Supplies the raw execution history a run is computed from.
///
/// Implementations return rows in source order; that order decides the job
/// processing order downstream.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait HistorySource: Repository {
    /// Fetch every history row.
    ///
    /// # Returns
    /// * `Ok(Vec<HistoryRow>)` - All rows, in source order
    /// * `Err(RepositoryError::History)` - If a row is malformed
    /// * `Err(RepositoryError)` - If the source cannot be read
    async fn fetch_history(&self) -> RepositoryResult<Vec<HistoryRow>>;
}
