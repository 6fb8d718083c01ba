//! Delay sink trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use super::Repository;
use crate::models::DelayRecord;

/// Persists computed delays.
#[async_trait]
pub trait DelaySink: Repository {
    /// Replace all previously stored delays with `delays`.
    ///
    /// Implementations clear the old results and write the new ones as one
    /// unit: on error the previous contents must still be in place.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records written
    /// * `Err(RepositoryError)` - If the write fails
    async fn replace_delays(&self, delays: &[DelayRecord]) -> RepositoryResult<usize>;
}
