//! Repository trait definitions.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`history`]: Reading job execution history
//! - [`delays`]: Writing computed delays
//!
//! All traits extend [`Repository`], which carries the connectivity check
//! shared by every backend.

pub mod delays;
pub mod error;
pub mod history;

use async_trait::async_trait;

pub use delays::DelaySink;
pub use error::{RepositoryError, RepositoryResult};
pub use history::HistorySource;

/// Base trait for every repository backend.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Check that the backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the backend is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;
}
