//! SQL Server repository implementation.
//!
//! History comes from a stored procedure; delays go to a table that is
//! truncated and bulk-loaded inside one transaction.
//!
//! - `pool`: Connection pooling
//! - `operations`: History query and delay replacement

pub mod operations;
pub mod pool;

use async_trait::async_trait;
use log::debug;

use crate::db::config::DbConfig;
use crate::db::repository::*;
use crate::models::DelayRecord;
use crate::parsing::HistoryRow;

pub use pool::{DbClient, DbPool};

/// SQL Server backed history source and delay sink.
pub struct SqlServerRepository {
    pool: DbPool,
    config: DbConfig,
}

impl SqlServerRepository {
    /// Create a repository with its own connection pool.
    pub async fn connect(config: &DbConfig) -> RepositoryResult<Self> {
        let pool = pool::create_pool(config).await?;
        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

#[async_trait]
impl Repository for SqlServerRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let mut conn = self.pool.get().await.map_err(pool::checkout_error)?;
        let row = conn
            .simple_query("SELECT 1")
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?
            .into_row()
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?;

        let healthy = row.and_then(|r| r.get::<i32, _>(0)) == Some(1);
        debug!(
            "SQL Server health check on {}: {}",
            self.config.server,
            if healthy { "ok" } else { "unexpected result" }
        );
        Ok(healthy)
    }
}

#[async_trait]
impl HistorySource for SqlServerRepository {
    async fn fetch_history(&self) -> RepositoryResult<Vec<HistoryRow>> {
        let procedure = self.config.quoted_history_procedure()?;
        let mut conn = self.pool.get().await.map_err(pool::checkout_error)?;
        operations::fetch_history(&mut conn, &procedure).await
    }
}

#[async_trait]
impl DelaySink for SqlServerRepository {
    async fn replace_delays(&self, delays: &[DelayRecord]) -> RepositoryResult<usize> {
        let table = self.config.quoted_target_table()?;
        let mut conn = self.pool.get().await.map_err(pool::checkout_error)?;
        operations::replace_delays(&mut conn, &table, delays).await
    }
}
