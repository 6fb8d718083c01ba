//! Repository factory for dependency injection.
//!
//! This module creates the history source and the optional delay sink for a
//! run based on runtime configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use log::debug;

use super::config::DbConfig;
#[cfg(feature = "sqlserver-repo")]
use super::repositories::SqlServerRepository;
use super::repositories::{CsvHistorySource, LocalRepository};
use super::repository::{DelaySink, HistorySource, RepositoryError, RepositoryResult};

/// Where job history is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// CSV file with a header row
    Csv,
    /// SQL Server stored procedure
    SqlServer,
}

impl FromStr for RepositoryType {
    type Err = RepositoryError;

    /// Parse repository type from string ("csv", "sql", "sqlserver").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "sql" | "sqlserver" => Ok(Self::SqlServer),
            _ => Err(RepositoryError::ConfigurationError(format!(
                "Unknown data source: {} (expected CSV or SQL)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::SqlServer => write!(f, "SQL"),
        }
    }
}

/// History source and optional delay sink for one run.
#[derive(Clone)]
pub struct Repositories {
    pub source: Arc<dyn HistorySource>,
    pub sink: Option<Arc<dyn DelaySink>>,
    // Source and sink are the same SQL Server repository
    shared: bool,
}

impl Repositories {
    pub fn new(source: Arc<dyn HistorySource>, sink: Option<Arc<dyn DelaySink>>) -> Self {
        Self {
            source,
            sink,
            shared: false,
        }
    }

    /// Check every backend the run will touch.
    ///
    /// # Errors
    /// `ConnectionError` naming the first backend that is unreachable.
    pub async fn check_connectivity(&self) -> RepositoryResult<()> {
        if !self.source.health_check().await? {
            return Err(RepositoryError::ConnectionError(
                "History source is not reachable".to_string(),
            ));
        }
        if let Some(sink) = self.sink.as_ref().filter(|_| !self.shared) {
            if !sink.health_check().await? {
                return Err(RepositoryError::ConnectionError(
                    "Delay sink is not reachable".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use job_overlap::db::{RepositoryConfig, RepositoryFactory};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let file = RepositoryConfig::from_file("job_overlap.toml")?;
///     if let Some(config) = file.to_db_config()? {
///         let sql_repo = RepositoryFactory::create_sqlserver(&config).await?;
///     }
///
///     let csv_source = RepositoryFactory::create_csv("history.csv");
///     Ok(())
/// }
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a CSV history source.
    pub fn create_csv(path: impl Into<PathBuf>) -> Arc<CsvHistorySource> {
        Arc::new(CsvHistorySource::new(path))
    }

    /// Create a SQL Server repository with its own connection pool.
    #[cfg(feature = "sqlserver-repo")]
    pub async fn create_sqlserver(config: &DbConfig) -> RepositoryResult<Arc<SqlServerRepository>> {
        Ok(Arc::new(SqlServerRepository::connect(config).await?))
    }

    /// Create an in-memory repository.
    pub fn create_local() -> Arc<LocalRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create the source and, when `with_sink` is set, the delay sink.
    ///
    /// The sink is always SQL Server. When the source is SQL Server as well,
    /// both share one repository and pool.
    ///
    /// # Arguments
    /// * `repo_type` - Where history is read from
    /// * `csv_path` - Required for [`RepositoryType::Csv`]
    /// * `config` - Required for SQL Server sources and for any sink
    /// * `with_sink` - Whether results will be persisted
    pub async fn create(
        repo_type: RepositoryType,
        csv_path: Option<&Path>,
        config: Option<&DbConfig>,
        with_sink: bool,
    ) -> RepositoryResult<Repositories> {
        debug!(
            "Creating {} history source ({})",
            repo_type,
            if with_sink { "with delay sink" } else { "calculate only" }
        );

        match repo_type {
            RepositoryType::Csv => {
                let path = csv_path.ok_or_else(|| {
                    RepositoryError::ConfigurationError(
                        "CSV data source requires a file path".to_string(),
                    )
                })?;
                let source = Self::create_csv(path);
                let sink = if with_sink {
                    Some(Self::create_sink(config).await?)
                } else {
                    None
                };
                Ok(Repositories::new(source, sink))
            }
            RepositoryType::SqlServer => Self::create_sql_source(config, with_sink).await,
        }
    }

    #[cfg(feature = "sqlserver-repo")]
    async fn create_sink(config: Option<&DbConfig>) -> RepositoryResult<Arc<dyn DelaySink>> {
        let repo = Self::create_sqlserver(require_config(config)?).await?;
        Ok(repo as Arc<dyn DelaySink>)
    }

    #[cfg(feature = "sqlserver-repo")]
    async fn create_sql_source(
        config: Option<&DbConfig>,
        with_sink: bool,
    ) -> RepositoryResult<Repositories> {
        let repo = Self::create_sqlserver(require_config(config)?).await?;
        let sink = if with_sink {
            Some(repo.clone() as Arc<dyn DelaySink>)
        } else {
            None
        };
        Ok(Repositories {
            source: repo as Arc<dyn HistorySource>,
            sink,
            shared: with_sink,
        })
    }

    #[cfg(not(feature = "sqlserver-repo"))]
    async fn create_sink(_config: Option<&DbConfig>) -> RepositoryResult<Arc<dyn DelaySink>> {
        Err(sqlserver_disabled())
    }

    #[cfg(not(feature = "sqlserver-repo"))]
    async fn create_sql_source(
        _config: Option<&DbConfig>,
        _with_sink: bool,
    ) -> RepositoryResult<Repositories> {
        Err(sqlserver_disabled())
    }
}

#[cfg(feature = "sqlserver-repo")]
fn require_config(config: Option<&DbConfig>) -> RepositoryResult<&DbConfig> {
    config.ok_or_else(|| {
        RepositoryError::ConfigurationError(
            "SQL Server connection settings are required (set DB_SERVER or [database] in the config file)"
                .to_string(),
        )
    })
}

#[cfg(not(feature = "sqlserver-repo"))]
fn sqlserver_disabled() -> RepositoryError {
    RepositoryError::ConfigurationError(
        "This build has no SQL Server support (enable the sqlserver-repo feature)".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!("csv".parse::<RepositoryType>().unwrap(), RepositoryType::Csv);
        assert_eq!("CSV".parse::<RepositoryType>().unwrap(), RepositoryType::Csv);
        assert_eq!("SQL".parse::<RepositoryType>().unwrap(), RepositoryType::SqlServer);
        assert_eq!(
            "sqlserver".parse::<RepositoryType>().unwrap(),
            RepositoryType::SqlServer
        );
        assert!("invalid".parse::<RepositoryType>().is_err());
    }

    #[tokio::test]
    async fn test_csv_calculate_only_has_no_sink() {
        let repos = RepositoryFactory::create(
            RepositoryType::Csv,
            Some(Path::new("history.csv")),
            None,
            false,
        )
        .await
        .unwrap();
        assert!(repos.sink.is_none());
    }

    #[tokio::test]
    async fn test_csv_requires_path() {
        let result = RepositoryFactory::create(RepositoryType::Csv, None, None, false).await;
        assert!(matches!(result, Err(RepositoryError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_sink_requires_config() {
        let result = RepositoryFactory::create(
            RepositoryType::Csv,
            Some(Path::new("history.csv")),
            None,
            true,
        )
        .await;
        assert!(matches!(result, Err(RepositoryError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_sql_source_requires_config() {
        let result = RepositoryFactory::create(RepositoryType::SqlServer, None, None, false).await;
        assert!(matches!(result, Err(RepositoryError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_connectivity_reports_unhealthy_source() {
        let local = RepositoryFactory::create_local();
        local.set_healthy(false);
        let repos = Repositories::new(local, None);
        assert!(matches!(
            repos.check_connectivity().await,
            Err(RepositoryError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_connectivity_checks_sink() {
        let source = RepositoryFactory::create_local();
        let sink = RepositoryFactory::create_local();
        sink.set_healthy(false);
        let repos = Repositories::new(source, Some(sink as Arc<dyn DelaySink>));
        assert!(repos.check_connectivity().await.is_err());
    }
}
