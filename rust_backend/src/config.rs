//! Command-line arguments and run configuration.
//!
//! Settings are layered: the TOML file is the base, environment variables
//! override it, and command-line arguments override both.

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::db::config::TARGET_TABLE_ENV;
use crate::db::{DbConfig, RepositoryConfig, RepositoryError, RepositoryType};

/// Compute per-job start delays that minimise overlap between recurring jobs.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "job-overlap", version)]
#[command(about = "Compute start delays that minimise overlap between recurring jobs", long_about = None)]
pub struct CliArgs {
    /// Data source for job history: CSV or SQL
    #[arg(short = 'd', long = "datasource")]
    pub datasource: Option<String>,

    /// Path to the history file (CSV data source)
    #[arg(short = 'f', long = "filepath")]
    pub filepath: Option<PathBuf>,

    /// SQL Server instance, e.g. HOST or HOST\INSTANCE
    #[arg(short = 'i', long = "instance")]
    pub instance: Option<String>,

    /// Compute and print delays without writing them
    #[arg(long = "calculate-only", alias = "calculate_only")]
    pub calculate_only: bool,

    /// Configuration file (default: ./job_overlap.toml)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Worker threads for overlap counting (default: all cores)
    #[arg(long = "workers")]
    pub workers: Option<usize>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Full help text, appended to validation errors.
pub fn usage() -> String {
    CliArgs::command().render_help().to_string()
}

/// Invalid or incomplete run parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("A data source is required (-d CSV or -d SQL)\n\n{}", usage())]
    MissingDataSource,

    #[error("Invalid data source '{}' (expected CSV or SQL)\n\n{}", .0, usage())]
    InvalidDataSource(String),

    #[error("A file path is required for the CSV data source (-f <path>)\n\n{}", usage())]
    MissingFilePath,

    #[error("History file not found: {}\n\n{}", .0.display(), usage())]
    FileNotFound(PathBuf),

    #[error("SQL Server settings are required (set DB_SERVER or a [database] section)\n\n{}", usage())]
    MissingDatabase,

    #[error("--workers must be at least 1\n\n{}", usage())]
    InvalidWorkers,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Fully resolved parameters for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_source: RepositoryType,
    pub csv_path: Option<PathBuf>,
    /// Present whenever the run touches SQL Server
    pub database: Option<DbConfig>,
    pub calculate_only: bool,
    /// `None` uses the global rayon pool
    pub workers: Option<usize>,
    pub verbose: bool,
}

impl RunConfig {
    /// Load the config file, apply the environment and `args`, and validate.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => Some(RepositoryConfig::from_file(path)?),
            None => RepositoryConfig::from_default_location()?,
        };

        let config = Self::resolve(args, file, |name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Merge the layers without touching the filesystem or process env.
    pub fn resolve<F>(
        args: &CliArgs,
        file: Option<RepositoryConfig>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file = file.unwrap_or_default();
        let source = file.source.take();

        let data_source = match (&args.datasource, &source) {
            (Some(name), _) => parse_data_source(name)?,
            (None, Some(settings)) => parse_data_source(&settings.source_type)?,
            (None, None) => return Err(ConfigError::MissingDataSource),
        };

        let csv_path = args
            .filepath
            .clone()
            .or_else(|| source.and_then(|settings| settings.path));

        if args.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers);
        }

        file.database.apply_overrides(&lookup);
        if let Some(table) = lookup(TARGET_TABLE_ENV) {
            file.sink.target_table = table;
        }
        if let Some(instance) = &args.instance {
            file.database.server = instance.clone();
        }

        let needs_database = !args.calculate_only || data_source == RepositoryType::SqlServer;
        let database = if needs_database {
            file.to_db_config()?
        } else {
            None
        };

        Ok(Self {
            data_source,
            csv_path,
            database,
            calculate_only: args.calculate_only,
            workers: args.workers,
            verbose: args.verbose,
        })
    }

    /// Whether SQL Server is used as source or sink.
    pub fn needs_database(&self) -> bool {
        !self.calculate_only || self.data_source == RepositoryType::SqlServer
    }

    /// Check the resolved parameters.
    ///
    /// A CSV source needs an existing file. SQL Server settings are needed
    /// for SQL sources and whenever results will be persisted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_source == RepositoryType::Csv {
            let path = self.csv_path.as_ref().ok_or(ConfigError::MissingFilePath)?;
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
        }

        if self.needs_database() && self.database.is_none() {
            return Err(ConfigError::MissingDatabase);
        }

        Ok(())
    }
}

fn parse_data_source(name: &str) -> Result<RepositoryType, ConfigError> {
    name.parse()
        .map_err(|_| ConfigError::InvalidDataSource(name.to_string()))
}
