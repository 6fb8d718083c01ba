//! Storage backends for job history and computed delays.
//!
//! This module provides abstractions for reading history and writing delays
//! via the Repository pattern, so the overlap computation never depends on
//! where its data lives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Binary / service layer (services::overlap_check)       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - HistorySource,       │
//! │  DelaySink                                              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┼─────────────────────┐
//!     │               │                     │
//! ┌───▼──────────┐ ┌──▼───────────────┐ ┌───▼──────────────┐
//! │ CSV source   │ │ SQL Server       │ │ Local repository │
//! │ (polars)     │ │ (tiberius, bb8)  │ │ (in-memory)      │
//! └──────────────┘ └──────────────────┘ └──────────────────┘
//! ```
//!
//! - `repository`: Trait definitions and errors
//! - `repositories`: Backend implementations
//! - `factory`: Builds the source and sink for a run
//! - `config` / `repo_config`: Connection settings from env vars and TOML

pub mod config;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use config::{quote_object_name, DbAuthMethod, DbConfig};
pub use factory::{Repositories, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::{CsvHistorySource, LocalRepository};
#[cfg(feature = "sqlserver-repo")]
pub use repositories::SqlServerRepository;
pub use repository::{
    DelaySink, HistorySource, Repository, RepositoryError, RepositoryResult,
};
