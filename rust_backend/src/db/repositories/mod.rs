//! Repository implementations module.
//!
//! - `csv`: History read from a CSV file
//! - `sqlserver`: SQL Server history procedure and delay table
//! - `local`: In-memory implementation for unit testing and local development

pub mod csv;
pub mod local;
#[cfg(feature = "sqlserver-repo")]
pub mod sqlserver;

pub use csv::CsvHistorySource;
pub use local::LocalRepository;
#[cfg(feature = "sqlserver-repo")]
pub use sqlserver::SqlServerRepository;
