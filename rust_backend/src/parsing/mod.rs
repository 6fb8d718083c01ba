//! Parsers for job execution history.
//!
//! # Parsers
//!
//! - [`history`]: history rows, timestamp conversion and grouping rows into jobs
//! - [`csv_parser`]: delimited-text history files
//!
//! # Example
//!
//! ```no_run
//! use job_overlap::parsing::{csv_parser::parse_history_csv, group_into_jobs};
//! use std::path::Path;
//!
//! let rows = parse_history_csv(Path::new("job_history.csv"))
//!     .expect("Failed to parse history");
//! let jobs = group_into_jobs(&rows).expect("Malformed history");
//! ```

pub mod csv_parser;
pub mod history;

#[cfg(test)]
mod csv_parser_tests;

pub use history::{group_into_jobs, parse_timestamp, HistoryError, HistoryRow};
