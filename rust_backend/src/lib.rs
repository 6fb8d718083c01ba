//! Job overlap delay calculator.
//!
//! Given the execution history of recurring jobs, pick a start delay for each
//! job that reduces how often its runs overlap with the runs of every other
//! job.
//!
//! - [`models`]: execution windows, jobs and delay records
//! - [`parsing`]: history rows, CSV reading and grouping into jobs
//! - [`algorithms`]: the delay search and the sequential pass over all jobs
//! - [`db`]: history sources and delay sinks (CSV, SQL Server, in-memory)
//! - [`services`]: the end-to-end run
//! - [`config`]: command-line and file configuration

pub mod algorithms;
pub mod config;
pub mod db;
pub mod models;
pub mod parsing;
pub mod services;
