//! Job overlap checker.
//!
//! Reads job history from CSV or SQL Server, computes a start delay for every
//! job, and writes the delays back to SQL Server (or prints them with
//! `--calculate-only`).

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::info;
use std::process::ExitCode;
use std::sync::Arc;

use job_overlap::algorithms::DelaySearch;
use job_overlap::config::{CliArgs, RunConfig};
use job_overlap::db::RepositoryFactory;
use job_overlap::services::run_overlap_check;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

async fn run(args: CliArgs) -> Result<()> {
    let config = RunConfig::load(&args)?;

    let search = match config.workers {
        Some(workers) => DelaySearch::with_workers(workers)
            .with_context(|| format!("Failed to start {} overlap workers", workers))?,
        None => DelaySearch::new(),
    };

    let repos = RepositoryFactory::create(
        config.data_source,
        config.csv_path.as_deref(),
        config.database.as_ref(),
        !config.calculate_only,
    )
    .await
    .context("Failed to set up data source")?;

    if config.needs_database() {
        repos
            .check_connectivity()
            .await
            .context("SQL Server connectivity check failed")?;
    }

    let mut out = std::io::stdout();
    let report = run_overlap_check(
        repos.source.as_ref(),
        repos.sink.as_deref(),
        Arc::new(search),
        &mut out,
    )
    .await?;

    match report.persisted {
        Some(written) => info!("Wrote delays for {} jobs", written),
        None => info!("Calculated delays for {} jobs", report.records.len()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    println!("Starting Overlap Checker: {}", Local::now().format(TIME_FORMAT));

    match run(args).await {
        Ok(()) => {
            println!("Overlap Check Complete: {}", Local::now().format(TIME_FORMAT));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
