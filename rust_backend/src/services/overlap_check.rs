//! End-to-end overlap check: fetch history, compute delays, persist them.

use anyhow::{Context, Result};
use log::{info, warn};
use std::io::Write;
use std::sync::Arc;

use crate::algorithms::{DelaySearch, JobOutcome, JobSet};
use crate::db::repository::{DelaySink, HistorySource};
use crate::models::DelayRecord;
use crate::parsing::group_into_jobs;

/// Header printed before the records when persistence fails.
pub const DUMP_HEADER: &str = "Dumping Delay Data:";

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One record per job, in processing order
    pub records: Vec<DelayRecord>,
    pub outcomes: Vec<JobOutcome>,
    /// Rows written by the sink, `None` when no sink was given
    pub persisted: Option<usize>,
}

/// Write `records` one per line as `name: delay`.
pub fn write_records<W: Write>(out: &mut W, records: &[DelayRecord]) -> std::io::Result<()> {
    for record in records {
        writeln!(out, "{}", record)?;
    }
    out.flush()
}

/// Run the full pipeline against `source`, writing to `sink` if given.
///
/// Without a sink the records are printed to `out`. If the sink fails the
/// records are dumped to `out` after [`DUMP_HEADER`] and the sink error is
/// returned, so no computed delay is lost.
pub async fn run_overlap_check<W: Write>(
    source: &dyn HistorySource,
    sink: Option<&dyn DelaySink>,
    search: Arc<DelaySearch>,
    out: &mut W,
) -> Result<RunReport> {
    let rows = source
        .fetch_history()
        .await
        .context("Failed to fetch job history")?;
    info!("Fetched {} history rows", rows.len());

    let jobs = group_into_jobs(&rows).context("Invalid job history")?;
    let mut job_set = JobSet::new(jobs).context("Invalid job set")?;

    // The pass is CPU bound; keep it off the async worker threads.
    let (job_set, outcomes) = tokio::task::spawn_blocking(move || {
        let outcomes = job_set.run(&search)?;
        Ok::<_, crate::algorithms::JobSetError>((job_set, outcomes))
    })
    .await
    .context("Overlap computation task failed")??;

    let records = job_set.delay_records();

    let persisted = match sink {
        None => {
            write_records(out, &records).context("Failed to print delays")?;
            None
        }
        Some(sink) => match sink.replace_delays(&records).await {
            Ok(written) => {
                info!("Persisted {} delays", written);
                Some(written)
            }
            Err(err) => {
                warn!("Error inserting delay data: {}", err);
                writeln!(out, "{}", DUMP_HEADER).context("Failed to print delay dump")?;
                write_records(out, &records).context("Failed to print delay dump")?;
                return Err(anyhow::Error::new(err).context("Error inserting delay data"));
            }
        },
    };

    Ok(RunReport {
        records,
        outcomes,
        persisted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::parsing::HistoryRow;
    use chrono::{TimeZone, Utc};

    fn row(id: &str, start: i64, end: i64) -> HistoryRow {
        HistoryRow::new(
            id,
            id.to_uppercase(),
            3600,
            60,
            Utc.timestamp_opt(start, 0).unwrap(),
            Utc.timestamp_opt(end, 0).unwrap(),
        )
    }

    fn scenario() -> LocalRepository {
        LocalRepository::with_history(vec![row("x", 0, 100), row("y", 50, 150)])
    }

    #[tokio::test]
    async fn test_calculate_only_prints_records() {
        let source = scenario();
        let mut out = Vec::new();

        let report = run_overlap_check(&source, None, Arc::new(DelaySearch::new()), &mut out)
            .await
            .unwrap();

        assert!(report.persisted.is_none());
        assert_eq!(report.records[0].delay_seconds, 152);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("X: 152\n"));
        assert!(!text.contains(DUMP_HEADER));
    }

    #[tokio::test]
    async fn test_sink_failure_dumps_and_errors() {
        let source = scenario();
        let sink = LocalRepository::new();
        sink.set_fail_writes(true);
        let mut out = Vec::new();

        let sink_ref: &dyn DelaySink = &sink;
        let result = run_overlap_check(
            &source,
            Some(sink_ref),
            Arc::new(DelaySearch::new()),
            &mut out,
        )
        .await;

        assert!(result.is_err());
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(DUMP_HEADER));
        assert_eq!(lines.next(), Some("X: 152"));
        assert_eq!(lines.count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_history_fails_before_sink() {
        let mut bad = row("x", 0, 100);
        bad.execution = None;
        let source = LocalRepository::with_history(vec![bad]);
        let sink = LocalRepository::new();
        let mut out = Vec::new();

        let sink_ref: &dyn DelaySink = &sink;
        let result = run_overlap_check(
            &source,
            Some(sink_ref),
            Arc::new(DelaySearch::new()),
            &mut out,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(sink.write_count(), 0);
        assert!(out.is_empty());
    }
}
