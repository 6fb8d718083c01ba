//! Job history rows and their conversion into [`Job`]s.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ExecutionWindow, Job};

pub const JOB_ID: &str = "job_id";
pub const JOB_NAME: &str = "job_name";
pub const INTERVAL_SEC: &str = "interval_sec";
pub const AVG_DUR: &str = "avg_dur";
pub const RUN_DATETIME: &str = "run_datetime";
pub const END_DATETIME: &str = "end_datetime";

/// Columns every history source must provide.
pub const HISTORY_COLUMNS: [&str; 6] = [
    JOB_ID,
    JOB_NAME,
    INTERVAL_SEC,
    AVG_DUR,
    RUN_DATETIME,
    END_DATETIME,
];

/// Naive timestamp layouts accepted besides RFC 3339. Interpreted as UTC.
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%d %H:%M",
];

/// Data-shape errors in job history. Any of these fails the run.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to read job history: {0}")]
    Read(#[from] polars::error::PolarsError),

    #[error("Job history is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("Row {row}: missing value for '{column}'")]
    MissingValue { row: usize, column: &'static str },

    #[error("Row {row}: invalid value '{value}' for '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: job '{job_id}' disagrees with its earlier rows on name, interval or duration")]
    InconsistentJob { row: usize, job_id: String },

    #[error("Job '{0}' has no recorded executions")]
    NoWindows(String),
}

/// One row of job history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub job_id: String,
    pub job_name: String,
    pub interval_seconds: i32,
    pub avg_duration_seconds: i32,
    /// `(run_time, end_time)`, `None` for a job listed without executions.
    pub execution: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl HistoryRow {
    pub fn new(
        job_id: impl Into<String>,
        job_name: impl Into<String>,
        interval_seconds: i32,
        avg_duration_seconds: i32,
        run_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            job_name: job_name.into(),
            interval_seconds,
            avg_duration_seconds,
            execution: Some((run_time, end_time)),
        }
    }

    fn same_job_as(&self, job: &Job) -> bool {
        self.job_name == job.name
            && self.interval_seconds == job.interval_seconds
            && self.avg_duration_seconds == job.avg_duration_seconds
    }
}

/// Parse a timestamp in RFC 3339 or one of the naive layouts (as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Non-blank text value of a required field.
pub(crate) fn required<'a>(
    value: Option<&'a str>,
    row: usize,
    column: &'static str,
) -> Result<&'a str, HistoryError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(HistoryError::MissingValue { row, column }),
    }
}

/// Strict integer conversion; no defaulting of blanks or fractions.
pub(crate) fn parse_seconds(
    value: Option<&str>,
    row: usize,
    column: &'static str,
) -> Result<i32, HistoryError> {
    let text = required(value, row, column)?;
    text.parse::<i32>().map_err(|_| HistoryError::InvalidValue {
        row,
        column,
        value: text.to_string(),
    })
}

/// Parse the run/end pair of a row. Both blank means no execution recorded.
pub(crate) fn parse_execution(
    run_time: Option<&str>,
    end_time: Option<&str>,
    row: usize,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, HistoryError> {
    let is_blank = |v: Option<&str>| v.map_or(true, |s| s.trim().is_empty());
    if is_blank(run_time) && is_blank(end_time) {
        return Ok(None);
    }

    let parse = |value: Option<&str>, column: &'static str| {
        let text = required(value, row, column)?;
        parse_timestamp(text).ok_or_else(|| HistoryError::InvalidValue {
            row,
            column,
            value: text.to_string(),
        })
    };

    Ok(Some((
        parse(run_time, RUN_DATETIME)?,
        parse(end_time, END_DATETIME)?,
    )))
}

/// Group history rows into jobs.
///
/// Jobs come out in the order their id first appears. The first row of an id
/// fixes its name, interval and average duration; later rows must agree.
/// Windows keep row order.
pub fn group_into_jobs(rows: &[HistoryRow]) -> Result<Vec<Job>, HistoryError> {
    let mut index_by_id: HashMap<&str, usize> = HashMap::new();
    let mut drafts: Vec<(Job, Vec<ExecutionWindow>)> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let slot = match index_by_id.get(row.job_id.as_str()) {
            Some(&slot) => {
                if !row.same_job_as(&drafts[slot].0) {
                    return Err(HistoryError::InconsistentJob {
                        row: i + 1,
                        job_id: row.job_id.clone(),
                    });
                }
                slot
            }
            None => {
                let job = Job::new(
                    row.job_id.clone(),
                    row.job_name.clone(),
                    row.interval_seconds,
                    row.avg_duration_seconds,
                    Vec::new(),
                );
                drafts.push((job, Vec::new()));
                index_by_id.insert(row.job_id.as_str(), drafts.len() - 1);
                drafts.len() - 1
            }
        };

        if let Some((run_time, end_time)) = row.execution {
            drafts[slot]
                .1
                .push(ExecutionWindow::from_datetimes(run_time, end_time));
        }
    }

    drafts
        .into_iter()
        .map(|(job, windows)| {
            if windows.is_empty() {
                return Err(HistoryError::NoWindows(job.id));
            }
            Ok(Job::new(
                job.id,
                job.name,
                job.interval_seconds,
                job.avg_duration_seconds,
                windows,
            ))
        })
        .collect()
}
