//! History query and delay replacement against SQL Server.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info, warn};
use tiberius::{IntoRow, Row};

use super::pool::DbClient;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::DelayRecord;
use crate::parsing::history::{
    parse_timestamp, AVG_DUR, END_DATETIME, HISTORY_COLUMNS, INTERVAL_SEC, JOB_ID, JOB_NAME,
    RUN_DATETIME,
};
use crate::parsing::{HistoryError, HistoryRow};

fn query_error(context: &str, err: tiberius::error::Error) -> RepositoryError {
    RepositoryError::QueryError(format!("{}: {}", context, err))
}

/// Run the history procedure and convert its first result set.
///
/// `procedure` must already be validated and quoted.
pub async fn fetch_history(
    conn: &mut DbClient,
    procedure: &str,
) -> RepositoryResult<Vec<HistoryRow>> {
    debug!("Executing {}", procedure);

    let rows = conn
        .simple_query(format!("EXEC {}", procedure))
        .await
        .map_err(|e| query_error("Failed to execute history procedure", e))?
        .into_first_result()
        .await
        .map_err(|e| query_error("Failed to read history result", e))?;

    if let Some(first) = rows.first() {
        for column in HISTORY_COLUMNS {
            if !first.columns().iter().any(|c| c.name() == column) {
                return Err(HistoryError::MissingColumn(column).into());
            }
        }
    }

    let history = rows
        .iter()
        .enumerate()
        .map(|(i, row)| row_to_history(row, i + 1))
        .collect::<Result<Vec<_>, HistoryError>>()?;

    debug!("Fetched {} history rows", history.len());
    Ok(history)
}

/// Replace the contents of `table` with `delays` in one transaction.
///
/// `table` must already be validated and quoted.
pub async fn replace_delays(
    conn: &mut DbClient,
    table: &str,
    delays: &[DelayRecord],
) -> RepositoryResult<usize> {
    conn.simple_query("BEGIN TRANSACTION")
        .await
        .map_err(|e| query_error("Failed to begin transaction", e))?;

    match write_delays(conn, table, delays).await {
        Ok(written) => {
            conn.simple_query("COMMIT TRANSACTION")
                .await
                .map_err(|e| query_error("Failed to commit delays", e))?;
            info!("Wrote {} delays to {}", written, table);
            Ok(written)
        }
        Err(err) => {
            // Best effort; the original error is what the caller needs.
            if let Err(rollback_err) = conn
                .simple_query("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION")
                .await
            {
                warn!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn write_delays(
    conn: &mut DbClient,
    table: &str,
    delays: &[DelayRecord],
) -> RepositoryResult<usize> {
    conn.execute(format!("TRUNCATE TABLE {}", table), &[])
        .await
        .map_err(|e| query_error("Failed to truncate delay table", e))?;

    if delays.is_empty() {
        return Ok(0);
    }

    let mut request = conn
        .bulk_insert(table)
        .await
        .map_err(|e| query_error("Failed to start bulk insert", e))?;

    for record in delays {
        let row = (record.job_name.clone(), record.delay_seconds).into_row();
        request
            .send(row)
            .await
            .map_err(|e| query_error("Failed to send delay row", e))?;
    }

    let result = request
        .finalize()
        .await
        .map_err(|e| query_error("Failed to finish bulk insert", e))?;

    Ok(result.total() as usize)
}

fn row_to_history(row: &Row, row_number: usize) -> Result<HistoryRow, HistoryError> {
    let run_time = timestamp_value(row, RUN_DATETIME, row_number)?;
    let end_time = timestamp_value(row, END_DATETIME, row_number)?;
    let execution = match (run_time, end_time) {
        (None, None) => None,
        (Some(run), Some(end)) => Some((run, end)),
        (None, Some(_)) => {
            return Err(HistoryError::MissingValue {
                row: row_number,
                column: RUN_DATETIME,
            })
        }
        (Some(_), None) => {
            return Err(HistoryError::MissingValue {
                row: row_number,
                column: END_DATETIME,
            })
        }
    };

    Ok(HistoryRow {
        job_id: id_value(row, row_number)?,
        job_name: text_value(row, JOB_NAME, row_number)?,
        interval_seconds: seconds_value(row, INTERVAL_SEC, row_number)?,
        avg_duration_seconds: seconds_value(row, AVG_DUR, row_number)?,
        execution,
    })
}

fn invalid(row: usize, column: &'static str, value: impl Into<String>) -> HistoryError {
    HistoryError::InvalidValue {
        row,
        column,
        value: value.into(),
    }
}

fn missing(row: usize, column: &'static str) -> HistoryError {
    HistoryError::MissingValue { row, column }
}

fn text_value(row: &Row, column: &'static str, row_number: usize) -> Result<String, HistoryError> {
    match row.try_get::<&str, _>(column) {
        Ok(Some(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Ok(_) => Err(missing(row_number, column)),
        Err(_) => Err(invalid(row_number, column, "<non-text value>")),
    }
}

/// Job ids arrive as text or as `uniqueidentifier`.
fn id_value(row: &Row, row_number: usize) -> Result<String, HistoryError> {
    if let Ok(Some(uuid)) = row.try_get::<tiberius::Uuid, _>(JOB_ID) {
        return Ok(uuid.to_string());
    }
    text_value(row, JOB_ID, row_number)
}

fn seconds_value(row: &Row, column: &'static str, row_number: usize) -> Result<i32, HistoryError> {
    if let Ok(value) = row.try_get::<i32, _>(column) {
        return value.ok_or_else(|| missing(row_number, column));
    }
    if let Ok(value) = row.try_get::<i64, _>(column) {
        let value = value.ok_or_else(|| missing(row_number, column))?;
        return i32::try_from(value).map_err(|_| invalid(row_number, column, value.to_string()));
    }
    if let Ok(value) = row.try_get::<i16, _>(column) {
        return value
            .map(i32::from)
            .ok_or_else(|| missing(row_number, column));
    }
    if let Ok(value) = row.try_get::<u8, _>(column) {
        return value
            .map(i32::from)
            .ok_or_else(|| missing(row_number, column));
    }
    let text = text_value(row, column, row_number)?;
    text.parse::<i32>()
        .map_err(|_| invalid(row_number, column, text.clone()))
}

fn timestamp_value(
    row: &Row,
    column: &'static str,
    row_number: usize,
) -> Result<Option<DateTime<Utc>>, HistoryError> {
    if let Ok(value) = row.try_get::<NaiveDateTime, _>(column) {
        return Ok(value.map(|naive| naive.and_utc()));
    }
    if let Ok(value) = row.try_get::<DateTime<Utc>, _>(column) {
        return Ok(value);
    }
    match row.try_get::<&str, _>(column) {
        Ok(None) => Ok(None),
        Ok(Some(text)) if text.trim().is_empty() => Ok(None),
        Ok(Some(text)) => parse_timestamp(text)
            .map(Some)
            .ok_or_else(|| invalid(row_number, column, text)),
        Err(_) => Err(invalid(row_number, column, "<unsupported type>")),
    }
}
