use polars::prelude::*;
use std::path::Path;

use super::history::{
    parse_execution, parse_seconds, required, HistoryError, HistoryRow, AVG_DUR, END_DATETIME,
    HISTORY_COLUMNS, INTERVAL_SEC, JOB_ID, JOB_NAME, RUN_DATETIME,
};

/// Read a job history CSV into a DataFrame with every column as text.
///
/// Schema inference is disabled so that numeric and timestamp conversion
/// happens in [`dataframe_to_rows`], where bad values are reported instead of
/// being coerced.
pub fn read_history_csv(csv_path: &Path) -> Result<DataFrame, HistoryError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(csv_path.into()))?
        .finish()?;
    Ok(df)
}

/// Parse a job history CSV into rows.
pub fn parse_history_csv(csv_path: &Path) -> Result<Vec<HistoryRow>, HistoryError> {
    let df = read_history_csv(csv_path)?;
    dataframe_to_rows(&df)
}

fn text_column<'a>(
    df: &'a DataFrame,
    name: &'static str,
) -> Result<&'a StringChunked, HistoryError> {
    let column = df
        .column(name)
        .map_err(|_| HistoryError::MissingColumn(name))?;
    Ok(column.str()?)
}

/// Convert a text DataFrame into history rows. Row numbers in errors are
/// 1-based and count data rows only.
pub fn dataframe_to_rows(df: &DataFrame) -> Result<Vec<HistoryRow>, HistoryError> {
    for name in HISTORY_COLUMNS {
        text_column(df, name)?;
    }

    let ids = text_column(df, JOB_ID)?;
    let names = text_column(df, JOB_NAME)?;
    let intervals = text_column(df, INTERVAL_SEC)?;
    let durations = text_column(df, AVG_DUR)?;
    let run_times = text_column(df, RUN_DATETIME)?;
    let end_times = text_column(df, END_DATETIME)?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = i + 1;
        let job_id = required(ids.get(i), row, JOB_ID)?.to_string();
        let job_name = required(names.get(i), row, JOB_NAME)?.to_string();

        rows.push(HistoryRow {
            job_id,
            job_name,
            interval_seconds: parse_seconds(intervals.get(i), row, INTERVAL_SEC)?,
            avg_duration_seconds: parse_seconds(durations.get(i), row, AVG_DUR)?,
            execution: parse_execution(run_times.get(i), end_times.get(i), row)?,
        });
    }

    Ok(rows)
}
