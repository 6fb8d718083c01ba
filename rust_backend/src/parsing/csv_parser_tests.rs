#[cfg(test)]
mod tests {
    use crate::models::ExecutionWindow;
    use crate::parsing::csv_parser::{parse_history_csv, read_history_csv};
    use crate::parsing::history::{group_into_jobs, HistoryError, AVG_DUR, INTERVAL_SEC, JOB_NAME};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "job_id,job_name,interval_sec,avg_dur,run_datetime,end_datetime\n";

    /// Helper to create a temp CSV file
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_parse_history_basic() {
        let csv_content = format!(
            "{}{}{}",
            HEADER,
            "A1,Nightly Backup,3600,60,1970-01-01 00:00:00,1970-01-01 00:01:40\n",
            "B2,Index Rebuild,7200,300,1970-01-01 00:00:50,1970-01-01 00:02:30\n"
        );

        let temp_file = create_temp_csv(&csv_content);
        let rows = parse_history_csv(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].job_id, "A1");
        assert_eq!(rows[0].job_name, "Nightly Backup");
        assert_eq!(rows[0].interval_seconds, 3600);
        assert_eq!(rows[1].avg_duration_seconds, 300);

        let jobs = group_into_jobs(&rows).unwrap();
        assert_eq!(jobs[0].windows(), &[ExecutionWindow::new(0.0, 100.0)]);
        assert_eq!(jobs[1].windows(), &[ExecutionWindow::new(50.0, 150.0)]);
    }

    #[test]
    fn test_ids_stay_text() {
        // numeric-looking ids must not be reinterpreted
        let csv_content = format!(
            "{}{}",
            HEADER, "00042,Leading Zeros,3600,60,2024-01-01 00:00:00,2024-01-01 00:01:00\n"
        );
        let temp_file = create_temp_csv(&csv_content);
        let rows = parse_history_csv(temp_file.path()).unwrap();
        assert_eq!(rows[0].job_id, "00042");
    }

    #[test]
    fn test_quoted_fields_and_column_order() {
        let csv_content = "end_datetime,run_datetime,job_name,job_id,avg_dur,interval_sec,extra\n\
                           \"2024-01-01 00:01:00\",\"2024-01-01 00:00:00\",\"Load, Stage 2\",\"7F\",\"60\",\"3600\",x\n";
        let temp_file = create_temp_csv(csv_content);
        let rows = parse_history_csv(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].job_name, "Load, Stage 2");
        assert_eq!(rows[0].job_id, "7F");
        let (run, end) = rows[0].execution.unwrap();
        assert_eq!((end - run).num_seconds(), 60);
    }

    #[test]
    fn test_missing_interval_fails_fast() {
        let csv_content = format!(
            "{}{}{}",
            HEADER,
            "A1,Backup,3600,60,2024-01-01 00:00:00,2024-01-01 00:01:00\n",
            "A1,Backup,,60,2024-01-01 01:00:00,2024-01-01 01:01:00\n"
        );
        let temp_file = create_temp_csv(&csv_content);
        let result = parse_history_csv(temp_file.path());

        assert!(
            matches!(
                result,
                Err(HistoryError::MissingValue { row: 2, column: INTERVAL_SEC })
            ),
            "unexpected: {:?}",
            result
        );
    }

    #[test]
    fn test_blank_job_name_fails() {
        let csv_content = format!(
            "{}{}{}",
            HEADER,
            "A1,Backup,3600,60,2024-01-01 00:00:00,2024-01-01 00:01:00\n",
            "B2,  ,3600,60,2024-01-01 01:00:00,2024-01-01 01:01:00\n"
        );
        let temp_file = create_temp_csv(&csv_content);
        let result = parse_history_csv(temp_file.path());

        assert!(
            matches!(
                result,
                Err(HistoryError::MissingValue { row: 2, column: JOB_NAME })
            ),
            "unexpected: {:?}",
            result
        );
    }

    #[test]
    fn test_non_numeric_duration_fails_fast() {
        let csv_content = format!(
            "{}{}",
            HEADER, "A1,Backup,3600,about a minute,2024-01-01 00:00:00,2024-01-01 00:01:00\n"
        );
        let temp_file = create_temp_csv(&csv_content);
        let err = parse_history_csv(temp_file.path()).unwrap_err();

        match err {
            HistoryError::InvalidValue { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, AVG_DUR);
                assert_eq!(value, "about a minute");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_fails() {
        let csv_content = format!(
            "{}{}",
            HEADER, "A1,Backup,3600,60,not a time,2024-01-01 00:01:00\n"
        );
        let temp_file = create_temp_csv(&csv_content);
        assert!(matches!(
            parse_history_csv(temp_file.path()),
            Err(HistoryError::InvalidValue { row: 1, .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let csv_content = "job_id,job_name,interval_sec,run_datetime,end_datetime\n\
                           A1,Backup,3600,2024-01-01 00:00:00,2024-01-01 00:01:00\n";
        let temp_file = create_temp_csv(csv_content);
        assert!(matches!(
            parse_history_csv(temp_file.path()),
            Err(HistoryError::MissingColumn(AVG_DUR))
        ));
    }

    #[test]
    fn test_header_only_file() {
        let temp_file = create_temp_csv(HEADER);
        let df = read_history_csv(temp_file.path()).unwrap();
        assert_eq!(df.height(), 0);
        assert!(parse_history_csv(temp_file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_job_listed_without_history() {
        let csv_content = format!(
            "{}{}{}",
            HEADER,
            "A1,Backup,3600,60,2024-01-01 00:00:00,2024-01-01 00:01:00\n",
            "Z9,Never Ran,3600,60,,\n"
        );
        let temp_file = create_temp_csv(&csv_content);
        let rows = parse_history_csv(temp_file.path()).unwrap();
        assert!(rows[1].execution.is_none());
        assert!(matches!(
            group_into_jobs(&rows),
            Err(HistoryError::NoWindows(id)) if id == "Z9"
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = parse_history_csv(std::path::Path::new("/nonexistent/history.csv"));
        assert!(matches!(result, Err(HistoryError::Read(_))));
    }
}
