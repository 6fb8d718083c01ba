use serde::{Deserialize, Serialize};

use super::window::ExecutionWindow;

/// A recurring scheduled job and its sampled history.
///
/// `windows` is fixed at construction. Only `delay_seconds` changes during a
/// run, and only through [`crate::algorithms::JobSet::commit_delay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub interval_seconds: i32,
    pub avg_duration_seconds: i32,
    windows: Vec<ExecutionWindow>,
    delay_seconds: i32,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        interval_seconds: i32,
        avg_duration_seconds: i32,
        windows: Vec<ExecutionWindow>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            interval_seconds,
            avg_duration_seconds,
            windows,
            delay_seconds: 0,
        }
    }

    /// Recorded windows, unshifted.
    pub fn windows(&self) -> &[ExecutionWindow] {
        &self.windows
    }

    /// Currently committed delay (0 until the coordinator commits one).
    pub fn delay_seconds(&self) -> i32 {
        self.delay_seconds
    }

    /// Recorded windows moved by the committed delay.
    pub fn shifted_windows(&self) -> impl Iterator<Item = ExecutionWindow> + '_ {
        let delay = self.delay_seconds;
        self.windows.iter().map(move |w| w.shifted(delay))
    }

    pub(crate) fn set_delay(&mut self, delay_seconds: i32) {
        self.delay_seconds = delay_seconds;
    }
}

/// Computed delay for one job, as handed to a delay sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRecord {
    pub job_name: String,
    pub delay_seconds: i32,
}

impl std::fmt::Display for DelayRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.job_name, self.delay_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_starts_undelayed() {
        let job = Job::new("j1", "Nightly", 3600, 60, vec![ExecutionWindow::new(0.0, 10.0)]);
        assert_eq!(job.delay_seconds(), 0);
        assert_eq!(job.windows().len(), 1);
    }

    #[test]
    fn test_shifted_windows_follow_delay() {
        let mut job = Job::new("j1", "Nightly", 3600, 60, vec![ExecutionWindow::new(0.0, 10.0)]);
        job.set_delay(42);
        let shifted: Vec<_> = job.shifted_windows().collect();
        assert_eq!(shifted, vec![ExecutionWindow::new(42.0, 52.0)]);
        // recorded history is untouched
        assert_eq!(job.windows()[0], ExecutionWindow::new(0.0, 10.0));
    }

    #[test]
    fn test_delay_record_display() {
        let record = DelayRecord {
            job_name: "Backup".to_string(),
            delay_seconds: 152,
        };
        assert_eq!(record.to_string(), "Backup: 152");
    }
}
