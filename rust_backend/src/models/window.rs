use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed run of a job as a closed interval `[start, end]`.
///
/// Both bounds are seconds since 1970-01-01 00:00:00 UTC. `end >= start` is
/// expected but never checked here.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ExecutionWindow {
    pub start: f64,
    pub end: f64,
}

impl ExecutionWindow {
    /// Create a window from raw epoch seconds.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Create a window from a run/end timestamp pair.
    pub fn from_datetimes(run_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self::new(to_epoch_seconds(run_time), to_epoch_seconds(end_time))
    }

    /// Closed-interval intersection test. Shared boundary instants count.
    #[inline]
    pub fn overlaps(&self, other: &ExecutionWindow) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// The same window moved later by `delay_seconds`.
    #[inline]
    pub fn shifted(&self, delay_seconds: i32) -> ExecutionWindow {
        let delay = f64::from(delay_seconds);
        ExecutionWindow {
            start: self.start + delay,
            end: self.end + delay,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Free-function form of [`ExecutionWindow::overlaps`].
#[inline]
pub fn overlaps(a: &ExecutionWindow, b: &ExecutionWindow) -> bool {
    a.overlaps(b)
}

/// Seconds since the Unix epoch, keeping sub-second precision.
pub fn to_epoch_seconds(dt: DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9
}
