//! Overlap-minimizing delay search for a single job.
//!
//! Candidate delays are sampled on an even grid `0, 2, 4, ...` below the loop
//! limit `interval / 2 - avg_duration`. For every candidate the job's own
//! windows are shifted and counted against the competitor set in parallel.
//! The search is greedy: it keeps the first candidate that strictly improves
//! on the best count seen so far and stops at the first zero.

use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::models::ExecutionWindow;

/// Spacing between sampled candidate delays, in seconds.
pub const CANDIDATE_STEP: usize = 2;

/// Delay reported when the first candidate is never improved upon.
///
/// Open question: returning `1` rather than `0` here looks like an artifact
/// of how the best result is seeded. It is kept because
/// downstream consumers may depend on the exact value.
///
/// The value is never evaluated. `final_overlaps` is the count at candidate
/// 0, and shifting by `1` can overlap more than that, e.g. `[0,10]` against
/// `[11,20]` goes from 0 to 1. Monotonic improvement therefore only holds for
/// delays the search actually selected.
pub const NO_IMPROVEMENT_DELAY: i32 = 1;

/// Result of one delay search, including the overlap trajectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Selected delay in seconds.
    pub delay: i32,
    /// Exclusive upper bound on candidate delays.
    pub loop_limit: i32,
    /// Overlap count at candidate 0, `None` when no candidate ran.
    pub initial_overlaps: Option<usize>,
    /// Best overlap count observed, `None` when no candidate ran.
    pub final_overlaps: Option<usize>,
    /// `(candidate, overlap_count)` for every evaluated candidate, in order.
    pub trajectory: Vec<(i32, usize)>,
}

impl SearchOutcome {
    /// True when the loop limit left no candidate to evaluate.
    pub fn is_degenerate(&self) -> bool {
        self.trajectory.is_empty()
    }

    /// True when the search ended on a candidate with zero overlaps.
    pub fn fully_separated(&self) -> bool {
        self.final_overlaps == Some(0)
    }
}

/// `interval_seconds / 2 - avg_duration_seconds`, in integer arithmetic.
pub fn loop_limit(interval_seconds: i32, avg_duration_seconds: i32) -> i32 {
    (interval_seconds / 2).saturating_sub(avg_duration_seconds)
}

/// Number of `(own, competitor)` pairs that overlap once every own window is
/// shifted by `delay`.
///
/// Each worker counts one own window against the full competitor set and the
/// per-window counts are combined with a single `sum` reduction.
pub fn count_overlaps(
    own_windows: &[ExecutionWindow],
    delay: i32,
    competitor_windows: &[ExecutionWindow],
) -> usize {
    own_windows
        .par_iter()
        .map(|window| {
            let shifted = window.shifted(delay);
            competitor_windows
                .iter()
                .filter(|competitor| competitor.overlaps(&shifted))
                .count()
        })
        .sum()
}

/// Delay search with an optional dedicated worker pool.
///
/// Without a pool the global rayon pool is used. The result never depends on
/// the number of workers.
#[derive(Debug, Default)]
pub struct DelaySearch {
    pool: Option<ThreadPool>,
}

impl DelaySearch {
    /// Search on the global rayon pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Search on a dedicated pool with `workers` threads.
    pub fn with_workers(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("overlap-worker-{}", i))
            .build()?;
        Ok(Self { pool: Some(pool) })
    }

    /// Number of threads overlap counting will fan out to.
    pub fn workers(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Run the search and return the full outcome.
    pub fn search(
        &self,
        own_windows: &[ExecutionWindow],
        interval_seconds: i32,
        avg_duration_seconds: i32,
        competitor_windows: &[ExecutionWindow],
    ) -> SearchOutcome {
        let run = || {
            search_candidates(
                own_windows,
                interval_seconds,
                avg_duration_seconds,
                competitor_windows,
            )
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    /// Run the search and return only the selected delay.
    pub fn find_delay(
        &self,
        own_windows: &[ExecutionWindow],
        interval_seconds: i32,
        avg_duration_seconds: i32,
        competitor_windows: &[ExecutionWindow],
    ) -> i32 {
        self.search(
            own_windows,
            interval_seconds,
            avg_duration_seconds,
            competitor_windows,
        )
        .delay
    }
}

/// Select a delay for one job on the global rayon pool.
///
/// `own_windows` are the job's unshifted windows; `competitor_windows` are the
/// other jobs' windows already shifted by their committed delays.
pub fn find_delay(
    own_windows: &[ExecutionWindow],
    interval_seconds: i32,
    avg_duration_seconds: i32,
    competitor_windows: &[ExecutionWindow],
) -> i32 {
    DelaySearch::new().find_delay(
        own_windows,
        interval_seconds,
        avg_duration_seconds,
        competitor_windows,
    )
}

fn search_candidates(
    own_windows: &[ExecutionWindow],
    interval_seconds: i32,
    avg_duration_seconds: i32,
    competitor_windows: &[ExecutionWindow],
) -> SearchOutcome {
    let limit = loop_limit(interval_seconds, avg_duration_seconds);

    if limit <= 0 {
        debug!(
            "Loop limit {} leaves no candidates (interval {}s, avg duration {}s), delay 0",
            limit, interval_seconds, avg_duration_seconds
        );
        return SearchOutcome {
            delay: 0,
            loop_limit: limit,
            initial_overlaps: None,
            final_overlaps: None,
            trajectory: Vec::new(),
        };
    }

    let mut trajectory = Vec::new();
    let mut best: Option<(i32, usize)> = None;
    let mut initial = None;

    for candidate in (0..limit).step_by(CANDIDATE_STEP) {
        let overlap_count = count_overlaps(own_windows, candidate, competitor_windows);
        trajectory.push((candidate, overlap_count));

        match best {
            None => {
                debug!("Initial overlaps: {}", overlap_count);
                initial = Some(overlap_count);
                best = Some((NO_IMPROVEMENT_DELAY, overlap_count));
            }
            Some((_, last_overlap_count)) if overlap_count < last_overlap_count => {
                best = Some((candidate, overlap_count));
            }
            Some(_) => {}
        }

        if overlap_count == 0 {
            break;
        }
    }

    // limit > 0 guarantees candidate 0 was evaluated
    let (delay, final_overlaps) = best.unwrap_or((0, 0));
    info!("Delay: {}, final overlaps: {}", delay, final_overlaps);

    SearchOutcome {
        delay,
        loop_limit: limit,
        initial_overlaps: initial,
        final_overlaps: Some(final_overlaps),
        trajectory,
    }
}
