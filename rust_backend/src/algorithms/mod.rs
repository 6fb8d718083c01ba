//! Delay selection algorithms.
//!
//! # Components
//!
//! - [`search`]: greedy even-step delay search for a single job, with the
//!   inner overlap count fanned out over a rayon pool
//! - [`coordinator`]: the sequential pass over a [`JobSet`] that builds each
//!   job's competitor windows and commits its delay
//!
//! # Example
//!
//! ```
//! use job_overlap::algorithms::{DelaySearch, JobSet};
//! use job_overlap::models::{ExecutionWindow, Job};
//!
//! let mut jobs = JobSet::new(vec![
//!     Job::new("x", "Extract", 3600, 60, vec![ExecutionWindow::new(0.0, 100.0)]),
//!     Job::new("y", "Load", 3600, 60, vec![ExecutionWindow::new(50.0, 150.0)]),
//! ])
//! .unwrap();
//! jobs.run(&DelaySearch::new()).unwrap();
//! assert_eq!(jobs.get("x").unwrap().delay_seconds(), 152);
//! ```

pub mod coordinator;
pub mod search;

pub use coordinator::{build_competitor_windows, JobOutcome, JobSet, JobSetError};
pub use search::{
    count_overlaps, find_delay, loop_limit, DelaySearch, SearchOutcome, CANDIDATE_STEP,
    NO_IMPROVEMENT_DELAY,
};
