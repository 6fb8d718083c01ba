//! Sequential greedy pass over a job set.
//!
//! Jobs are visited in the order they were supplied. Each job is searched
//! against every other job's windows shifted by whatever delay that job holds
//! at that moment, and its own delay is committed before the next job starts.
//! Later jobs therefore see the delays chosen for earlier ones.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::search::{DelaySearch, SearchOutcome};
use crate::models::{DelayRecord, ExecutionWindow, Job};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JobSetError {
    #[error("Duplicate job id: {0}")]
    DuplicateJobId(String),

    #[error("Unknown job id: {0}")]
    UnknownJob(String),
}

/// Search result for one job of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub job_name: String,
    pub competitor_windows: usize,
    pub outcome: SearchOutcome,
}

/// Windows of every job except `exclude_id`, each shifted by its job's
/// current delay and ordered by shifted start.
pub fn build_competitor_windows(jobs: &[Job], exclude_id: &str) -> Vec<ExecutionWindow> {
    let mut windows: Vec<ExecutionWindow> = jobs
        .iter()
        .filter(|job| job.id != exclude_id)
        .flat_map(|job| job.shifted_windows())
        .collect();
    windows.sort_by(|a, b| a.start.total_cmp(&b.start));
    windows
}

/// The jobs of one run, in processing order.
#[derive(Debug, Clone)]
pub struct JobSet {
    jobs: Vec<Job>,
}

impl JobSet {
    /// Build a job set, rejecting duplicate ids.
    pub fn new(jobs: Vec<Job>) -> Result<Self, JobSetError> {
        let mut seen = HashSet::with_capacity(jobs.len());
        for job in &jobs {
            if !seen.insert(job.id.as_str()) {
                return Err(JobSetError::DuplicateJobId(job.id.clone()));
            }
        }
        Ok(Self { jobs })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// See [`build_competitor_windows`].
    pub fn competitor_windows(&self, exclude_id: &str) -> Vec<ExecutionWindow> {
        build_competitor_windows(&self.jobs, exclude_id)
    }

    /// Set the delay of job `id`. This is the only path that writes a delay.
    pub fn commit_delay(&mut self, id: &str, delay_seconds: i32) -> Result<(), JobSetError> {
        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| JobSetError::UnknownJob(id.to_string()))?;
        job.set_delay(delay_seconds);
        Ok(())
    }

    /// Run the sequential pass, committing each job's delay in turn.
    pub fn run(&mut self, search: &DelaySearch) -> Result<Vec<JobOutcome>, JobSetError> {
        info!(
            "Checking overlaps for {} jobs ({} workers)",
            self.jobs.len(),
            search.workers()
        );

        let mut outcomes = Vec::with_capacity(self.jobs.len());
        for index in 0..self.jobs.len() {
            let (job_id, job_name, outcome, competitor_count) = {
                let job = &self.jobs[index];
                info!("Getting overlap data for job: {}", job.id);

                let competitors = self.competitor_windows(&job.id);
                debug!(
                    "Job {} has {} own windows against {} competitor windows",
                    job.id,
                    job.windows().len(),
                    competitors.len()
                );

                let outcome = search.search(
                    job.windows(),
                    job.interval_seconds,
                    job.avg_duration_seconds,
                    &competitors,
                );
                (job.id.clone(), job.name.clone(), outcome, competitors.len())
            };

            self.commit_delay(&job_id, outcome.delay)?;
            info!(
                "Job {} delay {}s ({})",
                job_id,
                outcome.delay,
                if outcome.is_degenerate() {
                    "no candidates"
                } else if outcome.fully_separated() {
                    "fully separated"
                } else {
                    "overlaps remain"
                }
            );
            outcomes.push(JobOutcome {
                job_id,
                job_name,
                competitor_windows: competitor_count,
                outcome,
            });
        }

        Ok(outcomes)
    }

    /// `(job_name, delay)` pairs in job order.
    pub fn delay_records(&self) -> Vec<DelayRecord> {
        self.jobs
            .iter()
            .map(|job| DelayRecord {
                job_name: job.name.clone(),
                delay_seconds: job.delay_seconds(),
            })
            .collect()
    }
}
