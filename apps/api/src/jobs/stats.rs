use serde::{Deserialize, Serialize};

use crate::jobs::models::{JobApplication, JobStatus};

/// Per-status counts shown on the profile and dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub total: usize,
    pub applied: usize,
    pub interviewed: usize,
    pub rejected: usize,
    pub hired: usize,
}

pub fn compute_stats(jobs: &[JobApplication]) -> JobStats {
    jobs.iter().fold(JobStats::default(), |mut stats, job| {
        stats.total += 1;
        match job.status {
            JobStatus::Applied => stats.applied += 1,
            JobStatus::Interviewed => stats.interviewed += 1,
            JobStatus::Rejected => stats.rejected += 1,
            JobStatus::Hired => stats.hired += 1,
        }
        stats
    })
}
