//! Per-session mirror of job records.
//!
//! The mirror is only ever replaced by a full reload from the repository. Callers
//! reload after every mutation before deriving filtered lists or statistics; nothing
//! is applied to the mirror optimistically.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::models::{JobApplication, JobStatus, OwnerScope};
use crate::jobs::repository::JobRepository;
use crate::jobs::stats::{compute_stats, JobStats};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(JobStatus),
}

impl StatusFilter {
    /// `None`, empty and `"all"` select everything.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(StatusFilter::All),
            Some(value) => Ok(StatusFilter::Only(value.parse()?)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: StatusFilter,
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &JobApplication) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => job.status == status,
        };
        let company_ok = match self.company.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => job
                .company
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };
        status_ok && company_ok
    }
}

#[derive(Debug, Default)]
pub struct JobCache {
    jobs: Vec<JobApplication>,
    loaded_at: Option<DateTime<Utc>>,
}

impl JobCache {
    /// Replaces the mirror with the repository's current view of `scope`.
    pub async fn reload(
        &mut self,
        repo: &dyn JobRepository,
        scope: &OwnerScope,
    ) -> Result<&[JobApplication], AppError> {
        self.jobs = match scope {
            OwnerScope::Any => repo.list_all().await?,
            OwnerScope::Owner(uid) => repo.list_owned(uid).await?,
        };
        self.loaded_at = Some(Utc::now());
        Ok(&self.jobs)
    }

    pub fn jobs(&self) -> &[JobApplication] {
        &self.jobs
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn find(&self, id: Uuid) -> Option<&JobApplication> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn filtered(&self, filter: &JobFilter) -> Vec<JobApplication> {
        self.jobs
            .iter()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> JobStats {
        compute_stats(&self.jobs)
    }
}
