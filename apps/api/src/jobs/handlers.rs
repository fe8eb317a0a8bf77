//! Axum route handlers for the Jobs API.
//!
//! Every mutation is followed by a reload of the session's job mirror, and the
//! response carries the reloaded list and statistics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::cache::{JobCache, JobFilter, StatusFilter};
use crate::jobs::models::{JobApplication, JobStatus, JobUpdate, NewJob, OwnerScope};
use crate::jobs::repository::not_found;
use crate::jobs::stats::JobStats;
use crate::session::extract::CurrentSession;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// A status or `all`.
    pub status: Option<String>,
    pub company: Option<String>,
}

impl JobListQuery {
    fn filter(&self) -> Result<JobFilter, AppError> {
        Ok(JobFilter {
            status: StatusFilter::parse(self.status.as_deref())?,
            company: self.company.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobApplication>,
    /// Counts over every record in scope, regardless of the filter.
    pub stats: JobStats,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct JobMutationResponse {
    pub id: Uuid,
    /// The record after reload; absent once deleted.
    pub job: Option<JobApplication>,
    pub jobs: Vec<JobApplication>,
    pub stats: JobStats,
}

/// `None` and empty mean "not given"; anything else must be a known status.
fn parse_status(raw: Option<&str>) -> Result<Option<JobStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

fn mutation_response(id: Uuid, cache: &JobCache) -> JobMutationResponse {
    JobMutationResponse {
        id,
        job: cache.find(id).cloned(),
        jobs: cache.jobs().to_vec(),
        stats: cache.stats(),
    }
}

/// Reloads the session mirror for `scope` and reports the state of `id`.
async fn reload_after_mutation(
    state: &AppState,
    current: &CurrentSession,
    scope: &OwnerScope,
    id: Uuid,
) -> Result<JobMutationResponse, AppError> {
    let mut cache = current.session.jobs.write().await;
    cache.reload(state.jobs.as_ref(), scope).await?;
    Ok(mutation_response(id, &cache))
}

/// The admin view is rebuilt per request and never replaces the session's own mirror.
async fn reload_admin_view(state: &AppState, id: Uuid) -> Result<JobMutationResponse, AppError> {
    let mut cache = JobCache::default();
    cache.reload(state.jobs.as_ref(), &OwnerScope::Any).await?;
    Ok(mutation_response(id, &cache))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs?status=&company=
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let scope = current.owner_scope()?;
    let filter = query.filter()?;

    let mut cache = current.session.jobs.write().await;
    cache.reload(state.jobs.as_ref(), &scope).await?;

    Ok(Json(JobListResponse {
        jobs: cache.filtered(&filter),
        stats: cache.stats(),
        loaded_at: cache.loaded_at(),
    }))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobMutationResponse>), AppError> {
    let identity = current.identity()?;
    let job = NewJob {
        company: request.company,
        position: request.position,
        status: parse_status(request.status.as_deref())?,
    };
    job.validate()?;

    let id = state.jobs.create(&job, &identity.uid).await?;
    let scope = OwnerScope::Owner(identity.uid);
    let response = reload_after_mutation(&state, &current, &scope, id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/jobs/stats
pub async fn handle_job_stats(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<JobStats>, AppError> {
    let scope = current.owner_scope()?;
    let mut cache = current.session.jobs.write().await;
    cache.reload(state.jobs.as_ref(), &scope).await?;
    Ok(Json(cache.stats()))
}

/// GET /api/v1/jobs/status/:status
pub async fn handle_list_jobs_by_status(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(status): Path<String>,
) -> Result<Json<Vec<JobApplication>>, AppError> {
    let scope = current.owner_scope()?;
    let status: JobStatus = status.parse()?;
    let jobs = state.jobs.list_by_status(&scope, status).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<JobApplication>, AppError> {
    let scope = current.owner_scope()?;
    let job = state
        .jobs
        .get(id, &scope)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(job))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateJobRequest>,
) -> Result<Json<JobMutationResponse>, AppError> {
    let scope = current.owner_scope()?;
    let changes = JobUpdate {
        company: request.company,
        position: request.position,
        status: parse_status(request.status.as_deref())?,
    };
    state.jobs.update(id, &scope, &changes).await?;
    Ok(Json(reload_after_mutation(&state, &current, &scope, id).await?))
}

/// PATCH /api/v1/jobs/:id/status
pub async fn handle_update_job_status(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<JobMutationResponse>, AppError> {
    let scope = current.owner_scope()?;
    let status: JobStatus = request.status.parse()?;
    state.jobs.update_status(id, &scope, status).await?;
    Ok(Json(reload_after_mutation(&state, &current, &scope, id).await?))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<JobMutationResponse>, AppError> {
    let scope = current.owner_scope()?;
    state.jobs.delete(id, &scope).await?;
    Ok(Json(reload_after_mutation(&state, &current, &scope, id).await?))
}

/// GET /api/v1/admin/jobs?status=&company=
pub async fn handle_admin_list_jobs(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    current.require_admin().await?;
    let filter = query.filter()?;

    let mut cache = JobCache::default();
    cache.reload(state.jobs.as_ref(), &OwnerScope::Any).await?;

    Ok(Json(JobListResponse {
        jobs: cache.filtered(&filter),
        stats: cache.stats(),
        loaded_at: cache.loaded_at(),
    }))
}

/// PATCH /api/v1/admin/jobs/:id/status
pub async fn handle_admin_update_job_status(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<JobMutationResponse>, AppError> {
    current.require_admin().await?;
    let status: JobStatus = request.status.parse()?;
    state.jobs.update_status(id, &OwnerScope::Any, status).await?;
    Ok(Json(reload_admin_view(&state, id).await?))
}

/// DELETE /api/v1/admin/jobs/:id
pub async fn handle_admin_delete_job(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<JobMutationResponse>, AppError> {
    current.require_admin().await?;
    state.jobs.delete(id, &OwnerScope::Any).await?;
    Ok(Json(reload_admin_view(&state, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_treats_blank_as_absent() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_status(Some("rejected")).unwrap(),
            Some(JobStatus::Rejected)
        );
        assert!(parse_status(Some("bogus")).is_err());
    }

    #[test]
    fn test_list_query_builds_filter() {
        let query = JobListQuery {
            status: Some("all".into()),
            company: Some("acme".into()),
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.status, StatusFilter::All);
        assert_eq!(filter.company.as_deref(), Some("acme"));

        let bad = JobListQuery {
            status: Some("ghosted".into()),
            company: None,
        };
        assert!(bad.filter().is_err());
    }
}
