//! Job Repository: data access for the `job_applications` document collection.
//!
//! Every read and mutation takes an `OwnerScope`, so ownership is enforced here and
//! not only by callers. A record outside the scope behaves as if it did not exist.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::models::{JobApplication, JobStatus, JobUpdate, NewJob, OwnerScope};
use crate::jobs::ownership::sql_predicate;
use crate::models::job::JobRow;

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persists a new record and returns the generated id.
    async fn create(&self, job: &NewJob, owner_id: &str) -> Result<Uuid, AppError>;

    async fn get(&self, id: Uuid, scope: &OwnerScope) -> Result<Option<JobApplication>, AppError>;

    /// Newest first.
    async fn list(&self, scope: &OwnerScope) -> Result<Vec<JobApplication>, AppError>;

    /// Records with the given status, newest first.
    async fn list_by_status(
        &self,
        scope: &OwnerScope,
        status: JobStatus,
    ) -> Result<Vec<JobApplication>, AppError>;

    /// Merges the changed fields and stamps `updated_at`.
    async fn update(
        &self,
        id: Uuid,
        scope: &OwnerScope,
        changes: &JobUpdate,
    ) -> Result<(), AppError>;

    /// Permanent delete.
    async fn delete(&self, id: Uuid, scope: &OwnerScope) -> Result<(), AppError>;

    async fn list_all(&self) -> Result<Vec<JobApplication>, AppError> {
        self.list(&OwnerScope::Any).await
    }

    async fn list_owned(&self, owner_id: &str) -> Result<Vec<JobApplication>, AppError> {
        self.list(&OwnerScope::Owner(owner_id.to_string())).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        scope: &OwnerScope,
        status: JobStatus,
    ) -> Result<(), AppError> {
        self.update(id, scope, &JobUpdate::status(status)).await
    }
}

pub(crate) fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job application {id} not found"))
}

const SELECT_JOBS: &str = "SELECT id, doc, created_at, updated_at FROM job_applications";

/// PostgreSQL-backed repository storing each record as a JSONB document.
#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the owner condition for `scope`, using bind parameter `$param`.
/// The owner is bound only when the scope adds the condition.
fn scoped(sql: String, scope: &OwnerScope, param: usize) -> String {
    match scope {
        OwnerScope::Any => sql,
        OwnerScope::Owner(_) => format!("{sql} AND {}", sql_predicate(param)),
    }
}

/// Condition selecting records that read back with `status`, using bind parameter `$param`.
/// A missing, empty or unrecognised stored status reads as the default, so the default
/// status also matches those records.
fn status_predicate(status: JobStatus, param: usize) -> String {
    let exact = format!("btrim(doc->>'status') = ${param}");
    if status != JobStatus::default() {
        return exact;
    }
    let known: Vec<String> = JobStatus::ALL
        .iter()
        .map(|status| format!("'{}'", status.as_str()))
        .collect();
    format!(
        "({exact} OR doc->>'status' IS NULL OR btrim(doc->>'status') NOT IN ({}))",
        known.join(", ")
    )
}

fn scope_owner(scope: &OwnerScope) -> Option<&str> {
    match scope {
        OwnerScope::Any => None,
        OwnerScope::Owner(uid) => Some(uid.as_str()),
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, job: &NewJob, owner_id: &str) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO job_applications (id, doc, created_at) VALUES ($1, $2, now())")
            .bind(id)
            .bind(job.to_document(owner_id))
            .execute(&self.pool)
            .await?;

        info!("Created job application {id} for owner {owner_id}");
        Ok(id)
    }

    async fn get(&self, id: Uuid, scope: &OwnerScope) -> Result<Option<JobApplication>, AppError> {
        let sql = scoped(format!("{SELECT_JOBS} WHERE id = $1"), scope, 2);
        let mut query = sqlx::query_as::<_, JobRow>(&sql).bind(id);
        if let Some(owner) = scope_owner(scope) {
            query = query.bind(owner);
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(JobApplication::from))
    }

    async fn list(&self, scope: &OwnerScope) -> Result<Vec<JobApplication>, AppError> {
        let sql = format!(
            "{} ORDER BY created_at DESC",
            scoped(format!("{SELECT_JOBS} WHERE TRUE"), scope, 1)
        );
        let mut query = sqlx::query_as::<_, JobRow>(&sql);
        if let Some(owner) = scope_owner(scope) {
            query = query.bind(owner);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(JobApplication::from).collect())
    }

    async fn list_by_status(
        &self,
        scope: &OwnerScope,
        status: JobStatus,
    ) -> Result<Vec<JobApplication>, AppError> {
        let sql = format!(
            "{} ORDER BY created_at DESC",
            scoped(
                format!("{SELECT_JOBS} WHERE {}", status_predicate(status, 1)),
                scope,
                2
            )
        );
        let mut query = sqlx::query_as::<_, JobRow>(&sql).bind(status.as_str());
        if let Some(owner) = scope_owner(scope) {
            query = query.bind(owner);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(JobApplication::from).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        scope: &OwnerScope,
        changes: &JobUpdate,
    ) -> Result<(), AppError> {
        changes.validate()?;
        let sql = scoped(
            "UPDATE job_applications SET doc = doc || $2, updated_at = now() WHERE id = $1"
                .to_string(),
            scope,
            3,
        );
        let mut query = sqlx::query(&sql).bind(id).bind(changes.to_patch());
        if let Some(owner) = scope_owner(scope) {
            query = query.bind(owner);
        }
        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        info!("Updated job application {id}");
        Ok(())
    }

    async fn delete(&self, id: Uuid, scope: &OwnerScope) -> Result<(), AppError> {
        let sql = scoped(
            "DELETE FROM job_applications WHERE id = $1".to_string(),
            scope,
            2,
        );
        let mut query = sqlx::query(&sql).bind(id);
        if let Some(owner) = scope_owner(scope) {
            query = query.bind(owner);
        }
        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        info!("Deleted job application {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_any_scope_adds_no_condition() {
        let sql = scoped("SELECT 1 WHERE id = $1".into(), &OwnerScope::Any, 2);
        assert_eq!(sql, "SELECT 1 WHERE id = $1");
    }

    #[test]
    fn test_owner_scope_appends_owner_predicate() {
        let sql = scoped(
            "DELETE FROM job_applications WHERE id = $1".into(),
            &OwnerScope::Owner("u1".into()),
            2,
        );
        assert!(sql.starts_with("DELETE FROM job_applications WHERE id = $1 AND (doc->>'ownerId' = $2"));
        assert!(sql.ends_with("doc->>'createdBy' = $2)"));
    }

    #[test]
    fn test_default_status_predicate_matches_unreadable_statuses() {
        assert_eq!(
            status_predicate(JobStatus::Applied, 1),
            "(btrim(doc->>'status') = $1 OR doc->>'status' IS NULL \
             OR btrim(doc->>'status') NOT IN ('applied', 'interviewed', 'rejected', 'hired'))"
        );
    }

    #[test]
    fn test_other_status_predicates_match_exactly() {
        for status in JobStatus::ALL {
            if status == JobStatus::default() {
                continue;
            }
            assert_eq!(status_predicate(status, 1), "btrim(doc->>'status') = $1");
        }
    }

    /// Runs against a live database:
    /// `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`
    #[tokio::test]
    #[ignore] // Requires a PostgreSQL instance
    async fn test_list_by_status_agrees_with_list_on_stored_documents() {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL not set");
        let pool = crate::db::create_pool(&url).await.unwrap();
        let repo = PgJobRepository::new(pool.clone());
        let owner = Uuid::new_v4().to_string();

        let stored = [
            json!({"userId": owner, "company": "Missing", "position": "Dev"}),
            json!({"uid": owner, "company": "Empty", "position": "Dev", "status": ""}),
            json!({"ownerId": owner, "company": "Odd", "position": "Dev", "status": "pending"}),
            json!({"ownerId": owner, "company": "Numeric", "position": "Dev", "status": 3}),
            json!({"createdBy": owner, "company": "Padded", "position": "Dev", "status": " hired "}),
            json!({"ownerId": owner, "company": "Plain", "position": "Dev", "status": "rejected"}),
        ];
        for doc in &stored {
            sqlx::query("INSERT INTO job_applications (id, doc, created_at) VALUES ($1, $2, now())")
                .bind(Uuid::new_v4())
                .bind(doc)
                .execute(&pool)
                .await
                .unwrap();
        }

        let scope = OwnerScope::Owner(owner.clone());
        let all = repo.list(&scope).await.unwrap();
        assert_eq!(all.len(), stored.len());
        for status in JobStatus::ALL {
            let mut expected: Vec<String> = all
                .iter()
                .filter(|job| job.status == status)
                .map(|job| job.company.clone())
                .collect();
            let mut listed: Vec<String> = repo
                .list_by_status(&scope, status)
                .await
                .unwrap()
                .into_iter()
                .map(|job| job.company)
                .collect();
            expected.sort();
            listed.sort();
            assert_eq!(listed, expected, "status {status}");
        }

        let cleanup = format!("DELETE FROM job_applications WHERE {}", sql_predicate(1));
        sqlx::query(&cleanup)
            .bind(&owner)
            .execute(&pool)
            .await
            .unwrap();
    }
}
