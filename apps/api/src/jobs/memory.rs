//! In-memory `JobRepository` used by tests. Stores raw documents so records with
//! legacy owner fields can be seeded directly.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::models::{JobApplication, JobStatus, JobUpdate, NewJob, OwnerScope};
use crate::jobs::repository::{not_found, JobRepository};
use crate::models::job::JobRow;

#[derive(Default)]
pub struct MemoryJobRepository {
    rows: RwLock<Vec<JobRow>>,
}

impl MemoryJobRepository {
    /// Inserts a document as-is, bypassing `NewJob`.
    pub async fn insert_raw(&self, doc: Value) -> Uuid {
        let id = Uuid::new_v4();
        self.rows.write().await.push(JobRow {
            id,
            doc,
            created_at: Utc::now(),
            updated_at: None,
        });
        id
    }

    pub async fn raw_doc(&self, id: Uuid) -> Option<Value> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.doc.clone())
    }

    async fn select(&self, scope: &OwnerScope, status: Option<JobStatus>) -> Vec<JobApplication> {
        let mut jobs: Vec<JobApplication> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| scope.permits(&row.doc))
            .cloned()
            .map(JobApplication::from)
            .filter(|job| status.map_or(true, |s| job.status == s))
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn create(&self, job: &NewJob, owner_id: &str) -> Result<Uuid, AppError> {
        Ok(self.insert_raw(job.to_document(owner_id)).await)
    }

    async fn get(&self, id: Uuid, scope: &OwnerScope) -> Result<Option<JobApplication>, AppError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|row| row.id == id && scope.permits(&row.doc))
            .cloned()
            .map(JobApplication::from))
    }

    async fn list(&self, scope: &OwnerScope) -> Result<Vec<JobApplication>, AppError> {
        Ok(self.select(scope, None).await)
    }

    async fn list_by_status(
        &self,
        scope: &OwnerScope,
        status: JobStatus,
    ) -> Result<Vec<JobApplication>, AppError> {
        Ok(self.select(scope, Some(status)).await)
    }

    async fn update(
        &self,
        id: Uuid,
        scope: &OwnerScope,
        changes: &JobUpdate,
    ) -> Result<(), AppError> {
        changes.validate()?;
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id && scope.permits(&row.doc))
            .ok_or_else(|| not_found(id))?;

        if let (Value::Object(doc), Value::Object(patch)) = (&mut row.doc, changes.to_patch()) {
            doc.extend(patch);
        }
        row.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete(&self, id: Uuid, scope: &OwnerScope) -> Result<(), AppError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !(row.id == id && scope.permits(&row.doc)));
        if rows.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}
