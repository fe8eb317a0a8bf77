use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::ownership::{self, OWNER_FIELD};
use crate::models::job::JobRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Applied,
    Interviewed,
    Rejected,
    Hired,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Interviewed,
        JobStatus::Rejected,
        JobStatus::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "applied",
            JobStatus::Interviewed => "interviewed",
            JobStatus::Rejected => "rejected",
            JobStatus::Hired => "hired",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "status must be one of applied, interviewed, rejected, hired (got '{s}')"
                ))
            })
    }
}

/// Which records an operation may see or touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
    /// Records owned by this uid, under any recognised owner field.
    Owner(String),
    /// Every record. Only granted to admins.
    Any,
}

impl OwnerScope {
    pub fn permits(&self, doc: &Value) -> bool {
        match self {
            OwnerScope::Any => true,
            OwnerScope::Owner(uid) => ownership::is_owned_by(doc, uid),
        }
    }
}

/// A job application as seen by the rest of the system, with the owner field normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: Uuid,
    pub owner_id: String,
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<JobRow> for JobApplication {
    fn from(row: JobRow) -> Self {
        let text = |field: &str| {
            row.doc
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let owner_id = ownership::resolve_owner(&row.doc)
            .unwrap_or_else(|| {
                warn!("Job {} has no owner field", row.id);
                ""
            })
            .to_string();

        let status = match row.doc.get("status").and_then(Value::as_str) {
            None | Some("") => JobStatus::Applied,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Job {} has unrecognised status '{raw}', reading as applied", row.id);
                JobStatus::Applied
            }),
        };

        JobApplication {
            id: row.id,
            company: text("company"),
            position: text("position"),
            owner_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a record. Status defaults to `applied`.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub company: String,
    pub position: String,
    pub status: Option<JobStatus>,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("company", &self.company)?;
        require_text("position", &self.position)
    }

    /// The stored document. Only the canonical owner field is ever written.
    pub fn to_document(&self, owner_id: &str) -> Value {
        json!({
            OWNER_FIELD: owner_id,
            "company": self.company.trim(),
            "position": self.position.trim(),
            "status": self.status.unwrap_or_default().as_str(),
        })
    }
}

/// Partial update of the mutable fields. The owner is never part of an update.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<JobStatus>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.company.is_none() && self.position.is_none() && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::Validation(
                "update must change at least one of company, position, status".to_string(),
            ));
        }
        if let Some(company) = &self.company {
            require_text("company", company)?;
        }
        if let Some(position) = &self.position {
            require_text("position", position)?;
        }
        Ok(())
    }

    /// JSON object merged into the stored document.
    pub fn to_patch(&self) -> Value {
        let mut patch = Map::new();
        if let Some(company) = &self.company {
            patch.insert("company".into(), Value::from(company.trim()));
        }
        if let Some(position) = &self.position {
            patch.insert("position".into(), Value::from(position.trim()));
        }
        if let Some(status) = self.status {
            patch.insert("status".into(), Value::from(status.as_str()));
        }
        Value::Object(patch)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(doc: Value) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            doc,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_status_parses_all_four_values() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_unknown_value() {
        assert!(matches!(
            "bogus".parse::<JobStatus>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Interviewed).unwrap(),
            r#""interviewed""#
        );
    }

    #[test]
    fn test_new_job_defaults_to_applied_and_canonical_owner() {
        let job = NewJob {
            company: " Acme ".into(),
            position: "Engineer".into(),
            status: None,
        };
        let doc = job.to_document("u1");
        assert_eq!(doc["status"], "applied");
        assert_eq!(doc["ownerId"], "u1");
        assert_eq!(doc["company"], "Acme");
        assert!(doc.get("uid").is_none());
    }

    #[test]
    fn test_new_job_requires_company_and_position() {
        let job = NewJob {
            company: "  ".into(),
            position: "Engineer".into(),
            status: None,
        };
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_legacy_row_is_normalised() {
        let app = JobApplication::from(row(json!({
            "userId": "u7",
            "company": "Initech",
            "position": "Analyst",
            "status": "interviewed"
        })));
        assert_eq!(app.owner_id, "u7");
        assert_eq!(app.status, JobStatus::Interviewed);
    }

    #[test]
    fn test_row_with_unknown_or_missing_status_reads_as_applied() {
        let unknown = JobApplication::from(row(json!({"uid": "u1", "status": "ghosted"})));
        let missing = JobApplication::from(row(json!({"uid": "u1"})));
        assert_eq!(unknown.status, JobStatus::Applied);
        assert_eq!(missing.status, JobStatus::Applied);
        assert_eq!(missing.company, "");
    }

    #[test]
    fn test_update_patch_contains_only_changed_fields() {
        let patch = JobUpdate::status(JobStatus::Hired).to_patch();
        assert_eq!(patch, json!({"status": "hired"}));
    }

    #[test]
    fn test_empty_update_is_rejected() {
        assert!(JobUpdate::default().validate().is_err());
    }

    #[test]
    fn test_owner_scope_matches_legacy_fields() {
        let scope = OwnerScope::Owner("u1".into());
        assert!(scope.permits(&json!({"createdBy": "u1"})));
        assert!(!scope.permits(&json!({"ownerId": "u2"})));
        assert!(OwnerScope::Any.permits(&json!({})));
    }
}
