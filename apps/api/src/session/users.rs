use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::session::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// User records keyed by identity uid.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `None` when the record is missing or carries an unknown role.
    async fn fetch_role(&self, uid: &str) -> Result<Option<Role>, AppError>;

    async fn upsert_user(&self, identity: &Identity, role: Role) -> Result<(), AppError>;

    /// Creates a `user` record when none exists. Returns true when one was created.
    async fn ensure_user(&self, identity: &Identity) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn fetch_role(&self, uid: &str) -> Result<Option<Role>, AppError> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE uid = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        let Some(user) = user else {
            info!("No user record for {uid}");
            return Ok(None);
        };

        let role = Role::parse(&user.role);
        if role.is_none() {
            warn!("User {} has unknown role '{}'", user.uid, user.role);
        }
        Ok(role)
    }

    async fn upsert_user(&self, identity: &Identity, role: Role) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (uid, email, display_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (uid) DO UPDATE
                SET email = EXCLUDED.email, display_name = EXCLUDED.display_name
            "#,
        )
        .bind(&identity.uid)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        info!("Stored user record for {}", identity.uid);
        Ok(())
    }

    async fn ensure_user(&self, identity: &Identity) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (uid, email, display_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (uid) DO NOTHING
            "#,
        )
        .bind(&identity.uid)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(Role::User.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
