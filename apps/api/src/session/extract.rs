use std::sync::Arc;
use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::models::OwnerScope;
use crate::session::context::SessionSnapshot;
use crate::session::identity::Identity;
use crate::session::registry::LoginSession;
use crate::state::AppState;

/// How long an admin-only request waits for an outstanding role lookup.
const ROLE_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// The login session named by the request's bearer token.
pub struct CurrentSession {
    pub token: Uuid,
    pub session: Arc<LoginSession>,
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = state.sessions.get(token).ok_or(AppError::Unauthorized)?;
        Ok(Self { token, session })
    }
}

impl CurrentSession {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// The signed-in user, or 401 for a session without one.
    pub fn identity(&self) -> Result<Identity, AppError> {
        self.snapshot().user.ok_or(AppError::Unauthorized)
    }

    /// Records a regular user may see and change.
    pub fn owner_scope(&self) -> Result<OwnerScope, AppError> {
        Ok(OwnerScope::Owner(self.identity()?.uid))
    }

    /// Waits briefly for the role lookup, then requires a resolved admin role.
    pub async fn require_admin(&self) -> Result<Identity, AppError> {
        let identity = self.identity()?;
        let snapshot = tokio::time::timeout(ROLE_SETTLE_TIMEOUT, self.session.context().settled())
            .await
            .unwrap_or_else(|_| self.snapshot());
        if !snapshot.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {token}")).unwrap(),
        );
        assert!(bearer_token(&headers).is_none());
    }
}
