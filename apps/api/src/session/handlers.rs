//! Axum route handlers for sign-up, sign-in and the session state.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::context::SessionSnapshot;
use crate::session::extract::CurrentSession;
use crate::session::identity::validate_credentials;
use crate::session::users::Role;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: Uuid,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub session: SessionSnapshot,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/register
///
/// Creates the account, stores a user record with the `user` role and signs in.
pub async fn handle_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    validate_credentials(&request.email, &request.password)?;

    let identity = state
        .identity
        .sign_up(
            &request.email,
            &request.password,
            request.display_name.as_deref(),
        )
        .await?;
    if let Err(e) = state.users.upsert_user(&identity, Role::User).await {
        error!(
            "Account {} was created but its user record was not stored: {e}",
            identity.uid
        );
        return Err(e);
    }

    let (token, session) = state.sessions.open(identity, state.users.clone()).await;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            session: session.snapshot(),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Recreates a missing user record with the `user` role. The returned session may still be `role_pending`; poll GET /api/v1/session for the role.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    validate_credentials(&request.email, &request.password)?;

    let identity = state
        .identity
        .sign_in(&request.email, &request.password)
        .await?;
    info!("User {} signed in", identity.uid);

    match state.users.ensure_user(&identity).await {
        Ok(true) => warn!("Restored missing user record for {}", identity.uid),
        Ok(false) => {}
        Err(e) => warn!("Could not check the user record for {}: {e}", identity.uid),
    }

    let (token, session) = state.sessions.open(identity, state.users.clone()).await;
    Ok(Json(SessionResponse {
        token,
        session: session.snapshot(),
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<LogoutResponse>, AppError> {
    let session = state
        .sessions
        .close(current.token)
        .await
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(LogoutResponse { session }))
}

/// GET /api/v1/session
pub async fn handle_get_session(current: CurrentSession) -> Json<SessionSnapshot> {
    Json(current.snapshot())
}
