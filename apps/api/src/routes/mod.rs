pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::jobs::handlers as jobs;
use crate::resume::handlers as resume;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/auth/register", post(session::handle_register))
        .route("/api/v1/auth/login", post(session::handle_login))
        .route("/api/v1/auth/logout", post(session::handle_logout))
        .route("/api/v1/session", get(session::handle_get_session))
        // Jobs API
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/v1/jobs/stats", get(jobs::handle_job_stats))
        .route(
            "/api/v1/jobs/status/:status",
            get(jobs::handle_list_jobs_by_status),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route(
            "/api/v1/jobs/:id/status",
            patch(jobs::handle_update_job_status),
        )
        // Admin API (role-gated)
        .route("/api/v1/admin/jobs", get(jobs::handle_admin_list_jobs))
        .route(
            "/api/v1/admin/jobs/:id",
            delete(jobs::handle_admin_delete_job),
        )
        .route(
            "/api/v1/admin/jobs/:id/status",
            patch(jobs::handle_admin_update_job_status),
        )
        // Chat API
        .route(
            "/api/v1/chats",
            get(chat::handle_list_chats).post(chat::handle_start_chat),
        )
        .route(
            "/api/v1/chats/:id",
            get(chat::handle_get_chat).delete(chat::handle_delete_chat),
        )
        .route("/api/v1/chats/:id/messages", post(chat::handle_send_message))
        .route("/api/v1/chats/:id/analysis", get(chat::handle_get_analysis))
        // Resume API
        .route("/api/v1/resume/analyze", post(resume::handle_analyze_resume))
        .route("/api/v1/resume/history", get(resume::handle_resume_history))
        .layer(body_limit)
        .with_state(state)
}
