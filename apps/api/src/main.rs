mod chat;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod resume;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::interpreter::MarkerInterpreter;
use crate::config::Config;
use crate::db::create_pool;
use crate::jobs::repository::PgJobRepository;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::session::identity::FirebaseAuth;
use crate::session::registry::SessionRegistry;
use crate::session::users::PgUserStore;
use crate::state::AppState;

/// How often idle login sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobtrack API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let sessions = SessionRegistry::default();
    spawn_session_sweeper(
        sessions.clone(),
        Duration::from_secs(config.session_idle_ttl_secs),
    );

    // Build app state
    let state = AppState {
        jobs: Arc::new(PgJobRepository::new(db.clone())),
        users: Arc::new(PgUserStore::new(db)),
        identity: Arc::new(FirebaseAuth::new(config.firebase_api_key.clone())),
        llm: Arc::new(llm),
        interpreter: Arc::new(MarkerInterpreter),
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the front-end host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_session_sweeper(sessions: SessionRegistry, ttl: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.sweep_idle(ttl);
            if removed > 0 {
                info!(
                    "Removed {removed} idle login sessions, {} active",
                    sessions.active_count()
                );
            }
        }
    });
}
