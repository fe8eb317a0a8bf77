use std::sync::Arc;

use crate::chat::interpreter::ResponseInterpreter;
use crate::config::Config;
use crate::jobs::repository::JobRepository;
use crate::llm_client::ChatModel;
use crate::session::identity::IdentityProvider;
use crate::session::registry::SessionRegistry;
use crate::session::users::UserStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every external dependency sits behind a trait so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<dyn JobRepository>,
    pub users: Arc<dyn UserStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub llm: Arc<dyn ChatModel>,
    /// Decoder for marker-formatted replies. Default: MarkerInterpreter.
    pub interpreter: Arc<dyn ResponseInterpreter>,
    pub sessions: SessionRegistry,
    pub config: Config,
}
