use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::llm_client::GenerativeModel;
use crate::session::state::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The generative model behind both remote calls. Trait object so tests
    /// inject scripted models instead of the real Gemini client.
    pub llm: Arc<dyn GenerativeModel>,
    #[allow(dead_code)]
    pub config: Config,
    /// The one session the controller owns. The lock is never held across a
    /// network await.
    pub session: Arc<Mutex<Session>>,
}
