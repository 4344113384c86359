pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route(
            "/api/v1/session/inputs",
            put(handlers::handle_update_inputs),
        )
        .route(
            "/api/v1/session/resume-file",
            post(handlers::handle_resume_file),
        )
        .route("/api/v1/session/analyze", post(handlers::handle_analyze))
        .route("/api/v1/session/copy", post(handlers::handle_copy))
        .with_state(state)
}
