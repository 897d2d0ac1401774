pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers::handle_analyze;
use crate::feedback::handlers::handle_feedback;
use crate::history::handlers::{handle_delete, handle_detail, handle_list, handle_wipe};
use crate::session::handle_session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/session", get(handle_session))
        // Analyses
        .route(
            "/api/v1/analyses",
            get(handle_list).post(handle_analyze).delete(handle_wipe),
        )
        .route(
            "/api/v1/analyses/:id",
            get(handle_detail).delete(handle_delete),
        )
        // Feedback
        .route("/api/v1/feedback", post(handle_feedback))
        .with_state(state)
}
