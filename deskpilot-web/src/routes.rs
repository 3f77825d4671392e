//! Route definitions

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/messages/generate", post(handlers::generate_message))
        .route(
            "/tickets/{ticket_id}/reply-draft",
            post(handlers::draft_ticket_reply),
        )
}
