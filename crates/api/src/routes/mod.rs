//! Route handlers for the gateway.

pub mod chat;
pub mod groups;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat/:bot_id", post(chat::chat))
        .route("/groups/:group_id/send", post(groups::send))
        // Health check
        .route("/health", get(health::health))
}
