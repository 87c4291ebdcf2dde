//! HTTP gateway for persona chat.
//!
//! Exposes the [`orchestrator::Gateway`] over JSON:
//!
//! | Method & path | Body | Response |
//! |---|---|---|
//! | `POST /chat/:bot_id` | `{message, conversationId?}` | `{response, conversationId, botId}` |
//! | `POST /groups/:group_id/send` | `{senderId, text}` | `{replies: [{personaId, text}]}` |
//! | `GET /health` | | `{status}` |
//!
//! Errors are `{"error": {"message", "type"}}` with 400 for invalid input,
//! 404 for unknown ids, and 503 when the model provider rejects our
//! credentials.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use state::AppState;

/// Build the application with its state attached.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
