//! Error responses for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::GatewayError;
use thiserror::Error;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Gateway error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The request body could not be read.
    #[error("invalid request body: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(err) => match err {
                GatewayError::InvalidInput(_) | GatewayError::ConversationMismatch { .. } => {
                    StatusCode::BAD_REQUEST
                }
                GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
                GatewayError::ProviderUnauthorized(_) => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = match &self {
            ApiError::BadRequest(_) => ("invalid_request", self.to_string()),
            ApiError::Gateway(GatewayError::Store(err)) => {
                tracing::error!("Store error: {}", err);
                ("store_error", "internal storage failure".to_string())
            }
            ApiError::Gateway(err @ GatewayError::ProviderUnauthorized(_)) => {
                tracing::error!("Provider credentials rejected: {}", err);
                (
                    err.kind(),
                    "model provider rejected the configured credentials; check PROVIDER_API_KEY_* settings"
                        .to_string(),
                )
            }
            ApiError::Gateway(err) => (err.kind(), err.to_string()),
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
