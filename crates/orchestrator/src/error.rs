//! Error types for gateway operations.

use persona_core::StoreError;
use thiserror::Error;

/// Errors surfaced to callers of the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request failed validation before any provider was called.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A persona, group, or conversation does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The conversation belongs to a different persona or group.
    #[error("conversation {conversation_id} does not belong to {expected}")]
    ConversationMismatch {
        conversation_id: String,
        expected: String,
    },

    /// The provider rejected our credentials. Operators must fix the deployment.
    #[error("provider unauthorized: {0}")]
    ProviderUnauthorized(String),

    /// The conversation store failed.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl GatewayError {
    /// Short machine-readable error type.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidInput(_) => "invalid_request",
            GatewayError::NotFound { .. } => "not_found",
            GatewayError::ConversationMismatch { .. } => "conversation_mismatch",
            GatewayError::ProviderUnauthorized(_) => "provider_unauthorized",
            GatewayError::Store(_) => "store_error",
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => GatewayError::NotFound { entity, id },
            other => GatewayError::Store(other),
        }
    }
}
