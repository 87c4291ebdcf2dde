//! Error types for persona validation and store access.

use thiserror::Error;

/// Errors raised when a persona definition violates its invariants.
#[derive(Debug, Error)]
pub enum PersonaError {
    /// The persona has no id.
    #[error("persona id cannot be empty")]
    EmptyId,

    /// The system instruction is blank.
    #[error("system instruction cannot be empty")]
    EmptySystemInstruction,

    /// Temperature is outside [0, 1].
    #[error("temperature {0} is outside [0, 1]")]
    TemperatureOutOfRange(f64),

    /// Max output tokens is outside [128, 4096].
    #[error("max output tokens {0} is outside [128, 4096]")]
    MaxOutputTokensOutOfRange(u32),

    /// The persona has no fallback lines.
    #[error("at least one fallback line is required")]
    NoFallbackLines,

    /// A fallback line is blank.
    #[error("fallback line {0} is blank")]
    BlankFallbackLine(usize),

    /// A fallback line would leak that something went wrong.
    #[error("fallback line {index} contains forbidden word \"{word}\"")]
    ForbiddenFallbackWord { index: usize, word: String },

    /// JSON encoding or decoding failed.
    #[error("persona JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by a [`ConversationStore`](crate::ConversationStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The turn violates the append contract.
    #[error("invalid turn: {0}")]
    InvalidTurn(String),

    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}
