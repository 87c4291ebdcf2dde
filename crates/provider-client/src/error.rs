//! Error types for provider client construction.

use thiserror::Error;

/// Errors raised while configuring a [`ProviderClient`](crate::ProviderClient).
///
/// Execution itself never fails; see [`ProviderReply`](crate::ProviderReply).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
