//! The ChatProvider trait definition.

use async_trait::async_trait;

use crate::request::{ChatRequest, ProviderReply};

/// Result of a cheap credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Credentials accepted.
    Ready,
    /// Credentials rejected.
    Unauthorized,
    /// The provider could not be reached or answered oddly.
    Unavailable,
}

/// A trait for executing chat requests against a model backend.
///
/// Implementations never fail with `Err`: every outcome is classified into a
/// [`ProviderReply`]. This trait is object-safe and can be used with
/// `Arc<dyn ChatProvider>`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Execute a request and return its classified outcome.
    async fn execute(&self, request: &ChatRequest) -> ProviderReply;

    /// Get a human-readable name for this provider.
    fn name(&self) -> &str;

    /// Validate credentials before fanning a turn out to several personas.
    ///
    /// Default implementation always reports ready.
    async fn probe(&self) -> ProbeStatus {
        ProbeStatus::Ready
    }
}
