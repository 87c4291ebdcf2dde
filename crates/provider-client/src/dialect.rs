//! Provider wire-format abstraction.
//!
//! Each provider family implements [`Dialect`]: build the request body,
//! interpret a success body, classify a failure. The client never branches
//! on provider identity beyond picking the dialect.

use persona_core::{ChatRequest, ProviderReply, RetryReason};

/// Why a 200 body did not yield reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// The body did not match the expected shape.
    Malformed(String),
    /// The body carried an error object instead of a reply.
    Reported {
        /// Status code embedded in the error object, if any.
        code: Option<u16>,
        /// Provider-supplied message.
        message: String,
    },
}

/// Capability set of one provider family.
pub trait Dialect: Send + Sync {
    /// Full URL for a request to `model`.
    fn endpoint(&self, base_url: &str, model: &str) -> String;

    /// JSON body for `request` sent to `model`.
    fn body(&self, model: &str, request: &ChatRequest)
        -> Result<serde_json::Value, serde_json::Error>;

    /// Extract the assistant text from a 200 body. May be blank.
    fn parse_reply(&self, body: &str) -> Result<String, ReplyError>;

    /// Classify a non-2xx response.
    fn classify_error(&self, status: u16, body: &str) -> ProviderReply {
        classify_status(status, body)
    }
}

/// Shared mapping from HTTP status to outcome.
pub(crate) fn classify_status(status: u16, body: &str) -> ProviderReply {
    match status {
        401 | 403 => ProviderReply::Unauthorized,
        402 => ProviderReply::QuotaExhausted,
        429 if is_quota_exhausted(body) => ProviderReply::QuotaExhausted,
        429 => ProviderReply::Retryable(RetryReason::RateLimited),
        500..=599 => ProviderReply::Retryable(RetryReason::Server),
        _ if is_quota_exhausted(body) => ProviderReply::QuotaExhausted,
        _ => ProviderReply::Terminal(format!("http-{}", status)),
    }
}

/// Classify an error object found inside a 200 body.
pub(crate) fn classify_reported(code: Option<u16>, message: &str) -> ProviderReply {
    match code {
        Some(code) if code >= 400 => classify_status(code, message),
        _ if is_quota_exhausted(message) => ProviderReply::QuotaExhausted,
        _ => ProviderReply::Terminal("reported".to_string()),
    }
}

/// Whether an error body signals exhausted quota rather than a rate limit.
pub(crate) fn is_quota_exhausted(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("insufficient_quota")
        || lower.contains("insufficient quota")
        || lower.contains("exceeded your current quota")
        || lower.contains("insufficient credits")
}
