//! Provider-agnostic request and reply types.

use std::fmt;

use serde::Serialize;

use crate::conversation::Role;
use crate::persona::GenerationParams;

/// One entry in the turn list sent to a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    /// User or assistant.
    pub role: Role,
    /// Message content.
    pub text: String,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Everything a provider needs to produce one reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// System instruction, carried separately from the turns.
    pub system_instruction: String,
    /// Ordered turns. Starts and ends with a user message.
    pub messages: Vec<ChatMessage>,
    /// Clamped sampling parameters.
    pub params: GenerationParams,
}

impl ChatRequest {
    /// Text of the final user message.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.text.as_str())
    }
}

/// Why an attempt may succeed if repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// 200 with blank assistant text.
    Empty,
    /// 429.
    RateLimited,
    /// 5xx.
    Server,
    /// Connection, DNS, or TLS failure.
    Transport,
}

impl RetryReason {
    /// Short label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryReason::Empty => "empty",
            RetryReason::RateLimited => "rate-limited",
            RetryReason::Server => "server",
            RetryReason::Transport => "transport",
        }
    }
}

/// Outcome of executing a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReply {
    /// Non-empty assistant text.
    Ok(String),
    /// Transient failure.
    Retryable(RetryReason),
    /// The current model cannot answer this request.
    Terminal(String),
    /// The current model is out of quota.
    QuotaExhausted,
    /// Credentials were rejected.
    Unauthorized,
    /// The attempt exceeded its time budget.
    Timeout,
}

impl ProviderReply {
    /// Whether this reply carries text.
    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderReply::Ok(_))
    }

    /// Reply text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            ProviderReply::Ok(text) => Some(text),
            _ => None,
        }
    }

    /// Whether repeating the same attempt may help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderReply::Retryable(_) | ProviderReply::Timeout)
    }
}

impl fmt::Display for ProviderReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderReply::Ok(_) => write!(f, "ok"),
            ProviderReply::Retryable(reason) => write!(f, "retryable({})", reason.as_str()),
            ProviderReply::Terminal(reason) => write!(f, "terminal({})", reason),
            ProviderReply::QuotaExhausted => write!(f, "quota-exhausted"),
            ProviderReply::Unauthorized => write!(f, "unauthorized"),
            ProviderReply::Timeout => write!(f, "timeout"),
        }
    }
}
