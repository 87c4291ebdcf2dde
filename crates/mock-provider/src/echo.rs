//! Echo provider - replies with the latest user text.

use persona_core::{async_trait, ChatProvider, ChatRequest, ProviderReply, RetryReason};

/// A provider that echoes the most recent user message.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoProvider {
    /// Create a new EchoProvider with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoProvider with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl ChatProvider for EchoProvider {
    async fn execute(&self, request: &ChatRequest) -> ProviderReply {
        match request.last_user_text() {
            Some(text) => match &self.prefix {
                Some(prefix) => ProviderReply::Ok(format!("{}{}", prefix, text)),
                None => ProviderReply::Ok(text.to_string()),
            },
            None => ProviderReply::Retryable(RetryReason::Empty),
        }
    }

    fn name(&self) -> &str {
        "EchoProvider"
    }
}
