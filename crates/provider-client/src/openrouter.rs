//! OpenRouter (OpenAI-compatible) request and response types.

use persona_core::{ChatRequest, Role};
use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, ReplyError};

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatCompletionRequest {
    /// Model to use
    pub model: String,
    /// System message followed by the conversation
    pub messages: Vec<ChatMessage>,
    /// Temperature for generation
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Always false; replies are delivered whole
    pub stream: bool,
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    /// Response choices
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Error object, sent by some upstreams with a 200 status
    pub error: Option<ApiErrorDetails>,
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice {
    /// The message
    pub message: ResponseMessage,
}

/// Response message.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResponseMessage {
    /// Content (may be null)
    pub content: Option<String>,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetails {
    /// Error message
    #[serde(default)]
    pub message: String,
    /// Numeric or string error code
    pub code: Option<serde_json::Value>,
}

impl ApiErrorDetails {
    fn status_code(&self) -> Option<u16> {
        match self.code.as_ref()? {
            serde_json::Value::Number(number) => {
                number.as_u64().and_then(|n| u16::try_from(n).ok())
            }
            serde_json::Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }
}

/// OpenAI-compatible chat completions dialect.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OpenRouterDialect;

impl Dialect for OpenRouterDialect {
    fn endpoint(&self, base_url: &str, _model: &str) -> String {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }

    fn body(
        &self,
        model: &str,
        request: &ChatRequest,
    ) -> Result<serde_json::Value, serde_json::Error> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage::new("system", request.system_instruction.clone()));
        for message in &request.messages {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(ChatMessage::new(role, message.text.clone()));
        }

        serde_json::to_value(ChatCompletionRequest {
            model: model.to_string(),
            messages,
            temperature: request.params.temperature,
            max_tokens: request.params.max_output_tokens,
            stream: false,
        })
    }

    fn parse_reply(&self, body: &str) -> Result<String, ReplyError> {
        let completion: ChatCompletionResponse = serde_json::from_str(body)
            .map_err(|e| ReplyError::Malformed(format!("invalid completion JSON: {}", e)))?;

        if let Some(error) = completion.error {
            return Err(ReplyError::Reported {
                code: error.status_code(),
                message: error.message,
            });
        }

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ReplyError::Malformed("completion has no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
