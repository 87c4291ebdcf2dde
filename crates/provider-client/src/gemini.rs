//! Gemini `generateContent` request and response types.

use persona_core::{ChatRequest, Role};
use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, ReplyError};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerationConfig {
    pub temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
    pub error: Option<ApiError>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

/// Gemini dialect. Roles "user"/"model"; system instruction carried apart.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GeminiDialect;

impl Dialect for GeminiDialect {
    fn endpoint(&self, base_url: &str, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        )
    }

    fn body(
        &self,
        _model: &str,
        request: &ChatRequest,
    ) -> Result<serde_json::Value, serde_json::Error> {
        let contents = request
            .messages
            .iter()
            .map(|message| {
                let role = match message.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Content::text(Some(role), message.text.clone())
            })
            .collect();

        serde_json::to_value(GenerateContentRequest {
            system_instruction: Content::text(None, request.system_instruction.clone()),
            contents,
            generation_config: GenerationConfig {
                temperature: request.params.temperature,
                max_output_tokens: request.params.max_output_tokens,
            },
        })
    }

    fn parse_reply(&self, body: &str) -> Result<String, ReplyError> {
        let response: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| ReplyError::Malformed(format!("invalid generateContent JSON: {}", e)))?;

        if let Some(error) = response.error {
            return Err(ReplyError::Reported {
                code: error.code,
                message: error.message,
            });
        }

        let candidates = response.candidates.unwrap_or_default();
        let Some(candidate) = candidates.into_iter().next() else {
            if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(ReplyError::Reported {
                    code: None,
                    message: format!("prompt blocked: {}", reason),
                });
            }
            return Err(ReplyError::Malformed("response has no candidates".to_string()));
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}
