//! Turning a provider outcome into the text a persona says.

use persona_core::{fallback_line, hash_prompt, ChatProvider, ChatRequest, Persona, ProviderReply};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::error::GatewayError;

/// What a persona said for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spoken {
    pub text: String,
    pub used_fallback: bool,
}

/// Execute `request` and fall back to one of the persona's lines on any
/// non-ok outcome or when `deadline` passes first.
///
/// `Unauthorized` is the only outcome that becomes an error.
pub(crate) async fn respond(
    provider: &dyn ChatProvider,
    persona: &Persona,
    request: &ChatRequest,
    deadline: Instant,
) -> Result<Spoken, GatewayError> {
    debug!(
        persona = %persona.id,
        messages = request.messages.len(),
        "Dispatching prompt {}",
        hash_prompt(&request.system_instruction)
    );

    let outcome = match timeout_at(deadline, provider.execute(request)).await {
        Ok(ProviderReply::Ok(text)) if !text.trim().is_empty() => {
            return Ok(Spoken {
                text,
                used_fallback: false,
            })
        }
        Ok(ProviderReply::Unauthorized) => {
            return Err(GatewayError::ProviderUnauthorized(format!(
                "{} rejected the configured credentials",
                provider.name()
            )))
        }
        Ok(other) => other.to_string(),
        Err(_) => "deadline".to_string(),
    };

    warn!(persona = %persona.id, outcome = %outcome, "No model reply, using fallback line");
    Ok(Spoken {
        text: fallback_line(persona),
        used_fallback: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::persona;
    use mock_provider::{DelayedProvider, EchoProvider, ScriptedProvider};
    use persona_core::{assemble, RetryReason, Turn};
    use std::time::Duration;

    fn request() -> ChatRequest {
        assemble(&persona("pip", "Pip"), None, &[], &Turn::user("u-1", "hello"))
    }

    fn far() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[tokio::test]
    async fn test_ok_passes_through() {
        let provider = ScriptedProvider::always(ProviderReply::Ok("hi there".to_string()));
        let spoken = respond(&provider, &persona("pip", "Pip"), &request(), far())
            .await
            .unwrap();
        assert_eq!(spoken.text, "hi there");
        assert!(!spoken.used_fallback);
    }

    #[tokio::test]
    async fn test_every_other_outcome_falls_back() {
        let pip = persona("pip", "Pip");
        for outcome in [
            ProviderReply::Terminal("all-exhausted".to_string()),
            ProviderReply::QuotaExhausted,
            ProviderReply::Timeout,
            ProviderReply::Retryable(RetryReason::Server),
            ProviderReply::Ok("   ".to_string()),
        ] {
            let provider = ScriptedProvider::always(outcome);
            let spoken = respond(&provider, &pip, &request(), far()).await.unwrap();
            assert!(spoken.used_fallback);
            assert_eq!(spoken.text, pip.fallback_lines[0]);
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_an_error() {
        let provider = ScriptedProvider::always(ProviderReply::Unauthorized);
        let result = respond(&provider, &persona("pip", "Pip"), &request(), far()).await;
        assert!(matches!(result, Err(GatewayError::ProviderUnauthorized(_))));
    }

    #[tokio::test]
    async fn test_deadline_falls_back() {
        let provider = DelayedProvider::with_millis(EchoProvider::new(), 500);
        let deadline = Instant::now() + Duration::from_millis(20);
        let spoken = respond(&provider, &persona("pip", "Pip"), &request(), deadline)
            .await
            .unwrap();
        assert!(spoken.used_fallback);
    }
}
