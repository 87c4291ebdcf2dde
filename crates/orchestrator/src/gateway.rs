//! The gateway: `chat` for 1:1 conversations and `group_send` for groups.

use std::sync::Arc;

use persona_core::{
    assemble, ChatProvider, ConversationStore, ConversationSubject, Persona, Turn, DIRECT_WINDOW,
};
use tokio::time::Instant;
use tracing::info;

use crate::config::{GatewayConfig, DIRECT_USER_ID};
use crate::error::GatewayError;
use crate::group::{GroupOrchestrator, GroupOutcome};
use crate::reply::respond;
use crate::validation::{require_id, validate_message};

/// Result of a 1:1 chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// What the persona said.
    pub response: String,
    /// Conversation the exchange was appended to.
    pub conversation_id: String,
    /// Persona that answered.
    pub bot_id: String,
    /// Whether the reply is one of the persona's fallback lines.
    pub used_fallback: bool,
}

/// Coordinates the store, the prompt assembler, and the provider.
///
/// Every user turn is appended before a reply is computed. Replies that do
/// not come back from the provider are replaced by the persona's fallback
/// lines; rejected provider credentials are surfaced as
/// [`GatewayError::ProviderUnauthorized`] with no assistant turn written.
pub struct Gateway {
    store: Arc<dyn ConversationStore>,
    provider: Arc<dyn ChatProvider>,
    groups: GroupOrchestrator,
    config: GatewayConfig,
}

impl Gateway {
    /// Create a gateway with the default configuration.
    pub fn new(store: Arc<dyn ConversationStore>, provider: Arc<dyn ChatProvider>) -> Self {
        Self::with_config(store, provider, GatewayConfig::default())
    }

    /// Create a gateway with a custom configuration.
    pub fn with_config(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn ChatProvider>,
        config: GatewayConfig,
    ) -> Self {
        info!(
            "Gateway initialized with provider: {}, request deadline: {:?}",
            provider.name(),
            config.request_deadline
        );

        Self {
            groups: GroupOrchestrator::new(store.clone(), provider.clone(), config.clone()),
            store,
            provider,
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Send `message` to persona `bot_id`.
    ///
    /// Without a `conversation_id` a new conversation bound to the persona is
    /// created. A given `conversation_id` must belong to the same persona.
    pub async fn chat(
        &self,
        bot_id: &str,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatOutcome, GatewayError> {
        let deadline = Instant::now() + self.config.request_deadline;

        let text = validate_message(message)?;
        let bot_id = require_id("botId", bot_id)?;
        let persona = self.store.load_persona(bot_id).await?;

        let conversation_id = self.conversation_for(&persona, conversation_id).await?;

        let history = self
            .store
            .recent_turns(&conversation_id, DIRECT_WINDOW)
            .await?;
        let user_turn = self
            .store
            .append_turn(&conversation_id, Turn::user(DIRECT_USER_ID, text))
            .await?;

        let request = assemble(&persona, None, &history, &user_turn);
        let spoken = respond(self.provider.as_ref(), &persona, &request, deadline).await?;

        self.store
            .append_turn(&conversation_id, Turn::assistant(&persona.id, &spoken.text))
            .await?;

        info!(
            conversation_id = %conversation_id,
            persona = %persona.id,
            used_fallback = spoken.used_fallback,
            "Chat turn complete"
        );

        Ok(ChatOutcome {
            response: spoken.text,
            conversation_id,
            bot_id: persona.id,
            used_fallback: spoken.used_fallback,
        })
    }

    /// Send `text` from `sender_id` to every responder of group `group_id`.
    pub async fn group_send(
        &self,
        group_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<GroupOutcome, GatewayError> {
        self.groups.send(group_id, sender_id, text).await
    }

    async fn conversation_for(
        &self,
        persona: &Persona,
        requested: Option<&str>,
    ) -> Result<String, GatewayError> {
        let subject = ConversationSubject::Persona(persona.id.clone());

        match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                let conversation = self.store.load_conversation(id).await?;
                if conversation.subject != subject {
                    return Err(GatewayError::ConversationMismatch {
                        conversation_id: conversation.id,
                        expected: persona.id.clone(),
                    });
                }
                Ok(conversation.id)
            }
            None => Ok(self.store.create_conversation(&subject).await?),
        }
    }
}
