//! Group fan-out: one user turn, several persona replies.

use std::sync::Arc;

use futures::future::join_all;
use persona_core::{
    assemble, ChatProvider, ChatRequest, ConversationStore, ConversationSubject, Group,
    Participant, Persona, ProbeStatus, Scenario, StoreError, Turn, GROUP_WINDOW,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::reply::{respond, Spoken};
use crate::validation::{require_id, validate_message};

/// One persona's reply to a group turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReply {
    pub persona_id: String,
    pub text: String,
    pub used_fallback: bool,
}

/// Result of a group turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    /// The group's shared conversation.
    pub conversation_id: String,
    /// New assistant replies in responder order.
    pub replies: Vec<GroupReply>,
}

/// Dispatches a group turn to its responders.
///
/// The narrator, when the group has one, answers first and its reply is part
/// of every other responder's prompt. The remaining members answer
/// concurrently against the same snapshot. Replies are appended in responder
/// order once all of them are in; if any responder hits rejected provider
/// credentials, no reply is appended.
pub struct GroupOrchestrator {
    store: Arc<dyn ConversationStore>,
    provider: Arc<dyn ChatProvider>,
    config: GatewayConfig,
}

impl GroupOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn ChatProvider>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Handle `text` sent by `sender_id` to group `group_id`.
    pub async fn send(
        &self,
        group_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<GroupOutcome, GatewayError> {
        let deadline = Instant::now() + self.config.request_deadline;

        let text = validate_message(text)?;
        let sender_id = require_id("senderId", sender_id)?;
        let group = self.store.load_group(require_id("groupId", group_id)?).await?;

        let responders = self.load_responders(&group, sender_id).await?;
        if responders.is_empty() {
            return Err(GatewayError::InvalidInput(format!(
                "group {} has no personas to respond",
                group.id
            )));
        }

        let conversation_id = self.conversation_for(&group).await?;
        let history = self
            .store
            .recent_turns(&conversation_id, GROUP_WINDOW)
            .await?;
        let user_turn = self
            .store
            .append_turn(&conversation_id, Turn::user(sender_id, text))
            .await?;

        if self.provider.probe().await == ProbeStatus::Unauthorized {
            return Err(GatewayError::ProviderUnauthorized(format!(
                "{} rejected the configured credentials",
                self.provider.name()
            )));
        }

        let mut scenario = Scenario {
            setting: group.scenario.clone(),
            participants: responders.iter().map(Participant::of).collect(),
            same_turn_replies: Vec::new(),
        };

        let mut spoken: Vec<(&Persona, Spoken)> = Vec::with_capacity(responders.len());
        let mut members = responders.as_slice();

        if let Some((first, rest)) = responders.split_first() {
            if group.narrator_id.as_deref() == Some(first.id.as_str()) {
                let request = assemble(first, Some(&scenario), &history, &user_turn);
                let reply = respond(self.provider.as_ref(), first, &request, deadline).await?;
                debug!(narrator = %first.id, "Narrator replied");

                scenario
                    .same_turn_replies
                    .push(Turn::assistant(&first.id, &reply.text));
                spoken.push((first, reply));
                members = rest;
            }
        }

        let requests: Vec<ChatRequest> = members
            .iter()
            .map(|persona| assemble(persona, Some(&scenario), &history, &user_turn))
            .collect();
        let replies = join_all(
            members
                .iter()
                .zip(&requests)
                .map(|(persona, request)| {
                    respond(self.provider.as_ref(), persona, request, deadline)
                }),
        )
        .await;

        for (persona, reply) in members.iter().zip(replies) {
            spoken.push((persona, reply?));
        }

        let mut outcome = GroupOutcome {
            conversation_id,
            replies: Vec::with_capacity(spoken.len()),
        };
        for (persona, reply) in spoken {
            self.store
                .append_turn(
                    &outcome.conversation_id,
                    Turn::assistant(&persona.id, &reply.text),
                )
                .await?;
            outcome.replies.push(GroupReply {
                persona_id: persona.id.clone(),
                text: reply.text,
                used_fallback: reply.used_fallback,
            });
        }

        info!(
            conversation_id = %outcome.conversation_id,
            group = %group.id,
            replies = outcome.replies.len(),
            fallbacks = outcome.replies.iter().filter(|r| r.used_fallback).count(),
            "Group turn complete"
        );

        Ok(outcome)
    }

    /// Responding personas in order. Members missing from the store are skipped.
    async fn load_responders(
        &self,
        group: &Group,
        sender_id: &str,
    ) -> Result<Vec<Persona>, GatewayError> {
        let ids = group.responders(sender_id);
        let mut personas = Vec::with_capacity(ids.len());

        for id in &ids {
            match self.store.load_persona(id).await {
                Ok(persona) => personas.push(persona),
                Err(StoreError::NotFound { .. }) => {
                    warn!(group = %group.id, persona = %id, "Group member not found, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(personas)
    }

    /// The group's shared conversation, created on first use.
    async fn conversation_for(&self, group: &Group) -> Result<String, GatewayError> {
        if let Some(id) = self.store.group_conversation(&group.id).await? {
            return Ok(id);
        }

        let subject = ConversationSubject::Group(group.id.clone());
        match self.store.create_conversation(&subject).await {
            Ok(id) => Ok(id),
            // A concurrent first turn may have created it.
            Err(err) => match self.store.group_conversation(&group.id).await? {
                Some(id) => Ok(id),
                None => Err(err.into()),
            },
        }
    }
}
