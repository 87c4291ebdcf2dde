//! In-memory conversation store.
//!
//! Backs tests and single-process demos. Conversations are kept in insertion
//! order; nothing is evicted.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::conversation::{Conversation, ConversationSubject, Group, Turn};
use crate::error::StoreError;
use crate::persona::Persona;
use crate::store::ConversationStore;

#[derive(Debug)]
struct ConversationLog {
    conversation: Conversation,
    turns: Vec<Turn>,
}

/// A [`ConversationStore`] held entirely in memory.
///
/// # Example
///
/// ```rust
/// use persona_core::{ConversationStore, ConversationSubject, MemoryStore, Turn};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = MemoryStore::new();
///     let id = store
///         .create_conversation(&ConversationSubject::Persona("pip".to_string()))
///         .await
///         .unwrap();
///
///     store.append_turn(&id, Turn::user("user-1", "Hello")).await.unwrap();
///     store.append_turn(&id, Turn::assistant("pip", "Hi there!")).await.unwrap();
///
///     let turns = store.recent_turns(&id, 10).await.unwrap();
///     assert_eq!(turns.len(), 2);
/// }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    personas: RwLock<HashMap<String, Persona>>,
    groups: RwLock<HashMap<String, Group>>,
    conversations: RwLock<IndexMap<String, ConversationLog>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a persona.
    pub async fn insert_persona(&self, persona: Persona) {
        self.personas
            .write()
            .await
            .insert(persona.id.clone(), persona);
    }

    /// Insert or replace a group.
    pub async fn insert_group(&self, group: Group) {
        self.groups.write().await.insert(group.id.clone(), group);
    }

    /// Every turn of a conversation, oldest first.
    pub async fn transcript(&self, conversation_id: &str) -> Vec<Turn> {
        self.conversations
            .read()
            .await
            .get(conversation_id)
            .map(|log| log.turns.clone())
            .unwrap_or_default()
    }

    /// Number of conversations created so far.
    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load_persona(&self, id: &str) -> Result<Persona, StoreError> {
        self.personas
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Persona", id))
    }

    async fn load_group(&self, id: &str) -> Result<Group, StoreError> {
        self.groups
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Group", id))
    }

    async fn create_conversation(
        &self,
        subject: &ConversationSubject,
    ) -> Result<String, StoreError> {
        let mut conversations = self.conversations.write().await;

        if let ConversationSubject::Group(group_id) = subject {
            let existing = conversations
                .values()
                .any(|log| log.conversation.subject == *subject);
            if existing {
                return Err(StoreError::Backend(format!(
                    "group {} already has a conversation",
                    group_id
                )));
            }
        }

        let id = Uuid::new_v4().to_string();
        conversations.insert(
            id.clone(),
            ConversationLog {
                conversation: Conversation {
                    id: id.clone(),
                    subject: subject.clone(),
                },
                turns: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn load_conversation(&self, id: &str) -> Result<Conversation, StoreError> {
        self.conversations
            .read()
            .await
            .get(id)
            .map(|log| log.conversation.clone())
            .ok_or_else(|| StoreError::not_found("Conversation", id))
    }

    async fn group_conversation(&self, group_id: &str) -> Result<Option<String>, StoreError> {
        let subject = ConversationSubject::Group(group_id.to_string());
        Ok(self
            .conversations
            .read()
            .await
            .values()
            .find(|log| log.conversation.subject == subject)
            .map(|log| log.conversation.id.clone()))
    }

    async fn append_turn(
        &self,
        conversation_id: &str,
        mut turn: Turn,
    ) -> Result<Turn, StoreError> {
        if !turn.has_text() {
            return Err(StoreError::InvalidTurn("turn text is blank".to_string()));
        }

        let mut conversations = self.conversations.write().await;
        let log = conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::not_found("Conversation", conversation_id))?;

        if let Some(last) = log.turns.last() {
            turn.created_at = turn.created_at.max(last.created_at + 1);
        }
        log.turns.push(turn.clone());
        Ok(turn)
    }

    async fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError> {
        let conversations = self.conversations.read().await;
        let log = conversations
            .get(conversation_id)
            .ok_or_else(|| StoreError::not_found("Conversation", conversation_id))?;

        let start = log.turns.len().saturating_sub(limit);
        Ok(log.turns[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let store = MemoryStore::new();
        let id = store
            .create_conversation(&ConversationSubject::Persona("pip".to_string()))
            .await
            .unwrap();

        for i in 0..5 {
            store
                .append_turn(&id, Turn::user("user-1", format!("msg {}", i)))
                .await
                .unwrap();
        }

        let recent = store.recent_turns(&id, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].text, "msg 2");
        assert_eq!(recent[2].text, "msg 4");
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increase() {
        let store = MemoryStore::new();
        let id = store
            .create_conversation(&ConversationSubject::Persona("pip".to_string()))
            .await
            .unwrap();

        let mut turn = Turn::user("user-1", "first");
        turn.created_at = 100;
        store.append_turn(&id, turn).await.unwrap();

        let mut stale = Turn::assistant("pip", "second");
        stale.created_at = 50;
        let stored = store.append_turn(&id, stale).await.unwrap();
        assert_eq!(stored.created_at, 101);

        let turns = store.transcript(&id).await;
        assert!(turns.windows(2).all(|w| w[0].created_at < w[1].created_at));
    }

    #[tokio::test]
    async fn test_blank_turn_rejected() {
        let store = MemoryStore::new();
        let id = store
            .create_conversation(&ConversationSubject::Persona("pip".to_string()))
            .await
            .unwrap();

        let result = store.append_turn(&id, Turn::user("user-1", "   ")).await;
        assert!(matches!(result, Err(StoreError::InvalidTurn(_))));
    }

    #[tokio::test]
    async fn test_unknown_records() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load_persona("nobody").await,
            Err(StoreError::NotFound { entity: "Persona", .. })
        ));
        assert!(matches!(
            store.load_group("nowhere").await,
            Err(StoreError::NotFound { entity: "Group", .. })
        ));
        assert!(matches!(
            store.append_turn("missing", Turn::user("u", "hi")).await,
            Err(StoreError::NotFound { entity: "Conversation", .. })
        ));
    }

    #[tokio::test]
    async fn test_group_conversation_lookup() {
        let store = MemoryStore::new();
        assert!(store.group_conversation("tavern").await.unwrap().is_none());

        let subject = ConversationSubject::Group("tavern".to_string());
        let id = store.create_conversation(&subject).await.unwrap();
        assert_eq!(store.group_conversation("tavern").await.unwrap(), Some(id));
        assert!(store.create_conversation(&subject).await.is_err());
    }
}
