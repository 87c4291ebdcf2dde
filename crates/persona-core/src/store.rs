//! The conversation store contract consumed by the gateway.

use async_trait::async_trait;

use crate::conversation::{Conversation, ConversationSubject, Group, Turn};
use crate::error::StoreError;
use crate::persona::Persona;

/// Persistence operations the gateway relies on.
///
/// Any backing store satisfies this contract as long as `append_turn` is
/// durable before it returns and `recent_turns` is ordered oldest-first.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load a persona by id.
    async fn load_persona(&self, id: &str) -> Result<Persona, StoreError>;

    /// Load a group by id.
    async fn load_group(&self, id: &str) -> Result<Group, StoreError>;

    /// Create a conversation and return its id.
    async fn create_conversation(&self, subject: &ConversationSubject)
        -> Result<String, StoreError>;

    /// Load conversation metadata.
    async fn load_conversation(&self, id: &str) -> Result<Conversation, StoreError>;

    /// The shared conversation of a group, if one was created.
    async fn group_conversation(&self, group_id: &str) -> Result<Option<String>, StoreError>;

    /// Append a turn and return it as stored.
    ///
    /// The store may raise `created_at` so it stays strictly increasing
    /// within the conversation.
    async fn append_turn(&self, conversation_id: &str, turn: Turn) -> Result<Turn, StoreError>;

    /// The last `limit` turns, oldest first.
    async fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError>;
}
