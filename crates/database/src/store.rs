//! [`ConversationStore`] backed by SQLite.

use async_trait::async_trait;
use persona_core::{
    Conversation, ConversationStore, ConversationSubject, Group, Persona, StoreError, Turn,
};

use crate::{conversation, group, persona, turn, Database};

#[async_trait]
impl ConversationStore for Database {
    async fn load_persona(&self, id: &str) -> Result<Persona, StoreError> {
        Ok(persona::get_persona(self.pool(), id).await?)
    }

    async fn load_group(&self, id: &str) -> Result<Group, StoreError> {
        Ok(group::get_group(self.pool(), id).await?)
    }

    async fn create_conversation(
        &self,
        subject: &ConversationSubject,
    ) -> Result<String, StoreError> {
        Ok(conversation::create_conversation(self.pool(), subject).await?)
    }

    async fn load_conversation(&self, id: &str) -> Result<Conversation, StoreError> {
        Ok(conversation::get_conversation(self.pool(), id).await?)
    }

    async fn group_conversation(&self, group_id: &str) -> Result<Option<String>, StoreError> {
        Ok(conversation::find_group_conversation(self.pool(), group_id).await?)
    }

    async fn append_turn(&self, conversation_id: &str, turn: Turn) -> Result<Turn, StoreError> {
        Ok(turn::append_turn(self.pool(), conversation_id, &turn).await?)
    }

    async fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError> {
        Ok(turn::recent_turns(self.pool(), conversation_id, limit).await?)
    }
}
