//! Conversation persistence.

use persona_core::{Conversation, ConversationSubject};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::ConversationRow;

/// Create a conversation for a persona or a group and return its id.
///
/// A group can own only one conversation.
pub async fn create_conversation(pool: &SqlitePool, subject: &ConversationSubject) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let (persona_id, group_id, entity, subject_id) = match subject {
        ConversationSubject::Persona(persona_id) => {
            (Some(persona_id.as_str()), None, "Persona", persona_id)
        }
        ConversationSubject::Group(group_id) => (None, Some(group_id.as_str()), "Group", group_id),
    };

    sqlx::query(
        r#"
        INSERT INTO conversations (id, persona_id, group_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(persona_id)
    .bind(group_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::not_found(entity, subject_id.as_str());
            }
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Conversation",
                    id: subject_id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    tracing::debug!("Created conversation {} for {:?}", id, subject);
    Ok(id)
}

/// Get a conversation by ID.
pub async fn get_conversation(pool: &SqlitePool, id: &str) -> Result<Conversation> {
    sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, persona_id, group_id
        FROM conversations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Conversation", id))?
    .try_into()
}

/// The shared conversation of a group, if it exists.
pub async fn find_group_conversation(pool: &SqlitePool, group_id: &str) -> Result<Option<String>> {
    let id = sqlx::query_scalar::<_, String>(
        r#"
        SELECT id
        FROM conversations
        WHERE group_id = ?
        "#,
    )
    .bind(group_id)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}
