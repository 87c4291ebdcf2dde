//! Turn persistence. Turns are append-only.

use persona_core::Turn;
use sqlx::SqlitePool;

use crate::conversation::get_conversation;
use crate::error::{DatabaseError, Result};
use crate::models::TurnRow;

/// Append a turn and return it as stored.
///
/// `created_at` is raised to one past the latest turn of the conversation
/// when needed, so timestamps stay strictly increasing.
pub async fn append_turn(pool: &SqlitePool, conversation_id: &str, turn: &Turn) -> Result<Turn> {
    if !turn.has_text() {
        return Err(DatabaseError::Invalid {
            entity: "Turn",
            reason: "turn text is blank".to_string(),
        });
    }

    let created_at: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO turns (conversation_id, role, author_id, text, created_at)
        SELECT ?, ?, ?, ?, MAX(?, COALESCE(MAX(created_at), 0) + 1)
        FROM turns
        WHERE conversation_id = ?
        RETURNING created_at
        "#,
    )
    .bind(conversation_id)
    .bind(turn.role.as_str())
    .bind(&turn.author_id)
    .bind(&turn.text)
    .bind(turn.created_at)
    .bind(conversation_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::not_found("Conversation", conversation_id);
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(Turn {
        created_at,
        ..turn.clone()
    })
}

/// The last `limit` turns of a conversation, oldest first.
pub async fn recent_turns(pool: &SqlitePool, conversation_id: &str, limit: usize) -> Result<Vec<Turn>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = sqlx::query_as::<_, TurnRow>(
        r#"
        SELECT role, author_id, text, created_at
        FROM (
            SELECT id, role, author_id, text, created_at
            FROM turns
            WHERE conversation_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
        )
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        // Distinguish an empty conversation from an unknown one.
        get_conversation(pool, conversation_id).await?;
    }

    rows.into_iter().map(Turn::try_from).collect()
}

/// Number of turns stored for a conversation.
pub async fn count_turns(pool: &SqlitePool, conversation_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM turns WHERE conversation_id = ?")
        .bind(conversation_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
