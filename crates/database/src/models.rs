//! Database rows and their conversion into domain types.

use persona_core::{Conversation, ConversationSubject, GenerationParams, Persona, Role, Turn};
use sqlx::FromRow;

use crate::error::{DatabaseError, Result};

/// A row of the `personas` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PersonaRow {
    pub id: String,
    pub display_name: String,
    pub system_instruction: String,
    pub style_hints: Option<String>,
    pub temperature: f64,
    pub max_output_tokens: i64,
    /// JSON array of strings.
    pub fallback_lines: String,
}

impl PersonaRow {
    pub fn into_persona(self) -> Result<Persona> {
        let fallback_lines: Vec<String> = serde_json::from_str(&self.fallback_lines)?;
        let max_output_tokens = u32::try_from(self.max_output_tokens.max(0)).unwrap_or(u32::MAX);

        Ok(Persona {
            id: self.id,
            display_name: self.display_name,
            system_instruction: self.system_instruction,
            style_hints: self.style_hints,
            generation_params: GenerationParams::new(self.temperature, max_output_tokens),
            fallback_lines,
        })
    }
}

/// A row of the `persona_groups` table, without members.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub scenario: String,
    pub narrator_id: Option<String>,
}

/// A row of the `conversations` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ConversationRow {
    pub id: String,
    pub persona_id: Option<String>,
    pub group_id: Option<String>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = DatabaseError;

    fn try_from(row: ConversationRow) -> Result<Self> {
        let subject = match (row.persona_id, row.group_id) {
            (Some(persona_id), None) => ConversationSubject::Persona(persona_id),
            (None, Some(group_id)) => ConversationSubject::Group(group_id),
            _ => {
                return Err(DatabaseError::Invalid {
                    entity: "Conversation",
                    reason: format!("{} must have exactly one subject", row.id),
                })
            }
        };

        Ok(Conversation { id: row.id, subject })
    }
}

/// A row of the `turns` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TurnRow {
    pub role: String,
    pub author_id: String,
    pub text: String,
    pub created_at: i64,
}

impl TryFrom<TurnRow> for Turn {
    type Error = DatabaseError;

    fn try_from(row: TurnRow) -> Result<Self> {
        let role = Role::parse(&row.role).ok_or_else(|| DatabaseError::Invalid {
            entity: "Turn",
            reason: format!("unknown role {}", row.role),
        })?;

        Ok(Turn {
            role,
            author_id: row.author_id,
            text: row.text,
            created_at: row.created_at,
        })
    }
}
