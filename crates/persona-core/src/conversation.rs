//! Conversations, turns, and groups.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human user.
    User,
    /// A persona.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a stored role name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One atomic message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// User or assistant.
    pub role: Role,
    /// User id for user turns, persona id for assistant turns.
    pub author_id: String,
    /// Message text, never blank.
    pub text: String,
    /// Unix microseconds. Strictly increasing within a conversation.
    pub created_at: i64,
}

impl Turn {
    /// Create a user turn stamped with the current time.
    pub fn user(author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            author_id: author_id.into(),
            text: text.into(),
            created_at: now_micros(),
        }
    }

    /// Create an assistant turn stamped with the current time.
    pub fn assistant(persona_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            author_id: persona_id.into(),
            text: text.into(),
            created_at: now_micros(),
        }
    }

    /// Whether the text is non-empty after trimming.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Current wall-clock time in unix microseconds.
pub fn now_micros() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// What a conversation is about. Exactly one of persona or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum ConversationSubject {
    /// A 1:1 chat with a persona.
    Persona(String),
    /// A shared group scenario.
    Group(String),
}

/// Conversation metadata. Turns are read through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Opaque identifier.
    pub id: String,
    /// Persona or group the conversation belongs to.
    pub subject: ConversationSubject,
}

/// A set of personas sharing a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Opaque identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Setting shown to every member.
    #[serde(default)]
    pub scenario: String,
    /// Member persona ids, ordered by id.
    pub member_persona_ids: BTreeSet<String>,
    /// Member that always answers first, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator_id: Option<String>,
}

impl Group {
    /// Personas that answer a turn sent by `sender_id`, narrator first,
    /// then the remaining members ordered by id.
    pub fn responders(&self, sender_id: &str) -> Vec<String> {
        let mut responders = Vec::with_capacity(self.member_persona_ids.len());

        if let Some(narrator) = self.narrator_id.as_deref() {
            if narrator != sender_id && self.member_persona_ids.contains(narrator) {
                responders.push(narrator.to_string());
            }
        }

        for id in &self.member_persona_ids {
            if id == sender_id || Some(id.as_str()) == self.narrator_id.as_deref() {
                continue;
            }
            responders.push(id.clone());
        }

        responders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tavern() -> Group {
        Group {
            id: "tavern".to_string(),
            name: "The Tavern".to_string(),
            scenario: "A smoky tavern at the edge of the map.".to_string(),
            member_persona_ids: ["m2", "narrator", "m1"]
                .into_iter()
                .map(String::from)
                .collect(),
            narrator_id: Some("narrator".to_string()),
        }
    }

    #[test]
    fn test_responders_narrator_first() {
        let group = tavern();
        assert_eq!(group.responders("user-1"), vec!["narrator", "m1", "m2"]);
    }

    #[test]
    fn test_responders_without_narrator() {
        let mut group = tavern();
        group.narrator_id = None;
        assert_eq!(group.responders("user-1"), vec!["m1", "m2", "narrator"]);
    }

    #[test]
    fn test_responders_excludes_sender() {
        let group = tavern();
        assert_eq!(group.responders("m1"), vec!["narrator", "m2"]);
        assert_eq!(group.responders("narrator"), vec!["m1", "m2"]);
    }

    #[test]
    fn test_responders_ignores_unknown_narrator() {
        let mut group = tavern();
        group.narrator_id = Some("ghost".to_string());
        assert_eq!(group.responders("user-1"), vec!["m1", "m2", "narrator"]);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse(Role::Assistant.as_str()), Some(Role::Assistant));
        assert_eq!(Role::parse("system"), None);
    }

    #[test]
    fn test_turn_text_check() {
        assert!(Turn::user("u", "hi").has_text());
        assert!(!Turn::user("u", "  \n").has_text());
    }
}
