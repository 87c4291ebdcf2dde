//! Persona-to-prompt assembly.
//!
//! [`assemble`] is pure: the same persona, scenario, history, and user turn
//! always produce the same [`ChatRequest`].

use crate::conversation::{Role, Turn};
use crate::persona::{GenerationParams, Persona};
use crate::request::{ChatMessage, ChatRequest};

/// Turn window for 1:1 conversations.
pub const DIRECT_WINDOW: usize = 8;

/// Turn window for group conversations.
pub const GROUP_WINDOW: usize = 10;

/// Closing line of every system instruction.
pub const CLOSING_DIRECTIVE: &str = "Reply once, in character, to the final user message.";

/// Lowest temperature sent to a provider.
pub const MIN_TEMPERATURE: f64 = 0.1;

/// Highest temperature sent to a provider.
pub const MAX_TEMPERATURE: f64 = 1.0;

/// Lowest output token limit sent to a provider.
pub const MIN_OUTPUT_TOKENS: u32 = 128;

/// Highest output token limit sent to a provider.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

/// A persona taking part in a group scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Persona id.
    pub persona_id: String,
    /// Name used to label the persona's lines.
    pub display_name: String,
}

impl Participant {
    /// Describe a persona as a participant.
    pub fn of(persona: &Persona) -> Self {
        Self {
            persona_id: persona.id.clone(),
            display_name: persona.display_name.clone(),
        }
    }
}

/// Shared setting of a group turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    /// Setting text shown to every persona.
    pub setting: String,
    /// Every active persona in the group, the answering one included.
    pub participants: Vec<Participant>,
    /// Replies already produced for the current user turn (the narrator's).
    /// They follow the user turn in the window.
    pub same_turn_replies: Vec<Turn>,
}

impl Scenario {
    fn display_name<'a>(&'a self, persona_id: &'a str) -> &'a str {
        self.participants
            .iter()
            .find(|participant| participant.persona_id == persona_id)
            .map(|participant| participant.display_name.as_str())
            .unwrap_or(persona_id)
    }
}

/// Build the provider-agnostic request for one persona reply.
///
/// `history` holds the turns that precede `user_turn`, oldest first.
/// `scenario` is present only for group conversations.
pub fn assemble(
    persona: &Persona,
    scenario: Option<&Scenario>,
    history: &[Turn],
    user_turn: &Turn,
) -> ChatRequest {
    ChatRequest {
        system_instruction: system_instruction(persona, scenario),
        messages: window(persona, scenario, history, user_turn),
        params: clamp_params(persona.generation_params),
    }
}

/// Clamp authored parameters into the range every provider accepts.
pub fn clamp_params(params: GenerationParams) -> GenerationParams {
    let temperature = if params.temperature.is_nan() {
        MIN_TEMPERATURE
    } else {
        params.temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
    };

    GenerationParams {
        temperature,
        max_output_tokens: params
            .max_output_tokens
            .clamp(MIN_OUTPUT_TOKENS, MAX_OUTPUT_TOKENS),
    }
}

fn system_instruction(persona: &Persona, scenario: Option<&Scenario>) -> String {
    let mut sections = vec![persona.system_instruction.clone()];

    if let Some(hints) = persona
        .style_hints
        .as_deref()
        .map(str::trim)
        .filter(|hints| !hints.is_empty())
    {
        sections.push(format!(
            "Style guidance (shape your voice with it, never quote it):\n{}",
            hints
        ));
    }

    if let Some(scenario) = scenario {
        let others: Vec<&str> = scenario
            .participants
            .iter()
            .filter(|participant| participant.persona_id != persona.id)
            .map(|participant| participant.display_name.as_str())
            .collect();

        let mut block = format!("Shared scene:\n{}", scenario.setting.trim());
        if !others.is_empty() {
            block.push_str(&format!("\nAlso present: {}.", others.join(", ")));
        }
        sections.push(block);
    }

    sections.push(CLOSING_DIRECTIVE.to_string());
    sections.join("\n\n")
}

fn window(
    persona: &Persona,
    scenario: Option<&Scenario>,
    history: &[Turn],
    user_turn: &Turn,
) -> Vec<ChatMessage> {
    let limit = if scenario.is_some() {
        GROUP_WINDOW
    } else {
        DIRECT_WINDOW
    };

    let mut trailing = vec![user_turn];
    if let Some(scenario) = scenario {
        trailing.extend(
            scenario
                .same_turn_replies
                .iter()
                .filter(|turn| turn.author_id != persona.id),
        );
    }

    let room = limit.saturating_sub(trailing.len());
    let start = history.len().saturating_sub(room);

    let mut messages: Vec<ChatMessage> = history[start..]
        .iter()
        .chain(trailing)
        .map(|turn| to_message(persona, scenario, turn))
        .collect();

    let leading_assistant = messages
        .iter()
        .take_while(|message| message.role == Role::Assistant)
        .count();
    messages.drain(..leading_assistant);

    messages
}

fn to_message(persona: &Persona, scenario: Option<&Scenario>, turn: &Turn) -> ChatMessage {
    match (turn.role, scenario) {
        (Role::User, _) => ChatMessage::user(turn.text.clone()),
        (Role::Assistant, _) if turn.author_id == persona.id => {
            ChatMessage::assistant(turn.text.clone())
        }
        (Role::Assistant, Some(scenario)) => ChatMessage::user(format!(
            "[{}]: {}",
            scenario.display_name(&turn.author_id),
            turn.text
        )),
        (Role::Assistant, None) => ChatMessage::assistant(turn.text.clone()),
    }
}
