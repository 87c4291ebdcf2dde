//! Core trait and types for the persona chat gateway.
//!
//! This crate provides the shared vocabulary for every other crate in the
//! workspace. It defines:
//!
//! - [`Persona`], [`Turn`], [`Conversation`], [`Group`] - The data model
//! - [`ChatRequest`] / [`ProviderReply`] - What goes to a model and what comes back
//! - [`ChatProvider`] - The trait that model backends implement
//! - [`ConversationStore`] - The persistence contract the gateway consumes
//! - [`assemble`] - Turns a persona plus history into a [`ChatRequest`]
//! - [`fallback_line`] - The in-character reply used when no model answers
//!
//! # Example
//!
//! ```rust
//! use persona_core::{assemble, GenerationParams, Persona, Turn};
//!
//! let persona = Persona {
//!     id: "puppet".to_string(),
//!     display_name: "Pip".to_string(),
//!     system_instruction: "You are Pip, a wooden puppet.".to_string(),
//!     style_hints: None,
//!     generation_params: GenerationParams::new(0.7, 400),
//!     fallback_lines: vec!["*creaks* the gears of the world skipped a beat".to_string()],
//! };
//!
//! let user_turn = Turn::user("user-1", "hello");
//! let request = assemble(&persona, None, &[], &user_turn);
//! assert_eq!(request.messages.len(), 1);
//! ```

mod assembler;
mod conversation;
mod error;
mod fallback;
mod memory;
mod persona;
mod prompt;
mod provider;
mod request;
mod store;

pub use assembler::{
    assemble, clamp_params, Participant, Scenario, CLOSING_DIRECTIVE, DIRECT_WINDOW,
    GROUP_WINDOW, MAX_OUTPUT_TOKENS, MAX_TEMPERATURE, MIN_OUTPUT_TOKENS, MIN_TEMPERATURE,
};
pub use conversation::{now_micros, Conversation, ConversationSubject, Group, Role, Turn};
pub use error::{PersonaError, StoreError};
pub use fallback::{fallback_line, fallback_line_with, DEFAULT_FALLBACK_LINE};
pub use memory::MemoryStore;
pub use persona::{contains_forbidden_word, GenerationParams, Persona, FORBIDDEN_PROVIDER_NAMES};
pub use prompt::hash_prompt;
pub use provider::{ChatProvider, ProbeStatus};
pub use request::{ChatMessage, ChatRequest, ProviderReply, RetryReason};
pub use store::ConversationStore;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
