//! Gateway and group orchestration for the persona chat service.
//!
//! This crate provides the [`Gateway`] type, the single entry point behind
//! the HTTP surface. It ties a [`ConversationStore`](persona_core::ConversationStore)
//! and a [`ChatProvider`](persona_core::ChatProvider) together.
//!
//! # Architecture
//!
//! ```text
//! chat(botId, message, conversationId?)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         GATEWAY                             │
//! │                                                             │
//! │  1. Validate message (non-empty, ≤1000 chars)               │
//! │         ↓                                                   │
//! │  2. Load persona, find or create conversation               │
//! │         ↓                                                   │
//! │  3. Append user turn                                        │
//! │         ↓                                                   │
//! │  4. Assemble prompt → provider (until the deadline)         │
//! │         ↓                                                   │
//! │  5. ok → reply text   unauthorized → 503   else → fallback  │
//! │         ↓                                                   │
//! │  6. Append assistant turn                                   │
//! └─────────────────────────────────────────────────────────────┘
//!
//! group_send(groupId, senderId, text)
//!   user turn → probe → narrator (sequential) → members (concurrent)
//!   → append replies in responder order
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mock_provider::{ProviderReply, ScriptedProvider};
//! use orchestrator::Gateway;
//! use persona_core::{GenerationParams, MemoryStore, Persona};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     store
//!         .insert_persona(Persona {
//!             id: "pip".to_string(),
//!             display_name: "Pip".to_string(),
//!             system_instruction: "You are Pip, a wooden puppet.".to_string(),
//!             style_hints: None,
//!             generation_params: GenerationParams::default(),
//!             fallback_lines: vec!["*creaks*".to_string()],
//!         })
//!         .await;
//!
//!     let provider = Arc::new(ScriptedProvider::always(ProviderReply::Ok("Hello!".to_string())));
//!     let gateway = Gateway::new(store, provider);
//!
//!     let outcome = gateway.chat("pip", "hi", None).await?;
//!     println!("{} ({})", outcome.response, outcome.conversation_id);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod gateway;
mod group;
mod reply;
mod validation;

pub use config::{GatewayConfig, DEFAULT_REQUEST_DEADLINE, DIRECT_USER_ID, MAX_MESSAGE_CHARS};
pub use error::GatewayError;
pub use gateway::{ChatOutcome, Gateway};
pub use group::{GroupOrchestrator, GroupOutcome, GroupReply};
pub use validation::validate_message;
