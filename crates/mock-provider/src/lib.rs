//! Mock chat providers for testing the persona chat gateway.
//!
//! This crate provides mock implementations of the `ChatProvider` trait:
//! - `EchoProvider` - Replies with the latest user text
//! - `ScriptedProvider` - Replies from rules, a queue, and a default
//! - `DelayedProvider` - Wraps another provider with artificial delay
//!
//! For real model calls, use the `provider-client` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_provider::{ChatProvider, ProviderReply, ScriptedProvider};
//! use persona_core::{ChatMessage, ChatRequest, GenerationParams};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = ScriptedProvider::new()
//!         .with_rule("You are Pip", ProviderReply::Ok("*creaks* Hello!".to_string()));
//!
//!     let request = ChatRequest {
//!         system_instruction: "You are Pip.".to_string(),
//!         messages: vec![ChatMessage::user("hi")],
//!         params: GenerationParams::default(),
//!     };
//!
//!     let reply = provider.execute(&request).await;
//!     assert_eq!(reply.text(), Some("*creaks* Hello!"));
//! }
//! ```

mod delayed;
mod echo;
mod scripted;

// Re-export persona-core types for convenience
pub use persona_core::{async_trait, ChatProvider, ChatRequest, ProbeStatus, ProviderReply};

pub use delayed::DelayedProvider;
pub use echo::EchoProvider;
pub use scripted::ScriptedProvider;
