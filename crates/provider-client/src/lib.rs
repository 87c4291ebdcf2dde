//! LLM provider client for the persona chat gateway.
//!
//! This crate executes a provider-agnostic [`ChatRequest`] against an ordered
//! list of providers, each with an ordered model catalogue. It absorbs rate
//! limits, transient failures, and quota exhaustion, and classifies every
//! outcome into a [`ProviderReply`].
//!
//! # Features
//!
//! - OpenRouter (OpenAI-compatible) and Gemini wire formats
//! - Row-major walk of the provider × model fallback matrix
//! - Exponential backoff between retries of the same model
//! - Immediate abort on rejected credentials
//! - Cached connection probe and a "last good model" hint
//!
//! # Usage
//!
//! ```rust,no_run
//! use provider_client::ProviderClient;
//! use persona_core::{assemble, ChatProvider, GenerationParams, Persona, Turn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ProviderClient::from_env()?;
//!
//!     let persona = Persona {
//!         id: "pip".to_string(),
//!         display_name: "Pip".to_string(),
//!         system_instruction: "You are Pip, a wooden puppet.".to_string(),
//!         style_hints: None,
//!         generation_params: GenerationParams::default(),
//!         fallback_lines: vec!["*creaks*".to_string()],
//!     };
//!     let request = assemble(&persona, None, &[], &Turn::user("user-1", "hello"));
//!
//!     let reply = client.execute(&request).await;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod dialect;
mod error;
mod gemini;
mod openrouter;
mod sleeper;

pub use client::{AttemptRecord, Execution, ProviderClient, PROBE_PROMPT};
pub use config::{
    ProviderClientConfig, ProviderClientConfigBuilder, ProviderKind, ProviderSettings,
    DEFAULT_GEMINI_MODELS, DEFAULT_GEMINI_URL, DEFAULT_OPENROUTER_MODELS, DEFAULT_OPENROUTER_URL,
};
pub use dialect::{Dialect, ReplyError};
pub use error::ProviderError;
pub use sleeper::{Sleeper, TokioSleeper};

// Re-export persona-core types for convenience
pub use persona_core::{ChatProvider, ChatRequest, ProbeStatus, ProviderReply, RetryReason};
