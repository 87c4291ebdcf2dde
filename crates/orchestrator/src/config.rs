//! Gateway configuration.

use std::time::Duration;

/// Default overall deadline for one gateway request.
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(90);

/// Longest accepted user message, in characters after trimming.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Author id recorded for user turns of 1:1 chats.
pub const DIRECT_USER_ID: &str = "user";

/// Configuration for [`Gateway`](crate::Gateway).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Overall deadline per request. Responders still waiting when it
    /// passes answer with a fallback line.
    pub request_deadline: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_deadline: DEFAULT_REQUEST_DEADLINE,
        }
    }
}

impl GatewayConfig {
    /// Set the overall request deadline.
    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }
}
