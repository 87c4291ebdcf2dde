//! Application state shared across handlers.

use std::sync::Arc;

use orchestrator::Gateway;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The chat gateway.
    pub gateway: Arc<Gateway>,
}

impl AppState {
    /// Create new application state.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}
