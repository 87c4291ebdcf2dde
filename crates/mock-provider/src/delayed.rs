//! Delayed provider - wraps another provider with artificial delay.

use std::time::Duration;

use persona_core::{async_trait, ChatProvider, ChatRequest, ProbeStatus, ProviderReply};
use tokio::time::sleep;

/// A provider that wraps another provider and adds artificial delay.
///
/// Useful for testing deadlines and concurrent fan-out.
pub struct DelayedProvider<P: ChatProvider> {
    inner: P,
    delay: Duration,
}

impl<P: ChatProvider> DelayedProvider<P> {
    /// Wrap `inner`, delaying every reply by `delay`.
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a provider with a delay in milliseconds.
    pub fn with_millis(inner: P, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<P: ChatProvider> ChatProvider for DelayedProvider<P> {
    async fn execute(&self, request: &ChatRequest) -> ProviderReply {
        sleep(self.delay).await;
        self.inner.execute(request).await
    }

    fn name(&self) -> &str {
        "DelayedProvider"
    }

    async fn probe(&self) -> ProbeStatus {
        self.inner.probe().await
    }
}
