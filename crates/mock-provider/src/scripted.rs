//! Scripted provider - canned replies chosen per request.

use std::collections::VecDeque;

use persona_core::{async_trait, ChatProvider, ChatRequest, ProbeStatus, ProviderReply};
use tokio::sync::Mutex;

/// A provider whose replies are fixed up front.
///
/// For each request the first rule whose needle occurs in the system
/// instruction wins. Without a matching rule the next queued reply is used,
/// and once the queue is empty the default reply. Every request is recorded.
pub struct ScriptedProvider {
    rules: Vec<(String, ProviderReply)>,
    queue: Mutex<VecDeque<ProviderReply>>,
    default_reply: ProviderReply,
    probe_status: ProbeStatus,
    requests: Mutex<Vec<ChatRequest>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            default_reply: ProviderReply::Ok("Scripted reply.".to_string()),
            probe_status: ProbeStatus::Ready,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedProvider {
    /// Create a provider that always answers "Scripted reply.".
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that always returns `reply`.
    pub fn always(reply: ProviderReply) -> Self {
        Self::new().with_default(reply)
    }

    /// Reply used when no rule matches and the queue is empty.
    pub fn with_default(mut self, reply: ProviderReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Reply with `reply` whenever the system instruction contains `needle`.
    pub fn with_rule(mut self, needle: impl Into<String>, reply: ProviderReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Queue a one-shot reply.
    pub fn then(mut self, reply: ProviderReply) -> Self {
        self.queue.get_mut().push_back(reply);
        self
    }

    /// Status reported by `probe`.
    pub fn with_probe(mut self, status: ProbeStatus) -> Self {
        self.probe_status = status;
        self
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn execute(&self, request: &ChatRequest) -> ProviderReply {
        self.requests.lock().await.push(request.clone());

        if let Some((_, reply)) = self
            .rules
            .iter()
            .find(|(needle, _)| request.system_instruction.contains(needle.as_str()))
        {
            return reply.clone();
        }

        match self.queue.lock().await.pop_front() {
            Some(reply) => reply,
            None => self.default_reply.clone(),
        }
    }

    fn name(&self) -> &str {
        "ScriptedProvider"
    }

    async fn probe(&self) -> ProbeStatus {
        self.probe_status
    }
}
