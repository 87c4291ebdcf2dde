//! ProviderClient: walks the provider × model matrix for one request.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use persona_core::{
    async_trait, hash_prompt, ChatMessage, ChatProvider, ChatRequest, GenerationParams,
    ProbeStatus, ProviderReply, RetryReason,
};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{ProviderClientConfig, ProviderSettings};
use crate::dialect::{classify_reported, Dialect, ReplyError};
use crate::error::ProviderError;
use crate::sleeper::{Sleeper, TokioSleeper};

/// User text sent by [`ProviderClient::probe_connection`].
pub const PROBE_PROMPT: &str = "Reply with OK.";

/// One HTTP attempt against one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub provider: String,
    pub model: String,
    /// 1-based attempt number for this model.
    pub attempt: u32,
    pub outcome: ProviderReply,
}

/// Final reply plus every attempt that led to it.
#[derive(Debug, Clone)]
pub struct Execution {
    pub reply: ProviderReply,
    pub attempts: Vec<AttemptRecord>,
}

/// Executes chat requests against the configured providers.
///
/// Models are tried in row-major order (every model of the primary provider,
/// then the next provider), starting at the model that last produced a
/// reply. Each model gets up to `max_attempts_per_model` attempts with
/// exponential backoff between retryable failures. Rejected credentials end
/// the walk at once.
pub struct ProviderClient {
    http: Client,
    config: ProviderClientConfig,
    sleeper: Arc<dyn Sleeper>,
    /// (provider index, model index), row-major.
    slots: Vec<(usize, usize)>,
    last_good: AtomicUsize,
    probe_cache: RwLock<Option<(Instant, ProbeStatus)>>,
}

impl ProviderClient {
    /// Create a new ProviderClient with the given configuration.
    pub fn new(config: ProviderClientConfig) -> Result<Self, ProviderError> {
        config.validate()?;

        let http = Client::builder().build().map_err(|e| {
            ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        let slots = config
            .providers
            .iter()
            .enumerate()
            .flat_map(|(p, provider)| (0..provider.models.len()).map(move |m| (p, m)))
            .collect();

        info!(
            "ProviderClient initialized with providers: [{}], per-attempt timeout: {:?}",
            config
                .providers
                .iter()
                .map(|p| format!("{} ({} models)", p.name, p.models.len()))
                .collect::<Vec<_>>()
                .join(", "),
            config.per_attempt_timeout
        );

        Ok(Self {
            http,
            config,
            sleeper: Arc::new(TokioSleeper),
            slots,
            last_good: AtomicUsize::new(0),
            probe_cache: RwLock::new(None),
        })
    }

    /// Create a ProviderClient from environment variables.
    ///
    /// See [`ProviderClientConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(ProviderClientConfig::from_env()?)
    }

    /// Replace the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ProviderClientConfig {
        &self.config
    }

    /// Execute a request and keep the full attempt chain.
    pub async fn execute_traced(&self, request: &ChatRequest) -> Execution {
        debug!(
            "Executing chat request ({} messages), system prompt fingerprint: {}",
            request.messages.len(),
            hash_prompt(&request.system_instruction)
        );

        let mut attempts = Vec::new();

        for slot in self.slot_order() {
            let (p, m) = self.slots[slot];
            let provider = &self.config.providers[p];
            let model = provider.models[m].as_str();

            let mut attempt = 0;
            while attempt < self.config.max_attempts_per_model {
                attempt += 1;
                let outcome = self.attempt(provider, model, request).await;

                if outcome.is_ok() {
                    info!(provider = %provider.name, model, attempt, outcome = %outcome, "provider attempt");
                } else {
                    warn!(provider = %provider.name, model, attempt, outcome = %outcome, "provider attempt");
                }

                attempts.push(AttemptRecord {
                    provider: provider.name.clone(),
                    model: model.to_string(),
                    attempt,
                    outcome: outcome.clone(),
                });

                match outcome {
                    ProviderReply::Ok(text) => {
                        self.last_good.store(slot, Ordering::Relaxed);
                        return Execution {
                            reply: ProviderReply::Ok(text),
                            attempts,
                        };
                    }
                    ProviderReply::Unauthorized => {
                        warn!(
                            provider = %provider.name,
                            "Credentials rejected, abandoning remaining models"
                        );
                        return Execution {
                            reply: ProviderReply::Unauthorized,
                            attempts,
                        };
                    }
                    ProviderReply::QuotaExhausted | ProviderReply::Terminal(_) => break,
                    ProviderReply::Retryable(RetryReason::Empty) => {}
                    ProviderReply::Retryable(_) | ProviderReply::Timeout => {
                        if attempt < self.config.max_attempts_per_model {
                            let delay = self.config.backoff_delay(attempt);
                            debug!("Backing off {:?} before retrying {}", delay, model);
                            self.sleeper.sleep(delay).await;
                        }
                    }
                }
            }
        }

        warn!(
            "All models exhausted after {} attempts: {}",
            attempts.len(),
            attempts
                .iter()
                .map(|a| format!("{}/{}#{}={}", a.provider, a.model, a.attempt, a.outcome))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Execution {
            reply: ProviderReply::Terminal("all-exhausted".to_string()),
            attempts,
        }
    }

    /// Send a minimal request to the primary model and report whether the
    /// credentials work. Results are cached for `probe_ttl`.
    pub async fn probe_connection(&self) -> ProbeStatus {
        if let Some((checked_at, status)) = *self.probe_cache.read().await {
            if checked_at.elapsed() < self.config.probe_ttl {
                return status;
            }
        }

        let status = match self.slots.first() {
            Some(&(p, m)) => {
                let provider = &self.config.providers[p];
                let request = ChatRequest {
                    system_instruction: "Connectivity check.".to_string(),
                    messages: vec![ChatMessage::user(PROBE_PROMPT)],
                    params: GenerationParams::new(0.1, 128),
                };
                match self.attempt(provider, &provider.models[m], &request).await {
                    ProviderReply::Ok(_) => ProbeStatus::Ready,
                    ProviderReply::Unauthorized => ProbeStatus::Unauthorized,
                    other => {
                        debug!("Probe of {} returned {}", provider.name, other);
                        ProbeStatus::Unavailable
                    }
                }
            }
            None => ProbeStatus::Unavailable,
        };

        info!("Provider probe result: {:?}", status);
        *self.probe_cache.write().await = Some((Instant::now(), status));
        status
    }

    /// Hint slot first, then every other slot in row-major order.
    fn slot_order(&self) -> impl Iterator<Item = usize> + '_ {
        let hint = self.last_good.load(Ordering::Relaxed);
        let hint = (hint < self.slots.len()).then_some(hint);
        hint.into_iter()
            .chain((0..self.slots.len()).filter(move |slot| Some(*slot) != hint))
    }

    async fn attempt(
        &self,
        provider: &ProviderSettings,
        model: &str,
        request: &ChatRequest,
    ) -> ProviderReply {
        let dialect = provider.kind.dialect();

        let body = match dialect.body(model, request) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode request for {}: {}", model, e);
                return ProviderReply::Terminal("encode".to_string());
            }
        };

        let url = dialect.endpoint(&provider.endpoint_url, model);
        let (auth_name, auth_value) = &provider.auth_header;
        let mut builder = self
            .http
            .post(&url)
            .header(auth_name.as_str(), auth_value.as_str())
            .json(&body);
        for (name, value) in &provider.auxiliary_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        match tokio::time::timeout(self.config.per_attempt_timeout, exchange).await {
            Err(_) => ProviderReply::Timeout,
            Ok(Err(e)) if e.is_timeout() => ProviderReply::Timeout,
            Ok(Err(e)) => {
                debug!("Transport error calling {}: {}", url, e);
                ProviderReply::Retryable(RetryReason::Transport)
            }
            Ok(Ok((status, text))) => classify_response(dialect, status, &text),
        }
    }
}

fn classify_response(dialect: &dyn Dialect, status: u16, body: &str) -> ProviderReply {
    if !(200..300).contains(&status) {
        return dialect.classify_error(status, body);
    }

    match dialect.parse_reply(body) {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                ProviderReply::Retryable(RetryReason::Empty)
            } else {
                ProviderReply::Ok(text.to_string())
            }
        }
        Err(ReplyError::Malformed(detail)) => {
            warn!("Malformed provider response: {}", detail);
            ProviderReply::Terminal("malformed".to_string())
        }
        Err(ReplyError::Reported { code, message }) => classify_reported(code, &message),
    }
}

#[async_trait]
impl ChatProvider for ProviderClient {
    async fn execute(&self, request: &ChatRequest) -> ProviderReply {
        self.execute_traced(request).await.reply
    }

    fn name(&self) -> &str {
        "provider-client"
    }

    async fn probe(&self) -> ProbeStatus {
        self.probe_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn ok_body(text: &str) -> serde_json::Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
    }

    fn openrouter(server: &MockServer, models: &[&str]) -> ProviderSettings {
        ProviderSettings::openrouter(
            "test-key",
            Some("https://personas.example".to_string()),
            Some("Persona Gateway".to_string()),
        )
        .with_endpoint(server.uri())
        .with_models(models.iter().copied())
    }

    fn client(provider: ProviderSettings) -> (ProviderClient, Arc<RecordingSleeper>) {
        let config = ProviderClientConfig::builder()
            .provider(provider)
            .per_attempt_timeout(Duration::from_secs(5))
            .build();
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = ProviderClient::new(config)
            .unwrap()
            .with_sleeper(sleeper.clone());
        (client, sleeper)
    }

    fn request() -> ChatRequest {
        ChatRequest {
            system_instruction: "You are Pip.".to_string(),
            messages: vec![ChatMessage::user("hello")],
            params: GenerationParams::new(0.7, 400),
        }
    }

    #[test]
    fn test_new_rejects_empty_config() {
        let config = ProviderClientConfig::builder().build();
        assert!(matches!(
            ProviderClient::new(config),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_happy_path_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("HTTP-Referer", "https://personas.example"))
            .and(header("X-Title", "Persona Gateway"))
            .and(body_partial_json(json!({"model": "m1", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("  Hi there.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, sleeper) = client(openrouter(&server, &["m1"]));
        let execution = client.execute_traced(&request()).await;

        assert_eq!(execution.reply, ProviderReply::Ok("Hi there.".to_string()));
        assert_eq!(execution.attempts.len(), 1);
        assert_eq!(execution.attempts[0].provider, "openrouter");
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_then_success_backs_off_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Back again.")))
            .with_priority(2)
            .mount(&server)
            .await;

        let (client, sleeper) = client(openrouter(&server, &["m1"]));
        let execution = client.execute_traced(&request()).await;

        assert_eq!(execution.reply, ProviderReply::Ok("Back again.".to_string()));
        assert_eq!(execution.attempts.len(), 2);
        assert_eq!(
            execution.attempts[0].outcome,
            ProviderReply::Retryable(RetryReason::RateLimited)
        );
        assert_eq!(sleeper.delays(), vec![Duration::from_secs_f64(1.5)]);
    }

    #[tokio::test]
    async fn test_unauthorized_aborts_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let (client, sleeper) = client(openrouter(&server, &["m1", "m2"]));
        let execution = client.execute_traced(&request()).await;

        assert_eq!(execution.reply, ProviderReply::Unauthorized);
        assert_eq!(execution.attempts.len(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_quota_moves_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "m1"})))
            .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "m2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("From m2.")))
            .mount(&server)
            .await;

        let (client, sleeper) = client(openrouter(&server, &["m1", "m2"]));
        let execution = client.execute_traced(&request()).await;

        assert_eq!(execution.reply, ProviderReply::Ok("From m2.".to_string()));
        assert_eq!(execution.attempts[0].outcome, ProviderReply::QuotaExhausted);
        assert_eq!(execution.attempts[1].model, "m2");
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_moves_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "m1"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "m2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Recovered.")))
            .mount(&server)
            .await;

        let (client, _) = client(openrouter(&server, &["m1", "m2"]));
        let execution = client.execute_traced(&request()).await;

        assert_eq!(execution.reply, ProviderReply::Ok("Recovered.".to_string()));
        assert_eq!(
            execution.attempts[0].outcome,
            ProviderReply::Terminal("malformed".to_string())
        );
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_matrix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(6)
            .mount(&server)
            .await;

        let (client, sleeper) = client(openrouter(&server, &["m1", "m2"]));
        let execution = client.execute_traced(&request()).await;

        assert_eq!(
            execution.reply,
            ProviderReply::Terminal("all-exhausted".to_string())
        );
        assert_eq!(execution.attempts.len(), 6);
        assert_eq!(
            execution
                .attempts
                .iter()
                .map(|a| (a.model.as_str(), a.attempt))
                .collect::<Vec<_>>(),
            vec![("m1", 1), ("m1", 2), ("m1", 3), ("m2", 1), ("m2", 2), ("m2", 3)]
        );
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_secs_f64(1.5),
                Duration::from_secs_f64(3.0),
                Duration::from_secs_f64(1.5),
                Duration::from_secs_f64(3.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_reply_retries_without_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("   ")))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Now I speak.")))
            .with_priority(2)
            .mount(&server)
            .await;

        let (client, sleeper) = client(openrouter(&server, &["m1"]));
        let execution = client.execute_traced(&request()).await;

        assert_eq!(execution.reply, ProviderReply::Ok("Now I speak.".to_string()));
        assert_eq!(
            execution.attempts[0].outcome,
            ProviderReply::Retryable(RetryReason::Empty)
        );
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body("too late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = ProviderClientConfig::builder()
            .provider(openrouter(&server, &["m1"]))
            .per_attempt_timeout(Duration::from_millis(100))
            .max_attempts_per_model(1)
            .build();
        let client = ProviderClient::new(config)
            .unwrap()
            .with_sleeper(Arc::new(RecordingSleeper::default()));

        let execution = client.execute_traced(&request()).await;
        assert_eq!(execution.attempts[0].outcome, ProviderReply::Timeout);
        assert_eq!(
            execution.reply,
            ProviderReply::Terminal("all-exhausted".to_string())
        );
    }

    #[tokio::test]
    async fn test_last_good_model_is_tried_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "m1"})))
            .respond_with(ResponseTemplate::new(402))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "m2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("m2 here.")))
            .expect(2)
            .mount(&server)
            .await;

        let (client, _) = client(openrouter(&server, &["m1", "m2"]));

        let first = client.execute_traced(&request()).await;
        assert_eq!(first.attempts.len(), 2);

        let second = client.execute_traced(&request()).await;
        assert_eq!(second.attempts.len(), 1);
        assert_eq!(second.attempts[0].model, "m2");
    }

    #[tokio::test]
    async fn test_falls_through_to_secondary_provider() {
        let primary = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&primary)
            .await;

        let secondary = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Gemini speaks."}]}}]
            })))
            .expect(1)
            .mount(&secondary)
            .await;

        let config = ProviderClientConfig::builder()
            .provider(openrouter(&primary, &["m1"]))
            .provider(
                ProviderSettings::gemini("g-key")
                    .with_endpoint(secondary.uri())
                    .with_models(["gemini-2.0-flash"]),
            )
            .build();
        let client = ProviderClient::new(config).unwrap();

        let execution = client.execute_traced(&request()).await;
        assert_eq!(execution.reply, ProviderReply::Ok("Gemini speaks.".to_string()));
        assert_eq!(execution.attempts[1].provider, "gemini");
    }

    #[tokio::test]
    async fn test_probe_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("OK")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client(openrouter(&server, &["m1"]));
        assert_eq!(client.probe().await, ProbeStatus::Ready);
        assert_eq!(client.probe().await, ProbeStatus::Ready);
    }

    #[tokio::test]
    async fn test_probe_reports_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let (client, _) = client(openrouter(&server, &["m1"]));
        assert_eq!(client.probe().await, ProbeStatus::Unauthorized);
    }
}
