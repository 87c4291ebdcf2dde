//! Configuration for ProviderClient.

use std::env;
use std::time::Duration;

use crate::dialect::Dialect;
use crate::error::ProviderError;
use crate::gemini::GeminiDialect;
use crate::openrouter::OpenRouterDialect;

/// Default OpenRouter API base URL.
pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default OpenRouter model catalogue, most preferred first.
pub const DEFAULT_OPENROUTER_MODELS: &[&str] = &[
    "meta-llama/llama-3.3-70b-instruct:free",
    "mistralai/mistral-small-3.1-24b-instruct:free",
    "google/gemma-3-27b-it:free",
];

/// Default Gemini model catalogue, most preferred first.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-flash"];

/// Wire format spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (OpenRouter family).
    OpenRouter,
    /// Gemini `generateContent`.
    Gemini,
}

impl ProviderKind {
    /// The dialect implementing this wire format.
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            ProviderKind::OpenRouter => &OpenRouterDialect,
            ProviderKind::Gemini => &GeminiDialect,
        }
    }
}

/// One entry of the provider list.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Name used in logs and attempt records.
    pub name: String,
    /// Wire format.
    pub kind: ProviderKind,
    /// API base URL.
    pub endpoint_url: String,
    /// Header carrying the credential, as (name, value).
    pub auth_header: (String, String),
    /// Model identifiers, most preferred first.
    pub models: Vec<String>,
    /// Extra headers sent with every request.
    pub auxiliary_headers: Vec<(String, String)>,
}

impl ProviderSettings {
    /// OpenRouter with bearer auth and optional attribution headers.
    pub fn openrouter(
        api_key: impl Into<String>,
        http_referer: Option<String>,
        app_title: Option<String>,
    ) -> Self {
        let mut auxiliary_headers = Vec::new();
        if let Some(referer) = http_referer {
            auxiliary_headers.push(("HTTP-Referer".to_string(), referer));
        }
        if let Some(title) = app_title {
            auxiliary_headers.push(("X-Title".to_string(), title));
        }

        Self {
            name: "openrouter".to_string(),
            kind: ProviderKind::OpenRouter,
            endpoint_url: DEFAULT_OPENROUTER_URL.to_string(),
            auth_header: (
                "Authorization".to_string(),
                format!("Bearer {}", api_key.into()),
            ),
            models: DEFAULT_OPENROUTER_MODELS
                .iter()
                .map(|model| model.to_string())
                .collect(),
            auxiliary_headers,
        }
    }

    /// Gemini with API-key header auth.
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            name: "gemini".to_string(),
            kind: ProviderKind::Gemini,
            endpoint_url: DEFAULT_GEMINI_URL.to_string(),
            auth_header: ("x-goog-api-key".to_string(), api_key.into()),
            models: DEFAULT_GEMINI_MODELS
                .iter()
                .map(|model| model.to_string())
                .collect(),
            auxiliary_headers: Vec::new(),
        }
    }

    /// Override the API base URL.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    /// Override the model catalogue.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Override the provider name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Configuration for ProviderClient.
#[derive(Debug, Clone)]
pub struct ProviderClientConfig {
    /// Providers, primary first.
    pub providers: Vec<ProviderSettings>,

    /// Time budget of a single HTTP attempt.
    pub per_attempt_timeout: Duration,

    /// Attempts per model before moving on.
    pub max_attempts_per_model: u32,

    /// Base of the exponential backoff, in seconds.
    pub backoff_base: f64,

    /// Upper bound of a single backoff sleep.
    pub backoff_cap: Duration,

    /// How long a probe result stays valid.
    pub probe_ttl: Duration,
}

impl Default for ProviderClientConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            per_attempt_timeout: Duration::from_secs(45),
            max_attempts_per_model: 3,
            backoff_base: 1.5,
            backoff_cap: Duration::from_secs(30),
            probe_ttl: Duration::from_secs(60),
        }
    }
}

impl ProviderClientConfig {
    /// Create configuration from environment variables.
    ///
    /// A provider is enabled when its key is set. Order is OpenRouter, then
    /// Gemini.
    ///
    /// - `PROVIDER_API_KEY_OPENROUTER` - OpenRouter API key
    /// - `PROVIDER_API_KEY_GEMINI` - Gemini API key
    /// - `HTTP_REFERER` - OpenRouter attribution referrer (optional)
    /// - `APP_TITLE` - OpenRouter attribution title (optional)
    pub fn from_env() -> Result<Self, ProviderError> {
        let mut providers = Vec::new();

        if let Some(key) = non_empty_var("PROVIDER_API_KEY_OPENROUTER") {
            providers.push(ProviderSettings::openrouter(
                key,
                non_empty_var("HTTP_REFERER"),
                non_empty_var("APP_TITLE"),
            ));
        }

        if let Some(key) = non_empty_var("PROVIDER_API_KEY_GEMINI") {
            providers.push(ProviderSettings::gemini(key));
        }

        if providers.is_empty() {
            return Err(ProviderError::Configuration(
                "no PROVIDER_API_KEY_* variable is set".to_string(),
            ));
        }

        Ok(Self {
            providers,
            ..Self::default()
        })
    }

    /// Create a new config builder.
    pub fn builder() -> ProviderClientConfigBuilder {
        ProviderClientConfigBuilder::default()
    }

    /// Delay before the `retry`-th retry of a model (1-based).
    ///
    /// `backoff_base × 2^(retry − 1)` seconds, capped at `backoff_cap`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let secs = self.backoff_base * 2f64.powi(exponent);
        let cap = self.backoff_cap.as_secs_f64();
        Duration::from_secs_f64(secs.clamp(0.0, cap))
    }

    /// Check that the client has something to call.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.providers.is_empty() {
            return Err(ProviderError::Configuration(
                "at least one provider is required".to_string(),
            ));
        }

        if let Some(provider) = self.providers.iter().find(|p| p.models.is_empty()) {
            return Err(ProviderError::Configuration(format!(
                "provider {} has an empty model catalogue",
                provider.name
            )));
        }

        if !self.backoff_base.is_finite() || self.backoff_base < 0.0 {
            return Err(ProviderError::Configuration(format!(
                "backoff_base must be a finite, non-negative number of seconds, got {}",
                self.backoff_base
            )));
        }

        if self.max_attempts_per_model == 0 {
            return Err(ProviderError::Configuration(
                "max_attempts_per_model must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Builder for ProviderClientConfig.
#[derive(Debug, Default)]
pub struct ProviderClientConfigBuilder {
    config: ProviderClientConfig,
}

impl ProviderClientConfigBuilder {
    /// Append a provider.
    pub fn provider(mut self, provider: ProviderSettings) -> Self {
        self.config.providers.push(provider);
        self
    }

    /// Set the per-attempt timeout.
    pub fn per_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.per_attempt_timeout = timeout;
        self
    }

    /// Set the attempts per model.
    pub fn max_attempts_per_model(mut self, attempts: u32) -> Self {
        self.config.max_attempts_per_model = attempts;
        self
    }

    /// Set the backoff base in seconds.
    pub fn backoff_base(mut self, base: f64) -> Self {
        self.config.backoff_base = base;
        self
    }

    /// Set the backoff cap.
    pub fn backoff_cap(mut self, cap: Duration) -> Self {
        self.config.backoff_cap = cap;
        self
    }

    /// Set the probe cache lifetime.
    pub fn probe_ttl(mut self, ttl: Duration) -> Self {
        self.config.probe_ttl = ttl;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ProviderClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderClientConfig::default();

        assert!(config.providers.is_empty());
        assert_eq!(config.per_attempt_timeout, Duration::from_secs(45));
        assert_eq!(config.max_attempts_per_model, 3);
        assert_eq!(config.backoff_base, 1.5);
        assert_eq!(config.probe_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_schedule() {
        let config = ProviderClientConfig::default();

        assert_eq!(config.backoff_delay(1), Duration::from_millis(1500));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(3));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(6));
        assert_eq!(config.backoff_delay(5), Duration::from_secs(24));
        assert_eq!(config.backoff_delay(6), Duration::from_secs(30));
        assert_eq!(config.backoff_delay(60), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_bad_backoff_base() {
        for base in [f64::NAN, f64::INFINITY, -1.0] {
            let config = ProviderClientConfig::builder()
                .provider(ProviderSettings::gemini("key"))
                .backoff_base(base)
                .build();
            assert!(matches!(
                config.validate(),
                Err(ProviderError::Configuration(_))
            ));
        }

        let config = ProviderClientConfig::builder()
            .provider(ProviderSettings::gemini("key"))
            .backoff_base(0.0)
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_openrouter_settings() {
        let settings = ProviderSettings::openrouter(
            "sk-test",
            Some("https://personas.example".to_string()),
            Some("Persona Chat".to_string()),
        );

        assert_eq!(settings.kind, ProviderKind::OpenRouter);
        assert_eq!(
            settings.auth_header,
            ("Authorization".to_string(), "Bearer sk-test".to_string())
        );
        assert_eq!(settings.auxiliary_headers.len(), 2);
        assert_eq!(settings.models.len(), DEFAULT_OPENROUTER_MODELS.len());
    }

    #[test]
    fn test_builder_all_options() {
        let config = ProviderClientConfig::builder()
            .provider(ProviderSettings::gemini("g-key").with_models(["gemini-x"]))
            .per_attempt_timeout(Duration::from_secs(5))
            .max_attempts_per_model(2)
            .backoff_base(0.5)
            .backoff_cap(Duration::from_secs(4))
            .probe_ttl(Duration::from_secs(10))
            .build();

        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].models, vec!["gemini-x".to_string()]);
        assert_eq!(config.per_attempt_timeout, Duration::from_secs(5));
        assert_eq!(config.max_attempts_per_model, 2);
        assert_eq!(config.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(config.backoff_delay(5), Duration::from_secs(4));
        assert_eq!(config.probe_ttl, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(ProviderClientConfig::default().validate().is_err());

        let config = ProviderClientConfig::builder()
            .provider(ProviderSettings::gemini("g-key").with_models(Vec::<String>::new()))
            .build();
        assert!(config.validate().is_err());
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_vars() {
            std::env::remove_var("PROVIDER_API_KEY_OPENROUTER");
            std::env::remove_var("PROVIDER_API_KEY_GEMINI");
            std::env::remove_var("HTTP_REFERER");
            std::env::remove_var("APP_TITLE");
        }

        // Scenario 1: no keys
        clear_all_vars();
        match ProviderClientConfig::from_env() {
            Err(ProviderError::Configuration(msg)) => assert!(msg.contains("PROVIDER_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Scenario 2: both providers, attribution headers
        clear_all_vars();
        std::env::set_var("PROVIDER_API_KEY_OPENROUTER", "or-key");
        std::env::set_var("PROVIDER_API_KEY_GEMINI", "g-key");
        std::env::set_var("HTTP_REFERER", "https://personas.example");
        std::env::set_var("APP_TITLE", "Persona Chat");

        let config = ProviderClientConfig::from_env().unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].name, "openrouter");
        assert_eq!(config.providers[1].name, "gemini");
        assert!(config.providers[0]
            .auxiliary_headers
            .contains(&("X-Title".to_string(), "Persona Chat".to_string())));

        // Scenario 3: Gemini only, blank OpenRouter key ignored
        clear_all_vars();
        std::env::set_var("PROVIDER_API_KEY_OPENROUTER", "  ");
        std::env::set_var("PROVIDER_API_KEY_GEMINI", "g-key");

        let config = ProviderClientConfig::from_env().unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].kind, ProviderKind::Gemini);

        clear_all_vars();
    }
}
