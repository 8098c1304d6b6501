//! Configuration management
//!
//! Configuration is layered: built-in defaults, then an optional TOML file, then
//! environment variables. The binary applies command line flags last.

use crate::error::{ErrorContext, ScribeError, ScribeResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub rate_limits: RateLimitSettings,
    pub research: ResearchSettings,
    pub generation: GenerationSettings,
    pub providers: ProviderCredentials,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
    /// Origins allowed by CORS; empty disables the CORS layer
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
    /// Take the client address from `X-Forwarded-For`/`X-Real-IP`. Only enable
    /// behind a reverse proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            cors_origins: vec!["http://localhost:3000".to_string()],
            body_limit_bytes: 2 * 1024 * 1024,
            trust_proxy_headers: false,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Whether anonymous callers may use the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Open,
    #[default]
    Required,
}

impl FromStr for AuthMode {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AuthMode::Open),
            "required" | "private" => Ok(AuthMode::Required),
            other => Err(crate::config_error!(
                format!("Unknown auth mode '{}', expected 'open' or 'required'", other),
                "config"
            )),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Required,
            jwt_secret: None,
            token_ttl_hours: 24 * 7,
            cookie_name: "token".to_string(),
            cookie_secure: true,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

/// One fixed-window policy: at most `limit` requests per `window_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_ms: u64,
}

impl RateLimitPolicy {
    pub const fn new(limit: u32, window_ms: u64) -> Self {
        Self { limit, window_ms }
    }

    pub fn window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.window_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub login: RateLimitPolicy,
    pub research: RateLimitPolicy,
    pub generate: RateLimitPolicy,
    /// Upper bound on tracked client keys per limiter
    pub max_tracked_keys: usize,
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login: RateLimitPolicy::new(5, 15 * 60 * 1000),
            research: RateLimitPolicy::new(20, 60 * 1000),
            generate: RateLimitPolicy::new(10, 60 * 1000),
            max_tracked_keys: 10_000,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    /// Per-adapter timeout
    pub timeout_ms: u64,
    pub max_results_per_source: usize,
    /// Transport timeout for provider HTTP calls, slightly above the adapter timeout
    pub http_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_results_per_source: 5,
            http_timeout_ms: 12_000,
            user_agent: concat!("scribe/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Generation backends that can be placed in the priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAi,
    Groq,
    DeepSeek,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::Groq => "groq",
            BackendKind::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Per-backend request timeout
    pub timeout_ms: u64,
    pub backend_order: Vec<BackendKind>,
    pub temperature: f32,
    pub openai_model: String,
    pub groq_model: String,
    pub deepseek_model: String,
    pub deepseek_base_url: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            backend_order: vec![BackendKind::OpenAi, BackendKind::Groq, BackendKind::DeepSeek],
            temperature: 0.7,
            openai_model: "gpt-4o-mini".to_string(),
            groq_model: "llama-3.1-8b-instant".to_string(),
            deepseek_model: "deepseek-chat".to_string(),
            deepseek_base_url: "https://api.deepseek.com/v1".to_string(),
        }
    }
}

/// API credentials for research providers and generation backends
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub google_search_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
    pub youtube_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub semantic_scholar_api_key: Option<String>,
}

impl ProviderCredentials {
    /// Credential for a generation backend
    pub fn backend_key(&self, kind: BackendKind) -> Option<&str> {
        match kind {
            BackendKind::OpenAi => self.openai_api_key.as_deref(),
            BackendKind::Groq => self.groq_api_key.as_deref(),
            BackendKind::DeepSeek => self.deepseek_api_key.as_deref(),
        }
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("ProviderCredentials")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("groq_api_key", &mask(&self.groq_api_key))
            .field("deepseek_api_key", &mask(&self.deepseek_api_key))
            .field("google_search_api_key", &mask(&self.google_search_api_key))
            .field("google_search_engine_id", &mask(&self.google_search_engine_id))
            .field("youtube_api_key", &mask(&self.youtube_api_key))
            .field("news_api_key", &mask(&self.news_api_key))
            .field("semantic_scholar_api_key", &mask(&self.semantic_scholar_api_key))
            .finish()
    }
}

impl ScribeConfig {
    /// Load configuration from an explicit file, or the default location when present,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> ScribeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };

        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScribeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScribeError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        toml::from_str(&content).map_err(|e| ScribeError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ScribeResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ScribeError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| ScribeError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("SCRIBE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("SCRIBE_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(dev) = get("SCRIBE_DEV_MODE").and_then(|d| d.parse().ok()) {
            self.server.dev_mode = dev;
        }
        if let Some(trust) = get("SCRIBE_TRUST_PROXY_HEADERS").and_then(|t| t.parse().ok()) {
            self.server.trust_proxy_headers = trust;
        }
        if let Some(mode) = get("SCRIBE_AUTH_MODE").and_then(|m| m.parse().ok()) {
            self.auth.mode = mode;
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(level) = get("SCRIBE_LOG_LEVEL") {
            self.logging.level = level;
        }

        let credentials = &mut self.providers;
        let slots: [(&str, &mut Option<String>); 8] = [
            ("OPENAI_API_KEY", &mut credentials.openai_api_key),
            ("GROQ_API_KEY", &mut credentials.groq_api_key),
            ("DEEPSEEK_API_KEY", &mut credentials.deepseek_api_key),
            ("GOOGLE_SEARCH_API_KEY", &mut credentials.google_search_api_key),
            ("GOOGLE_SEARCH_ENGINE_ID", &mut credentials.google_search_engine_id),
            ("YOUTUBE_API_KEY", &mut credentials.youtube_api_key),
            ("NEWS_API_KEY", &mut credentials.news_api_key),
            ("SEMANTIC_SCHOLAR_API_KEY", &mut credentials.semantic_scholar_api_key),
        ];
        for (name, slot) in slots {
            if let Some(value) = get(name) {
                *slot = Some(value);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ScribeResult<()> {
        let invalid = |message: &str, suggestion: &str| ScribeError::Config {
            message: message.to_string(),
            source: None,
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion(suggestion),
        };

        if self.research.timeout_ms == 0 || self.generation.timeout_ms == 0 {
            return Err(invalid(
                "Timeouts must be greater than 0",
                "Set research.timeout_ms and generation.timeout_ms to positive values",
            ));
        }

        if self.research.max_results_per_source == 0 || self.research.max_results_per_source > 50 {
            return Err(invalid(
                "research.max_results_per_source must be between 1 and 50",
                "Use a small value such as 5",
            ));
        }

        for (name, policy) in [
            ("login", &self.rate_limits.login),
            ("research", &self.rate_limits.research),
            ("generate", &self.rate_limits.generate),
        ] {
            if policy.limit == 0 || policy.window_ms == 0 {
                return Err(invalid(
                    &format!("Rate limit policy '{}' needs a positive limit and window", name),
                    "Set limit and window_ms to positive values",
                ));
            }
        }

        if self.rate_limits.max_tracked_keys == 0 {
            return Err(invalid(
                "rate_limits.max_tracked_keys must be greater than 0",
                "Set rate_limits.max_tracked_keys to a positive value",
            ));
        }

        if self.generation.backend_order.is_empty() {
            return Err(invalid(
                "generation.backend_order must list at least one backend",
                "Use [\"openai\", \"groq\", \"deepseek\"]",
            ));
        }

        if self.auth.token_ttl_hours <= 0 {
            return Err(invalid(
                "auth.token_ttl_hours must be greater than 0",
                "Set auth.token_ttl_hours to a positive value",
            ));
        }

        if self.auth.mode == AuthMode::Required
            && !self.server.dev_mode
            && self.auth.jwt_secret.is_none()
        {
            return Err(invalid(
                "JWT_SECRET must be set when authentication is required",
                "Export JWT_SECRET or run with --dev",
            ));
        }

        Ok(())
    }
}

/// `<config dir>/scribe/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scribe").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid_in_dev_mode() {
        let mut config = ScribeConfig::default();
        config.server.dev_mode = true;
        assert!(config.validate().is_ok());

        config.server.dev_mode = false;
        assert!(config.validate().is_err(), "required auth needs a secret");

        config.auth.jwt_secret = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SCRIBE_PORT", "9090"),
            ("SCRIBE_AUTH_MODE", "open"),
            ("SCRIBE_TRUST_PROXY_HEADERS", "true"),
            ("OPENAI_API_KEY", "sk-test"),
            ("NEWS_API_KEY", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = ScribeConfig::default();
        config.apply_env_from(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.mode, AuthMode::Open);
        assert!(config.server.trust_proxy_headers);
        assert_eq!(config.providers.backend_key(BackendKind::OpenAi), Some("sk-test"));
        assert!(config.providers.news_api_key.is_none());
    }

    #[test]
    fn test_rejects_empty_backend_order() {
        let mut config = ScribeConfig::default();
        config.server.dev_mode = true;
        config.generation.backend_order.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = ProviderCredentials {
            openai_api_key: Some("sk-very-secret".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<set>"));
    }
}
