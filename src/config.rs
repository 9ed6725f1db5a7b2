//! Configuration loading and constants.
//!
//! `AppConfig` is built once at startup from an optional TOML file, then
//! overridden by environment variables, then validated. It is read-only
//! afterwards and shared with handlers through `AppState`. The provider API key
//! is only ever taken from the environment and is held as a secret.

use std::path::Path;

use const_format::formatcp;
use secrecy::{ExposeSecret, Secret, SecretString};
use serde::Deserialize;

use crate::http::cors::OriginPattern;

// =============================================================================
// HTTP Surface
// =============================================================================

/// Default listen address (all interfaces, as container platforms expect)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3001;

/// Every response is generated per request and must not be cached
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

/// Seconds to wait for in-flight requests after SIGINT/SIGTERM
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

/// Browser origins allowed to call `/api/*` when none are configured.
/// `*.` matches any subdomain of the suffix under the same scheme.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:8080",
    "http://localhost:8081",
    "http://localhost:8082",
    "http://localhost:8083",
    "https://*.netlify.app",
    "https://*.vercel.app",
    "https://*.up.railway.app",
    "https://lambent-froyo-eb2f40.netlify.app",
];

// =============================================================================
// Story Generation
// =============================================================================

/// Maximum accepted length of a feature description (characters)
pub const MAX_FEATURE_LENGTH: usize = 10_000;

/// Sampling temperature for story generation (maximum randomness)
pub const STORY_TEMPERATURE: f32 = 1.0;

/// Nucleus-sampling threshold for story generation
pub const STORY_TOP_P: f32 = 0.95;

// =============================================================================
// Provider Defaults
// =============================================================================

/// Gemini REST API base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini model used for story generation
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// User-Agent sent on outbound provider requests
pub const USER_AGENT: &str = formatcp!(
    "{}/{}",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_VERSION")
);

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Configuration file read when `--config` is not given (optional)
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when neither `--log-level` nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "story_relay=debug,tower_http=info";

/// Environment label echoed by the health check when none is configured
pub const DEFAULT_ENVIRONMENT: &str = "unknown";

// Environment variable names
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_ENVIRONMENT: &str = "RAILWAY_ENVIRONMENT";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Deployment label echoed by the health check
    #[serde(default = "AppConfig::default_environment")]
    pub environment: String,
    /// Generative-text provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Cross-origin allow-list for `/api/*`
    #[serde(default)]
    pub cors: CorsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            environment: Self::default_environment(),
            provider: ProviderConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }
}

/// Provider API key. Never deserialized from the config file, never logged.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Secret::new(key.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Default for ApiKey {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Generative-text provider (Gemini) settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ProviderConfig::default_model")]
    pub model: String,
    /// Upper bound on one provider call. Unset means wait indefinitely.
    pub request_timeout_seconds: Option<u64>,
    #[serde(skip)]
    pub api_key: ApiKey,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            request_timeout_seconds: None,
            api_key: ApiKey::default(),
        }
    }
}

impl ProviderConfig {
    fn default_base_url() -> String {
        DEFAULT_GEMINI_BASE_URL.to_string()
    }

    fn default_model() -> String {
        DEFAULT_GEMINI_MODEL.to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Self::default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    fn default_allowed_origins() -> Vec<String> {
        DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()
    }

    /// Parse the configured origins into match patterns
    pub fn patterns(&self) -> Result<Vec<OriginPattern>, ConfigError> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                OriginPattern::parse(origin).map_err(|e| {
                    ConfigError::Validation(format!("Invalid CORS origin '{}': {}", origin, e))
                })
            })
            .collect()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    fn default_environment() -> String {
        DEFAULT_ENVIRONMENT.to_string()
    }

    /// Load configuration from the process environment and an optional file.
    ///
    /// With `path == None` the default path is read only if it exists; an
    /// explicitly named file must be readable.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply environment overrides. `lookup` abstracts `std::env::var` so
    /// tests need not mutate the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.provider.api_key = ApiKey::new(key);
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.http.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.http.port = port.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("{} must be a port number, got '{}'", ENV_PORT, port))
            })?;
        }
        if let Some(environment) = lookup(ENV_ENVIRONMENT) {
            self.environment = environment;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.provider.model = model;
        }
        if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
            self.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Apply the `--port` command-line flag, which wins over every other source
    pub fn apply_cli_port(&mut self, port: Option<u16>) {
        if let Some(port) = port {
            self.http.port = port;
        }
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.api_key.is_blank() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::Validation("provider.model must not be empty".to_string()));
        }
        if !(self.provider.base_url.starts_with("http://")
            || self.provider.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "provider.base_url must be an http(s) URL, got '{}'",
                self.provider.base_url
            )));
        }
        if self.provider.request_timeout_seconds == Some(0) {
            return Err(ConfigError::Validation(
                "provider.request_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        self.cors.patterns()?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("GEMINI_API_KEY is not set; refusing to start without a provider API key")]
    MissingApiKey,
    #[error("Configuration error: {0}")]
    Validation(String),
}
