//! Configuration management for the NeuroPulse gateway
//!
//! Bootstrap configuration comes from a TOML file; every field has a
//! built-in default so a missing file never prevents startup.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--host, --port, --config)
//! 2. Environment variables (NEUROPULSE_HOST, NEUROPULSE_PORT,
//!    NEUROPULSE_CONFIG, OPENAI_API_KEY)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use pulse_common::{Error, FusionPolicy, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable supplying the recommendation API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Gateway configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    ///
    /// Default: 8000
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body (image and audio uploads)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Inference backend locations and timeouts
    #[serde(default)]
    pub backends: BackendConfig,

    /// LLM recommendation requester
    #[serde(default)]
    pub recommendation: RecommendationConfig,

    /// Fusion weighting and stress policy
    #[serde(default)]
    pub fusion: FusionPolicy,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Inference backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Text emotion service base URL
    #[serde(default = "default_text_url")]
    pub text_url: String,

    /// Face emotion service base URL
    #[serde(default = "default_face_url")]
    pub face_url: String,

    /// Audio emotion service base URL
    #[serde(default = "default_audio_url")]
    pub audio_url: String,

    /// Timeout for one analysis request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for one backend health check
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

/// Recommendation (LLM) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model name sent with every request
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key; falls back to OPENAI_API_KEY. Without one, the fallback
    /// payload is always used.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound on one recommendation request
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_text_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_face_url() -> String {
    "http://127.0.0.1:5002".to_string()
}

fn default_audio_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_health_timeout_ms() -> u64 {
    500
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.6
}

fn default_max_tokens() -> u32 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            text_url: default_text_url(),
            face_url: default_face_url(),
            audio_url: default_audio_url(),
            request_timeout_secs: default_request_timeout_secs(),
            health_timeout_ms: default_health_timeout_ms(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl RecommendationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            backends: BackendConfig::default(),
            recommendation: RecommendationConfig::default(),
            fusion: FusionPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Parse TOML content and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GatewayConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path or the default location
    ///
    /// An explicit path must exist and parse. The default location is
    /// optional: when absent, built-in defaults are used with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                Some(path) => {
                    warn!(
                        "Config file not found at {}, using built-in defaults",
                        path.display()
                    );
                    Self::default()
                }
                None => {
                    warn!("Could not determine config directory, using built-in defaults");
                    Self::default()
                }
            },
        };

        config.apply_env();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Fill values that may come from the environment
    pub fn apply_env(&mut self) {
        if self.recommendation.api_key.is_none() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                if !key.trim().is_empty() {
                    info!("Recommendation API key loaded from environment variable");
                    self.recommendation.api_key = Some(key);
                }
            }
        }
    }

    /// Check values that defaults cannot make safe
    pub fn validate(&self) -> Result<()> {
        self.fusion.validate()?;

        for (name, url) in [
            ("backends.text_url", &self.backends.text_url),
            ("backends.face_url", &self.backends.face_url),
            ("backends.audio_url", &self.backends.audio_url),
            ("recommendation.endpoint", &self.recommendation.endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }

        if self.backends.request_timeout_secs == 0
            || self.backends.health_timeout_ms == 0
            || self.recommendation.timeout_secs == 0
        {
            return Err(Error::Config("Timeouts must be greater than zero".to_string()));
        }

        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than zero".to_string()));
        }

        Ok(())
    }
}

/// `<config_dir>/neuropulse/gateway.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("neuropulse").join("gateway.toml"))
}
