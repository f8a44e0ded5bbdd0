use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors found while validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Main configuration for the clip server
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Upload store configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Trending video source configuration
    #[serde(default)]
    pub trends: TrendsConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Upload store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to and served from
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

/// Which upstream produces the trending feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendProvider {
    /// Pexels video search
    #[default]
    Pexels,
    /// Generated demo records, no network access
    Simulated,
}

/// Trending video source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrendsConfig {
    #[serde(default)]
    pub provider: TrendProvider,
    /// Pexels API key (also read from `PEXELS_API_KEY`)
    pub api_key: Option<String>,
    /// Pexels API base URL
    #[serde(default = "default_trends_base_url")]
    pub base_url: String,
    /// Outbound request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions
fn default_service_name() -> String {
    "clip-server".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024 // 50MB
}

fn default_trends_base_url() -> String {
    "https://api.pexels.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from config files and environment
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with_overrides(std::env::var("PEXELS_API_KEY").ok(), std::env::var("PORT").ok())
    }

    /// Load with the conventional `PEXELS_API_KEY` and `PORT` values taking
    /// precedence over every other source
    pub fn load_with_overrides(
        pexels_api_key: Option<String>,
        port: Option<String>,
    ) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("service.name", "clip-server")?
            .set_default("service.log_level", "info")?
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::File::with_name("/etc/clip/server").required(false))
            // CLIP__TRENDS__PROVIDER -> trends.provider
            .add_source(
                config::Environment::with_prefix("CLIP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("trends.api_key", pexels_api_key)?
            .set_override_option("api.port", port)?
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trends.provider == TrendProvider::Pexels
            && self
                .trends
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
        {
            return Err(ConfigError::MissingRequired(
                "trends.api_key (required for the pexels provider; set PEXELS_API_KEY)"
                    .to_string(),
            ));
        }

        if self.upload.max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "upload.max_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.trends.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "trends.request_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get the upstream request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        self.trends.request_timeout()
    }
}

impl TrendsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            provider: TrendProvider::default(),
            api_key: None,
            base_url: default_trends_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
