//! Configuration system for licensegate.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `LICENSEGATE_ACCOUNT_ID` - Account (user) id licenses are issued under
//! - `LICENSEGATE_SERVER_URL` - Validation server base URL
//! - `LICENSEGATE_PUBLIC_KEY` - PEM public key for signed challenges
//! - `LICENSEGATE_PUBLIC_KEY_FILE` - Path to a PEM public key file
//! - `LICENSEGATE_USE_CHALLENGES` - Force challenge mode on
//! - `LICENSEGATE_DEBUG` - Emit request/response diagnostics
//! - `LICENSEGATE_TIMEOUT_SECS` - Request timeout in seconds
//! - `LICENSEGATE_LOGGING_ENABLED` - Install a tracing subscriber (CLI)
//! - `LICENSEGATE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::{Config, ConfigBuilder};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::sync::OnceLock;

use crate::errors::{VerifyError, VerifyResult};

/// Default validation server.
pub const DEFAULT_SERVER_URL: &str = "https://api.licensegate.io";

/// Global configuration singleton.
static CONFIG: OnceLock<GateConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Verification client configuration
    pub client: ClientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Verification client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Account id licenses are issued under
    pub account_id: String,
    /// Validation server base URL
    pub server_url: String,
    /// Inline PEM public key
    pub public_key: Option<String>,
    /// Path to a PEM public key file
    pub public_key_file: Option<String>,
    /// Require signed challenges even without a key in config
    pub use_challenges: bool,
    /// Emit request/response diagnostics through `tracing`
    pub debug: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            public_key: None,
            public_key_file: None,
            use_challenges: false,
            debug: false,
            timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Resolve the configured public key, reading `public_key_file` if set.
    pub fn resolve_public_key(&self) -> VerifyResult<Option<String>> {
        if let Some(key) = self.public_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(Some(key.clone()));
        }

        match &self.public_key_file {
            Some(path) if !path.is_empty() => Ok(Some(std::fs::read_to_string(path)?)),
            _ => Ok(None),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

fn config_err(e: config::ConfigError) -> VerifyError {
    VerifyError::Config(e.to_string())
}

fn env_bool(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| v.parse::<bool>().ok())
}

impl GateConfig {
    /// Load configuration from `config.toml` (optional) and environment.
    pub fn load() -> VerifyResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file (required if given) and
    /// environment. Without a path, `config.toml` is tried and may be absent.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file
    /// 3. Environment variables
    pub fn load_from(path: Option<&Path>) -> VerifyResult<Self> {
        let builder = Self::defaults()?;

        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name("config").required(false)),
        };

        let settings = Self::env_overrides(builder)?
            .build()
            .map_err(|e| VerifyError::Config(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| VerifyError::Config(format!("failed to deserialize config: {e}")))
    }

    fn defaults() -> VerifyResult<ConfigBuilder<DefaultState>> {
        Config::builder()
            .set_default("client.account_id", "")
            .map_err(config_err)?
            .set_default("client.server_url", DEFAULT_SERVER_URL)
            .map_err(config_err)?
            .set_default("client.use_challenges", false)
            .map_err(config_err)?
            .set_default("client.debug", false)
            .map_err(config_err)?
            .set_default("client.timeout_secs", 10)
            .map_err(config_err)?
            .set_default("logging.enabled", false)
            .map_err(config_err)?
            .set_default("logging.level", "info")
            .map_err(config_err)
    }

    fn env_overrides(
        builder: ConfigBuilder<DefaultState>,
    ) -> VerifyResult<ConfigBuilder<DefaultState>> {
        builder
            .set_override_option("client.account_id", env::var("LICENSEGATE_ACCOUNT_ID").ok())
            .map_err(config_err)?
            .set_override_option("client.server_url", env::var("LICENSEGATE_SERVER_URL").ok())
            .map_err(config_err)?
            .set_override_option("client.public_key", env::var("LICENSEGATE_PUBLIC_KEY").ok())
            .map_err(config_err)?
            .set_override_option(
                "client.public_key_file",
                env::var("LICENSEGATE_PUBLIC_KEY_FILE").ok(),
            )
            .map_err(config_err)?
            .set_override_option("client.use_challenges", env_bool("LICENSEGATE_USE_CHALLENGES"))
            .map_err(config_err)?
            .set_override_option("client.debug", env_bool("LICENSEGATE_DEBUG"))
            .map_err(config_err)?
            .set_override_option(
                "client.timeout_secs",
                env::var("LICENSEGATE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("logging.enabled", env_bool("LICENSEGATE_LOGGING_ENABLED"))
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("LICENSEGATE_LOG_LEVEL").ok())
            .map_err(config_err)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> VerifyResult<()> {
        if self.client.account_id.trim().is_empty() {
            return Err(VerifyError::Config(
                "client.account_id cannot be empty".to_string(),
            ));
        }

        let url = self.client.server_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(VerifyError::Config(format!(
                "client.server_url must start with http:// or https://, got '{url}'"
            )));
        }

        if self.client.timeout_secs == 0 {
            return Err(VerifyError::Config(
                "client.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.client.public_key.is_some() && self.client.public_key_file.is_some() {
            return Err(VerifyError::Config(
                "set only one of client.public_key and client.public_key_file".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(VerifyError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> VerifyResult<&'static GateConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = GateConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is fine.
    let _ = CONFIG.set(config);

    CONFIG
        .get()
        .ok_or_else(|| VerifyError::Config("configuration was not initialized".to_string()))
}

/// Initialize configuration explicitly.
///
/// Call this early in your application to catch configuration errors.
pub fn init_config() -> VerifyResult<&'static GateConfig> {
    get_config()
}
