mod defaults;
mod integrations;


pub use integrations::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::GatewayError;
use crate::formatter::is_valid_country_code;
use defaults::*;

/// Top-level wagate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub formatter: FormatterConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub autoreply: AutoReplyConfig,
}

/// HTTP listener and process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily-rolling log files. Unset = stderr only.
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Serve the landing page from this directory instead of the built-in one.
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: None,
            static_dir: None,
        }
    }
}

/// Phone number formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterConfig {
    /// Country code applied to numbers that do not carry one (e.g. `55`).
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            default_country_code: default_country_code(),
        }
    }
}

impl Config {
    /// Apply environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup.
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = get("HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(p) => self.gateway.port = p,
                Err(_) => warn!("ignoring invalid PORT value '{port}'"),
            }
        }
        if let Some(code) = get("DEFAULT_COUNTRY_CODE") {
            self.formatter.default_country_code = code;
        }
        if let Some(enabled) = get("WEBHOOK_ENABLED") {
            self.webhook.enabled = parse_bool(&enabled);
        }
        if let Some(url) = get("WEBHOOK_URL") {
            self.webhook.url = url;
        }
        if let Some(host) = get("DB_HOST") {
            self.database.host = host;
        }
        if let Some(user) = get("DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = get("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = get("DB_NAME") {
            self.database.database = name;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(url) = get("BRIDGE_URL") {
            self.client.bridge_url = url;
        }
    }

    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.gateway.port == 0 {
            return Err(GatewayError::Config("gateway.port must not be 0".into()));
        }
        if !is_valid_country_code(&self.formatter.default_country_code) {
            return Err(GatewayError::Config(format!(
                "formatter.default_country_code '{}' must be digits without a leading zero",
                self.formatter.default_country_code
            )));
        }
        if self.webhook.enabled && self.webhook.url.trim().is_empty() {
            return Err(GatewayError::Config(
                "webhook is enabled but webhook.url is empty".into(),
            ));
        }
        if self.autoreply.enabled && !self.database.enabled {
            warn!("autoreply is enabled but the database is not; keyword replies are off");
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, GatewayError> {
    let path = Path::new(path);
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| GatewayError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| GatewayError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
