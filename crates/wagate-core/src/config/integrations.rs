use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Outbound webhook for inbound messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Target URL; receives `POST {"msg": <message>}`.
    #[serde(default)]
    pub url: String,
}

/// Keyword reply database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub database: String,
    /// Full connection URL. Takes precedence over the individual fields.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            database: default_db_name(),
            url: None,
            max_connections: default_max_connections(),
            max_lifetime_secs: default_max_lifetime_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Connection URL for the pool.
    pub fn connection_url(&self) -> String {
        if let Some(ref url) = self.url {
            return url.clone();
        }
        format!(
            "mysql://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.database
        )
    }

    /// Connection URL safe for logs (password masked).
    pub fn redacted_url(&self) -> String {
        if self.url.is_some() {
            return "<database url>".to_string();
        }
        format!(
            "mysql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// Messaging client (automation bridge) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the automation bridge.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// Reinitialize the session after an authentication failure.
    #[serde(default)]
    pub restart_on_auth_fail: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            restart_on_auth_fail: false,
        }
    }
}

/// Keyword auto-reply for inbound messages (needs `[database]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoReplyConfig {
    #[serde(default)]
    pub enabled: bool,
}
