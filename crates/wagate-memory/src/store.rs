//! Keyword reply lookup against the `message` table.
//!
//! The table is owned by whoever curates the replies; the gateway only reads
//! `keyword` and `message` columns from it.

use sqlx::{any::AnyPoolOptions, AnyPool};
use std::time::Duration;
use tracing::{debug, info};
use wagate_core::{config::DatabaseConfig, error::GatewayError};

const REPLY_QUERY: &str = "SELECT message FROM message WHERE keyword LIKE ? LIMIT 1";

/// Pooled read access to the keyword reply table.
#[derive(Clone)]
pub struct KeywordStore {
    pool: AnyPool,
}

impl KeywordStore {
    /// Open a connection pool for the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, GatewayError> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.connection_url())
            .await
            .map_err(|e| {
                GatewayError::Store(format!(
                    "failed to connect to {}: {e}",
                    config.redacted_url()
                ))
            })?;

        info!("keyword store connected to {}", config.redacted_url());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::Store(format!("ping failed: {e}")))?;
        Ok(())
    }

    /// Reply text for the first row whose keyword matches, if any.
    ///
    /// The keyword is the `LIKE` pattern, so `%` and `_` in it act as
    /// wildcards.
    pub async fn get_reply(&self, keyword: &str) -> Result<Option<String>, GatewayError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(None);
        }

        let row: Option<(String,)> = sqlx::query_as(REPLY_QUERY)
            .bind(keyword)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatewayError::Store(format!("reply lookup failed: {e}")))?;

        debug!(
            "keyword lookup for {keyword:?}: {}",
            if row.is_some() { "hit" } else { "miss" }
        );
        Ok(row.map(|(message,)| message))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
