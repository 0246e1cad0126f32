//! Document service configuration.

use std::env;

use common::{AppResult, QueryConfig, RetryConfig, StoreConfig};

/// Document service configuration.
#[derive(Debug, Clone)]
pub struct DocumentServiceConfig {
    /// Account and container settings
    pub store: StoreConfig,
    /// Delete retry settings
    pub retry: RetryConfig,
    /// Query paging settings
    pub query: QueryConfig,
}

impl DocumentServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Store settings have no defaults; call [`validate`](Self::validate)
    /// before connecting.
    pub fn from_env() -> Self {
        let retry_defaults = RetryConfig::default();
        let query_defaults = QueryConfig::default();

        Self {
            store: StoreConfig {
                account_endpoint: env::var("COSMOS_ACCOUNT_ENDPOINT").unwrap_or_default(),
                account_key: env::var("COSMOS_ACCOUNT_KEY").unwrap_or_default(),
                database_id: env::var("COSMOS_DATABASE_ID").unwrap_or_default(),
                container_id: env::var("COSMOS_CONTAINER_ID").unwrap_or_default(),
            },
            retry: RetryConfig {
                max_attempts: env::var("DELETE_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(retry_defaults.max_attempts),
                retry_delay_ms: env::var("DELETE_RETRY_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(retry_defaults.retry_delay_ms),
            },
            query: QueryConfig {
                max_item_count: env::var("QUERY_MAX_ITEM_COUNT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(query_defaults.max_item_count),
            },
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        self.store.validate()?;
        self.retry.validate()?;
        self.query.validate()?;
        Ok(())
    }
}
