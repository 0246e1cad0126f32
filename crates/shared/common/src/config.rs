//! Shared configuration structures.

use std::time::Duration;

use domain::{
    DEFAULT_DELETE_MAX_ATTEMPTS, DEFAULT_DELETE_RETRY_DELAY_MS, MAX_ITEMS_PER_PAGE,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Connection settings for the document database account.
#[derive(Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Account endpoint URL (e.g., "https://account.documents.azure.com:443/")
    pub account_endpoint: String,
    /// Base64 master key
    #[serde(skip_serializing)]
    pub account_key: String,
    /// Database identifier
    pub database_id: String,
    /// Container (collection) identifier
    pub container_id: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("account_endpoint", &self.account_endpoint)
            .field("account_key", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("container_id", &self.container_id)
            .finish()
    }
}

impl StoreConfig {
    /// Reject blank settings.
    pub fn validate(&self) -> AppResult<()> {
        require_non_blank("accountEndpoint", &self.account_endpoint)?;
        require_non_blank("accountKey", &self.account_key)?;
        require_non_blank("databaseId", &self.database_id)?;
        require_non_blank("containerId", &self.container_id)?;
        Ok(())
    }
}

/// Delete retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl RetryConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.max_attempts == 0 {
            return Err(AppError::validation("max_attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_DELETE_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_DELETE_RETRY_DELAY_MS,
        }
    }
}

/// Query paging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Maximum documents per page
    pub max_item_count: usize,
}

impl QueryConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.max_item_count == 0 {
            return Err(AppError::validation("max_item_count must be at least 1"));
        }
        Ok(())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_item_count: MAX_ITEMS_PER_PAGE,
        }
    }
}

fn require_non_blank(name: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!(
            "Argument {} cannot be empty.",
            name
        )));
    }
    Ok(())
}
