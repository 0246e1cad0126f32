//! Document Service Library
//!
//! Data access for a single partitioned container of a remote document
//! database: lazy partition-scoped queries, upserts and retried deletes.
//! The store is reached through [`infra::StoreClient`], implemented by the
//! REST client and by an in-memory fake.

pub mod commands;
pub mod config;
pub mod infra;
pub mod repository;

use std::sync::Arc;

use common::AppResult;

use crate::config::DocumentServiceConfig;
use crate::infra::CosmosClient;
use crate::repository::{DocumentStore, RetryPolicy};

/// Validate the configuration and build a repository backed by the REST client.
pub fn connect(config: &DocumentServiceConfig) -> AppResult<DocumentStore> {
    config.validate()?;
    let client = CosmosClient::new(&config.store)?;

    Ok(DocumentStore::new(Arc::new(client))
        .with_retry_policy(RetryPolicy::from(&config.retry))
        .with_max_item_count(config.query.max_item_count))
}
