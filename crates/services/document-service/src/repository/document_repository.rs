//! Document repository over a single partitioned container.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use common::{AppError, AppResult};
use domain::{Document, MAX_ITEMS_PER_PAGE};

use super::query_stream::{stream_documents, DocumentStream};
use super::retry::{is_accepted_delete_status, RetryPolicy};
use crate::infra::StoreClient;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Document repository trait for dependency injection.
///
/// Every operation is scoped to one partition key and honours the given
/// cancellation token; a cancelled call fails with `AppError::Cancelled`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Stream the documents matched by `query` within a partition.
    ///
    /// Pages the store reports as unsuccessful are skipped.
    fn stream(&self, query: &str, partition_key: &str, cancel: CancellationToken) -> DocumentStream;

    /// Insert the document, or replace it if one with the same id exists
    async fn store(
        &self,
        partition_key: &str,
        document: Document,
        cancel: &CancellationToken,
    ) -> AppResult<()>;

    /// Delete a document by id; deleting an absent document succeeds
    async fn delete(&self, id: &str, partition_key: &str, cancel: &CancellationToken) -> AppResult<()>;
}

/// Concrete implementation of DocumentRepository over a store client
pub struct DocumentStore {
    client: Arc<dyn StoreClient>,
    retry: RetryPolicy,
    max_item_count: usize,
}

impl DocumentStore {
    /// Create new repository instance with default paging and retry settings
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            max_item_count: MAX_ITEMS_PER_PAGE,
        }
    }

    /// Override the delete retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the page ceiling
    pub fn with_max_item_count(mut self, max_item_count: usize) -> Self {
        self.max_item_count = max_item_count.max(1);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn max_item_count(&self) -> usize {
        self.max_item_count
    }
}

#[async_trait]
impl DocumentRepository for DocumentStore {
    fn stream(&self, query: &str, partition_key: &str, cancel: CancellationToken) -> DocumentStream {
        let cursor = self
            .client
            .open_query(query, partition_key, self.max_item_count);
        stream_documents(cursor, cancel)
    }

    async fn store(
        &self,
        partition_key: &str,
        document: Document,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = self.client.upsert(partition_key, &document) => result,
        }
    }

    async fn delete(&self, id: &str, partition_key: &str, cancel: &CancellationToken) -> AppResult<()> {
        let mut attempts = 0;
        let mut last_status: Option<StatusCode>;
        let mut last_error = String::new();

        loop {
            attempts += 1;
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AppError::Cancelled),
                outcome = self.client.delete(id, partition_key) => outcome,
            };

            last_status = match outcome {
                Ok(status) => {
                    debug!(id = %id, status = %status, attempt = attempts, "Delete answered");
                    Some(status)
                }
                Err(err) => {
                    warn!(id = %id, attempt = attempts, error = %err, "Delete attempt failed");
                    last_error = err.to_string();
                    None
                }
            };

            if !self.retry.should_retry(attempts, last_status) {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AppError::Cancelled),
                _ = tokio::time::sleep(self.retry.backoff()) => {}
            }
        }

        match last_status {
            Some(status) if is_accepted_delete_status(status) => Ok(()),
            Some(status) => {
                warn!(id = %id, status = %status, attempts, "Delete rejected after retries");
                Err(AppError::DeleteRejected {
                    id: id.to_string(),
                    status: status.as_u16(),
                    attempts,
                })
            }
            None => {
                warn!(id = %id, attempts, "Delete failed after retries");
                Err(AppError::DeleteExhausted {
                    id: id.to_string(),
                    attempts,
                    last_error,
                })
            }
        }
    }
}
