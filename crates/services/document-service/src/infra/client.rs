//! Store client capability.
//!
//! The repository talks to the document database only through these traits,
//! so the network client and the in-memory fake are interchangeable.

use async_trait::async_trait;
use reqwest::StatusCode;

use common::AppResult;
use domain::Document;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// One page of query results as returned by the store.
#[derive(Debug, Clone)]
pub struct FeedResponse {
    /// Store-level status of the page
    pub status: StatusCode,
    /// Raw response body (a JSON envelope with a `documents` array)
    pub body: Vec<u8>,
}

impl FeedResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if the store reported success for this page
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Server-side paginated query handle.
///
/// Dropping the cursor releases it.
#[async_trait]
pub trait QueryCursor: Send {
    /// Whether the store may return another page
    fn has_more(&self) -> bool;

    /// Fetch the next page (one network round trip)
    async fn fetch_next(&mut self) -> AppResult<FeedResponse>;
}

/// Document database capability for a single container.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Open a paginated query scoped to one partition
    fn open_query(
        &self,
        query: &str,
        partition_key: &str,
        max_item_count: usize,
    ) -> Box<dyn QueryCursor>;

    /// Insert or replace a document
    async fn upsert(&self, partition_key: &str, document: &Document) -> AppResult<()>;

    /// Delete a document by id.
    ///
    /// Any status the store answers with is returned as `Ok`; `Err` means the
    /// call itself failed.
    async fn delete(&self, id: &str, partition_key: &str) -> AppResult<StatusCode>;
}
