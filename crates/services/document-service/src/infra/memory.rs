//! In-memory store client.
//!
//! Behaves like a single container: documents live per partition in insertion
//! order, queries page through them, upserts replace by id, deletes answer
//! `204 No Content` or `404 Not Found`. Faults can be injected per query page
//! and per delete call, and counters expose how the store was used.
//!
//! Query text is not evaluated; every query returns all documents of its
//! partition.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use common::{AppError, AppResult};
use domain::Document;

use super::client::{FeedResponse, QueryCursor, StoreClient};

/// Fault returned in place of a query page.
#[derive(Debug, Clone)]
pub enum PageFault {
    /// The page is answered with this status; its documents are not delivered
    Status(StatusCode),
    /// The page succeeds with this raw body instead of its documents
    Body(Vec<u8>),
    /// The fetch itself fails
    Error,
}

/// Fault returned in place of a delete.
#[derive(Debug, Clone)]
pub enum DeleteFault {
    /// The call fails without a response
    Error,
    /// The store answers with this status and the document is left untouched
    Status(StatusCode),
}

/// In-memory container.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<State>,
}

#[derive(Default)]
struct State {
    partitions: Mutex<HashMap<String, Vec<Document>>>,
    page_faults: Mutex<HashMap<usize, PageFault>>,
    delete_faults: Mutex<VecDeque<DeleteFault>>,
    fetch_delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
    open_cursors: AtomicUsize,
    upserts: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents to a partition, replacing any with the same id.
    pub fn seed(&self, partition_key: &str, documents: impl IntoIterator<Item = Document>) {
        let mut partitions = lock(&self.state.partitions);
        let partition = partitions.entry(partition_key.to_string()).or_default();
        for document in documents {
            put(partition, document);
        }
    }

    /// Documents of a partition in insertion order
    pub fn documents(&self, partition_key: &str) -> Vec<Document> {
        lock(&self.state.partitions)
            .get(partition_key)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up one document
    pub fn get(&self, id: &str, partition_key: &str) -> Option<Document> {
        lock(&self.state.partitions)
            .get(partition_key)
            .and_then(|docs| docs.iter().find(|d| d.id() == Some(id)).cloned())
    }

    /// Replace the page at `index` (zero-based, for every query) with a fault.
    pub fn fault_page(&self, index: usize, fault: PageFault) {
        lock(&self.state.page_faults).insert(index, fault);
    }

    /// Queue a fault for the next delete call that has none queued before it.
    pub fn push_delete_fault(&self, fault: DeleteFault) {
        lock(&self.state.delete_faults).push_back(fault);
    }

    /// Delay every page fetch, simulating a slow round trip.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *lock(&self.state.fetch_delay) = Some(delay);
    }

    /// Page fetches started
    pub fn fetch_count(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }

    /// Cursors opened and not yet released
    pub fn open_cursor_count(&self) -> usize {
        self.state.open_cursors.load(Ordering::SeqCst)
    }

    /// Upsert calls received
    pub fn upsert_count(&self) -> usize {
        self.state.upserts.load(Ordering::SeqCst)
    }

    /// Delete calls received
    pub fn delete_count(&self) -> usize {
        self.state.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    fn open_query(
        &self,
        _query: &str,
        partition_key: &str,
        max_item_count: usize,
    ) -> Box<dyn QueryCursor> {
        let pages = self
            .documents(partition_key)
            .chunks(max_item_count.max(1))
            .map(<[Document]>::to_vec)
            .collect();

        self.state.open_cursors.fetch_add(1, Ordering::SeqCst);
        Box::new(MemoryCursor {
            state: Arc::clone(&self.state),
            pages,
            next_page: 0,
        })
    }

    async fn upsert(&self, partition_key: &str, document: &Document) -> AppResult<()> {
        self.state.upserts.fetch_add(1, Ordering::SeqCst);
        if document.id().is_none() {
            return Err(AppError::store(400, "The input content is invalid because the required property, 'id', is missing."));
        }

        let mut partitions = lock(&self.state.partitions);
        put(
            partitions.entry(partition_key.to_string()).or_default(),
            document.clone(),
        );
        Ok(())
    }

    async fn delete(&self, id: &str, partition_key: &str) -> AppResult<StatusCode> {
        self.state.deletes.fetch_add(1, Ordering::SeqCst);

        let fault = lock(&self.state.delete_faults).pop_front();
        match fault {
            Some(DeleteFault::Error) => Err(AppError::service_unavailable("injected delete failure")),
            Some(DeleteFault::Status(status)) => Ok(status),
            None => {
                let mut partitions = lock(&self.state.partitions);
                let removed = partitions.get_mut(partition_key).and_then(|docs| {
                    let position = docs.iter().position(|d| d.id() == Some(id))?;
                    Some(docs.remove(position))
                });

                Ok(match removed {
                    Some(_) => StatusCode::NO_CONTENT,
                    None => StatusCode::NOT_FOUND,
                })
            }
        }
    }
}

struct MemoryCursor {
    state: Arc<State>,
    pages: Vec<Vec<Document>>,
    next_page: usize,
}

#[async_trait]
impl QueryCursor for MemoryCursor {
    fn has_more(&self) -> bool {
        self.next_page < self.pages.len()
    }

    async fn fetch_next(&mut self) -> AppResult<FeedResponse> {
        let index = self.next_page;
        self.next_page += 1;
        self.state.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.state.fetch_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let fault = lock(&self.state.page_faults).get(&index).cloned();
        match fault {
            Some(PageFault::Error) => Err(AppError::service_unavailable("injected page failure")),
            Some(PageFault::Status(status)) => Ok(FeedResponse::new(
                status,
                json!({ "code": status.as_u16(), "message": "injected page fault" }).to_string(),
            )),
            Some(PageFault::Body(body)) => Ok(FeedResponse::new(StatusCode::OK, body)),
            None => {
                let documents = self.pages.get(index).cloned().unwrap_or_default();
                let body = json!({
                    "_rid": "memory",
                    "Documents": documents,
                    "_count": documents.len(),
                });
                Ok(FeedResponse::new(StatusCode::OK, serde_json::to_vec(&body)?))
            }
        }
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.state.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}

fn put(partition: &mut Vec<Document>, document: Document) {
    let position = partition
        .iter()
        .position(|d| d.id().is_some() && d.id() == document.id());
    match position {
        Some(index) => partition[index] = document,
        None => partition.push(document),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
