//! Document store tests against the in-memory container.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::StatusCode;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use common::AppError;
use document_service_lib::infra::{DeleteFault, InMemoryStore, PageFault};
use document_service_lib::repository::{DocumentRepository, DocumentStore, RetryPolicy};
use domain::Document;

const QUERY: &str = "SELECT * FROM c";

fn doc(id: usize) -> Document {
    Document::try_from(json!({ "id": format!("doc-{id}"), "seq": id })).unwrap()
}

fn seeded_store(count: usize) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.seed("p1", (0..count).map(doc));
    store
}

fn repository(store: &InMemoryStore) -> DocumentStore {
    DocumentStore::new(Arc::new(store.clone()))
        .with_retry_policy(RetryPolicy::new(5, Duration::from_millis(1)))
}

fn ids(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|d| d.id().map(str::to_string))
        .collect()
}

// =============================================================================
// Query streaming
// =============================================================================

#[tokio::test]
async fn test_stream_pages_through_all_documents_in_order() {
    let store = seeded_store(250);
    let repo = repository(&store);

    let documents: Vec<Document> = repo
        .stream(QUERY, "p1", CancellationToken::new())
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(documents.len(), 250);
    assert_eq!(ids(&documents), (0..250).map(|i| format!("doc-{i}")).collect::<Vec<_>>());
    assert_eq!(store.fetch_count(), 3);
    assert_eq!(store.open_cursor_count(), 0);
}

#[tokio::test]
async fn test_stream_is_scoped_to_partition() {
    let store = seeded_store(3);
    store.seed("p2", [doc(100), doc(101)]);
    let repo = repository(&store);

    let documents: Vec<_> = repo
        .stream(QUERY, "p2", CancellationToken::new())
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(ids(&documents), vec!["doc-100", "doc-101"]);
}

#[tokio::test]
async fn test_empty_partition_yields_nothing() {
    let store = InMemoryStore::new();
    let repo = repository(&store);

    let documents: Vec<_> = repo.stream(QUERY, "p1", CancellationToken::new()).collect().await;

    assert!(documents.is_empty());
    assert_eq!(store.open_cursor_count(), 0);
}

#[tokio::test]
async fn test_unsuccessful_page_is_skipped() {
    let store = seeded_store(250);
    store.fault_page(1, PageFault::Status(StatusCode::SERVICE_UNAVAILABLE));
    let repo = repository(&store);

    let documents: Vec<_> = repo
        .stream(QUERY, "p1", CancellationToken::new())
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(documents.len(), 150);
    assert_eq!(documents[99].id(), Some("doc-99"));
    assert_eq!(documents[100].id(), Some("doc-200"));
    assert_eq!(store.fetch_count(), 3);
}

#[tokio::test]
async fn test_successful_page_without_documents_yields_nothing() {
    let store = seeded_store(150);
    store.fault_page(0, PageFault::Body(br#"{"_rid":"x","_count":0}"#.to_vec()));
    let repo = repository(&store);

    let documents: Vec<_> = repo
        .stream(QUERY, "p1", CancellationToken::new())
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(documents.len(), 50);
    assert_eq!(documents[0].id(), Some("doc-100"));
}

#[tokio::test]
async fn test_failed_fetch_ends_stream_with_error() {
    let store = seeded_store(250);
    store.fault_page(1, PageFault::Error);
    let repo = repository(&store);

    let results: Vec<_> = repo.stream(QUERY, "p1", CancellationToken::new()).collect().await;

    assert_eq!(results.len(), 101);
    assert!(results[..100].iter().all(Result::is_ok));
    let err = results[100].as_ref().unwrap_err();
    assert!(matches!(err, AppError::ServiceUnavailable(_)));
    assert_eq!(store.fetch_count(), 2);
    assert_eq!(store.open_cursor_count(), 0);
}

#[tokio::test]
async fn test_dropping_stream_early_releases_cursor() {
    let store = seeded_store(250);
    let repo = repository(&store);

    let mut stream = repo.stream(QUERY, "p1", CancellationToken::new());
    for _ in 0..5 {
        assert_ok!(stream.next().await.unwrap());
    }
    assert_eq!(store.open_cursor_count(), 1);

    drop(stream);
    assert_eq!(store.open_cursor_count(), 0);
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn test_cancel_mid_stream_stops_at_next_page_boundary() {
    let store = seeded_store(250);
    let repo = repository(&store);
    let cancel = CancellationToken::new();

    let mut stream = repo.stream(QUERY, "p1", cancel.clone());
    assert_ok!(stream.next().await.unwrap());
    cancel.cancel();

    let mut delivered = 1;
    let outcome = loop {
        match stream.next().await {
            Some(Ok(_)) => delivered += 1,
            Some(Err(err)) => break err,
            None => panic!("stream ended without reporting cancellation"),
        }
    };

    assert!(outcome.is_cancelled());
    assert_eq!(delivered, 100);
    assert!(stream.next().await.is_none());
    assert_eq!(store.fetch_count(), 1);
    assert_eq!(store.open_cursor_count(), 0);
}

#[tokio::test]
async fn test_cancel_aborts_pending_fetch() {
    let store = seeded_store(10);
    store.set_fetch_delay(Duration::from_secs(30));
    let repo = repository(&store);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let mut stream = repo.stream(QUERY, "p1", cancel);
    let err = assert_err!(stream.next().await.unwrap());
    assert!(err.is_cancelled());
    assert_eq!(store.open_cursor_count(), 0);
}

// =============================================================================
// Upsert
// =============================================================================

#[tokio::test]
async fn test_upsert_replaces_existing_document() {
    let store = InMemoryStore::new();
    let repo = repository(&store);
    let cancel = CancellationToken::new();

    let first = Document::try_from(json!({ "id": "a", "status": "draft" })).unwrap();
    let second = Document::try_from(json!({ "id": "a", "status": "published" })).unwrap();

    assert_ok!(repo.store("p1", first, &cancel).await);
    assert_ok!(repo.store("p1", second.clone(), &cancel).await);
    assert_ok!(repo.store("p1", second.clone(), &cancel).await);

    assert_eq!(store.documents("p1"), vec![second.clone()]);

    let read: Vec<_> = repo
        .stream(QUERY, "p1", cancel.clone())
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(read, vec![second]);
}

#[tokio::test]
async fn test_upsert_failure_propagates() {
    let store = InMemoryStore::new();
    let repo = repository(&store);

    let err = assert_err!(repo.store("p1", Document::new(), &CancellationToken::new()).await);
    assert_eq!(err.status(), Some(400));
    assert_eq!(store.upsert_count(), 1);
}

#[tokio::test]
async fn test_cancelled_upsert_does_not_reach_store() {
    let store = InMemoryStore::new();
    let repo = repository(&store);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let document = Document::try_from(json!({ "id": "a" })).unwrap();
    let err = assert_err!(repo.store("p1", document, &cancel).await);
    assert!(err.is_cancelled());
    assert_eq!(store.upsert_count(), 0);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_removes_document_in_one_attempt() {
    let store = seeded_store(2);
    let repo = repository(&store);

    assert_ok!(repo.delete("doc-0", "p1", &CancellationToken::new()).await);

    assert!(store.get("doc-0", "p1").is_none());
    assert!(store.get("doc-1", "p1").is_some());
    assert_eq!(store.delete_count(), 1);
}

#[tokio::test]
async fn test_delete_of_missing_document_succeeds() {
    let store = InMemoryStore::new();
    let repo = repository(&store);

    assert_ok!(repo.delete("x", "p1", &CancellationToken::new()).await);
    assert_eq!(store.delete_count(), 1);
}

#[tokio::test]
async fn test_delete_retries_transient_failures() {
    let store = seeded_store(1);
    store.push_delete_fault(DeleteFault::Error);
    store.push_delete_fault(DeleteFault::Status(StatusCode::TOO_MANY_REQUESTS));
    let repo = repository(&store);

    assert_ok!(repo.delete("doc-0", "p1", &CancellationToken::new()).await);

    assert_eq!(store.delete_count(), 3);
    assert!(store.documents("p1").is_empty());
}

#[tokio::test]
async fn test_delete_gives_up_after_five_failures() {
    let store = seeded_store(1);
    for _ in 0..5 {
        store.push_delete_fault(DeleteFault::Error);
    }
    let repo = repository(&store);

    let err = assert_err!(repo.delete("doc-0", "p1", &CancellationToken::new()).await);

    assert!(matches!(err, AppError::DeleteExhausted { attempts: 5, .. }));
    assert_eq!(store.delete_count(), 5);
    assert!(store.get("doc-0", "p1").is_some());
}
