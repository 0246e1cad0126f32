//! Repository layer for data access.

mod document_repository;
mod query_stream;
mod retry;

pub use document_repository::{DocumentRepository, DocumentStore};
pub use query_stream::{decode_page, stream_documents, DocumentStream};
pub use retry::{is_accepted_delete_status, RetryPolicy, DELETE_ACCEPTED_STATUSES};

#[cfg(any(test, feature = "test-utils"))]
pub use document_repository::MockDocumentRepository;
