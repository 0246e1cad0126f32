//! Lazy document stream over a paginated query.
//!
//! One page is fetched per resume once the previous page's documents have
//! been handed out. The cursor is owned by the stream and dropped on every
//! exit path: exhaustion, error, cancellation, or the consumer dropping the
//! stream.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use common::{AppError, AppResult};
use domain::{is_documents_property, Document, DomainError};

use crate::infra::{FeedResponse, QueryCursor};

/// Forward-only stream of query results.
pub type DocumentStream = BoxStream<'static, AppResult<Document>>;

struct StreamState {
    cursor: Option<Box<dyn QueryCursor>>,
    pending: VecDeque<Document>,
    cancel: CancellationToken,
    pages: usize,
}

/// Turn an open cursor into a document stream.
pub fn stream_documents(cursor: Box<dyn QueryCursor>, cancel: CancellationToken) -> DocumentStream {
    let state = StreamState {
        cursor: Some(cursor),
        pending: VecDeque::new(),
        cancel,
        pages: 0,
    };

    stream::unfold(state, next_document).fuse().boxed()
}

async fn next_document(mut state: StreamState) -> Option<(AppResult<Document>, StreamState)> {
    loop {
        if let Some(document) = state.pending.pop_front() {
            return Some((Ok(document), state));
        }

        let mut cursor = state.cursor.take()?;
        if !cursor.has_more() {
            debug!(pages = state.pages, "Query exhausted");
            return None;
        }

        let fetched = tokio::select! {
            biased;
            _ = state.cancel.cancelled() => Err(AppError::Cancelled),
            page = cursor.fetch_next() => page,
        };

        let page = match fetched {
            Ok(page) => page,
            Err(err) => {
                debug!(pages = state.pages, error = %err, "Query stream aborted");
                return Some((Err(err), state));
            }
        };
        state.pages += 1;

        if page.is_success() {
            match decode_page(&page) {
                Ok(documents) => state.pending.extend(documents),
                Err(err) => return Some((Err(err), state)),
            }
        } else {
            warn!(
                status = %page.status,
                page = state.pages,
                "Skipping unsuccessful query page"
            );
        }

        state.cursor = Some(cursor);
    }
}

/// Extract the documents of a successful page.
///
/// The envelope key is matched case-insensitively. A missing or `null`
/// documents value yields no documents.
pub fn decode_page(page: &FeedResponse) -> AppResult<Vec<Document>> {
    let envelope: Map<String, Value> = serde_json::from_slice(&page.body)?;

    let documents = envelope
        .into_iter()
        .find(|(key, _)| is_documents_property(key))
        .map(|(_, value)| value);

    match documents {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(Document::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::from),
        Some(_) => Err(DomainError::invalid_document("documents property is not an array").into()),
    }
}
