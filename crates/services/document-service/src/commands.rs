//! Command handlers behind the CLI.

use std::io::Write;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use common::{AppError, AppResult};
use domain::Document;

use crate::repository::DocumentRepository;

/// Query used when none is given
pub const DEFAULT_QUERY: &str = "SELECT * FROM c";

/// A single repository operation.
#[derive(Debug, Clone)]
pub enum Command {
    Query { query: String, partition_key: String },
    Upsert { partition_key: String, document: Document },
    Delete { id: String, partition_key: String },
}

/// Parse a JSON object into a document.
pub fn parse_document(text: &str) -> AppResult<Document> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Ok(Document::try_from(value)?)
}

/// Run a command, writing results to `out` (one JSON document per line for queries).
pub async fn run<W: Write>(
    repo: &dyn DocumentRepository,
    command: Command,
    cancel: CancellationToken,
    out: &mut W,
) -> AppResult<()> {
    match command {
        Command::Query {
            query,
            partition_key,
        } => {
            let mut documents = repo.stream(&query, &partition_key, cancel);
            let mut count = 0usize;
            while let Some(document) = documents.next().await {
                writeln!(out, "{}", serde_json::to_string(&document?)?).map_err(io_error)?;
                count += 1;
            }
            info!(partition_key = %partition_key, count, "Query completed");
        }
        Command::Upsert {
            partition_key,
            mut document,
        } => {
            let id = document.ensure_id();
            repo.store(&partition_key, document, &cancel).await?;
            writeln!(out, "{}", id).map_err(io_error)?;
            info!(partition_key = %partition_key, id = %id, "Document stored");
        }
        Command::Delete { id, partition_key } => {
            repo.delete(&id, &partition_key, &cancel).await?;
            writeln!(out, "{}", id).map_err(io_error)?;
            info!(partition_key = %partition_key, id = %id, "Document deleted");
        }
    }

    Ok(())
}

fn io_error(err: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to write output: {}", err))
}
