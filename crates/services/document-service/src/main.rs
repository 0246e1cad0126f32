//! Document Service - command line access to a partitioned container.

use std::io;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use document_service_lib::commands::{self, Command, DEFAULT_QUERY};
use document_service_lib::config::DocumentServiceConfig;

#[derive(Parser)]
#[command(name = "document-service")]
#[command(about = "Query, upsert and delete documents in a partitioned container")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the documents matched by a query, one JSON object per line
    Query {
        #[arg(long)]
        partition_key: String,
        #[arg(long, default_value = DEFAULT_QUERY)]
        query: String,
    },
    /// Insert or replace a document
    Upsert {
        #[arg(long)]
        partition_key: String,
        /// Document as a JSON object; an id is generated when missing
        #[arg(long)]
        document: String,
    },
    /// Delete a document by id
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        partition_key: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = DocumentServiceConfig::from_env();
    let repo = document_service_lib::connect(&config)?;

    let command = match cli.command {
        Commands::Query {
            partition_key,
            query,
        } => Command::Query {
            query,
            partition_key,
        },
        Commands::Upsert {
            partition_key,
            document,
        } => Command::Upsert {
            partition_key,
            document: commands::parse_document(&document)?,
        },
        Commands::Delete { id, partition_key } => Command::Delete { id, partition_key },
    };

    // Ctrl-C cancels the running command
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            trigger.cancel();
        }
    });

    let mut stdout = io::stdout().lock();
    commands::run(&repo, command, cancel, &mut stdout).await?;

    Ok(())
}
