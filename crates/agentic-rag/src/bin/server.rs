//! Agentic RAG server binary
//!
//! Run with: cargo run -p agentic-rag --bin agentic-rag-server -- --init

use std::path::PathBuf;

use agentic_rag::{config::RagConfig, server::RagServer, QueryOptions};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "agentic-rag-server", version, about = "Agentic question answering over a PDF corpus")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Bind host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Initialize the session before serving
    #[arg(long)]
    init: bool,

    /// Re-extract the corpus even when a persisted index exists (implies --init)
    #[arg(long)]
    force_rebuild: bool,

    /// Answer one question, print the result as JSON and exit
    #[arg(short, long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentic_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Data directory: {}", config.corpus.data_dir.display());
    tracing::info!("  - Index directory: {}", config.vector_db.storage_dir.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Chunk size: {} (overlap {})", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - LLM providers: {:?}", config.llm.configured_providers());

    let server = RagServer::new(config)?;

    if args.init || args.force_rebuild || args.query.is_some() {
        let result = server.initialize(args.force_rebuild).await;
        if result.success {
            tracing::info!("{}", result.message);
        } else {
            tracing::error!(
                "Initialization failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            );
            if args.query.is_some() {
                anyhow::bail!("cannot answer query: initialization failed");
            }
        }
    }

    if let Some(query) = args.query {
        let result = server.query(&query, QueryOptions::default()).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
