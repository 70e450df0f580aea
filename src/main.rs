//! # AgroClaw — Agricultural Advisory Backend
//!
//! Retrieval-augmented chatbot backend over a news/tips database, with
//! free-tier Gemini hardening (credential rotation + model fallback).
//!
//! Usage:
//!   agroclaw serve                # Start the HTTP gateway
//!   agroclaw chat "soru..."       # One-shot advisory question
//!   agroclaw reindex              # Force a full RAG rebuild

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agroclaw_agent::Advisor;
use agroclaw_core::config::AgroClawConfig;
use agroclaw_gateway::AppState;
use agroclaw_providers::{CredentialPool, GeminiProvider};
use agroclaw_rag::Retriever;
use agroclaw_store::SqliteStore;

#[derive(Parser)]
#[command(
    name = "agroclaw",
    version,
    about = "🌱 AgroClaw — RAG-backed agricultural advisory backend"
)]
struct Cli {
    /// Config file path (default: ~/.agroclaw/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask one advisory question on the command line
    Chat {
        /// The question to ask
        message: String,
    },
    /// Rebuild the RAG index from the database
    Reindex,
}

fn load_config(cli: &Cli) -> Result<AgroClawConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("AGROCLAW_CONFIG").ok());
    let config = match path {
        Some(p) => AgroClawConfig::load_from(std::path::Path::new(&p))?,
        None => AgroClawConfig::load()?,
    };
    Ok(config)
}

struct Runtime {
    advisor: Arc<Advisor>,
    retriever: Arc<Retriever>,
    store: Arc<SqliteStore>,
}

fn build_runtime(config: &AgroClawConfig) -> Result<Runtime> {
    let store = Arc::new(SqliteStore::open(&config.store.resolved_db_path())?);
    let provider = Arc::new(GeminiProvider::new(
        config.llm.clone(),
        CredentialPool::from_env(),
    ));
    let retriever = Arc::new(Retriever::new(
        config.rag.clone(),
        config.llm.embedding_model.clone(),
        provider.clone(),
        store.clone(),
    ));
    let advisor = Arc::new(Advisor::new(
        provider,
        retriever.clone(),
        config.llm.model_priority.clone(),
    ));
    Ok(Runtime {
        advisor,
        retriever,
        store,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "agroclaw=debug,tower_http=debug"
    } else {
        "agroclaw=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(p) = port {
                config.gateway.port = p;
            }
            let runtime = build_runtime(&config)?;

            // Startup must survive a failed build: the gateway can still
            // serve CRUD and context-free chat.
            if let Err(e) = runtime.retriever.load(false).await {
                tracing::warn!("⚠️ RAG initialization failed: {e}");
            }

            agroclaw_gateway::start(AppState {
                gateway_config: config.gateway.clone(),
                advisor: runtime.advisor,
                retriever: runtime.retriever,
                store: runtime.store,
            })
            .await?;
        }
        Command::Chat { message } => {
            let runtime = build_runtime(&config)?;
            if let Err(e) = runtime.retriever.load(false).await {
                tracing::warn!("⚠️ RAG initialization failed: {e}");
            }
            let response = runtime
                .advisor
                .chat(&agroclaw_core::types::ChatRequest {
                    message,
                    conversation_history: vec![],
                })
                .await;
            println!("{}", response.response);
        }
        Command::Reindex => {
            let runtime = build_runtime(&config)?;
            let count = runtime.retriever.load(true).await?;
            println!("✅ RAG index rebuilt: {count} documents");
        }
    }

    Ok(())
}
