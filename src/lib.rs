pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::Config;

use models::book::BookListFilter;

#[derive(Parser)]
#[command(name = "bookject")]
#[command(author, version, about = "Simple book catalog API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web API (the default when no command is given)
    #[command(alias = "daemon")]
    Serve,

    /// Fetch books for a search query and store them
    #[command(alias = "f")]
    Fetch {
        /// Search query sent to the book source
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// List stored books
    #[command(alias = "ls", alias = "l")]
    List,
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Fetch { query }) => cmd_fetch(config, &query.join(" ")).await,
        Some(Commands::List) => cmd_list(config).await,
        Some(Commands::Serve) | None => run_server(config).await,
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Bookject v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state(config).await?;
    let port = state.config.server.port;

    let app = api::router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn cmd_fetch(config: Config, query: &str) -> anyhow::Result<()> {
    let state = api::create_app_state(config).await?;

    let summary = state
        .ingest_service()
        .ingest(query)
        .await
        .with_context(|| format!("Ingestion failed for '{query}'"))?;

    println!(
        "Ingested '{}': {} created, {} updated",
        query, summary.created, summary.updated
    );
    Ok(())
}

async fn cmd_list(config: Config) -> anyhow::Result<()> {
    let state = api::create_app_state(config).await?;
    let books = state.store().list_books(&BookListFilter::default()).await?;

    if books.is_empty() {
        println!("No books stored yet. Try: bookject fetch <query>");
        return Ok(());
    }

    for book in books {
        let year = book
            .published_date
            .map_or_else(|| "----".to_string(), |d| d.format("%Y").to_string());
        println!(
            "{:<14} {}  {} [{}]",
            book.external_id,
            year,
            book.title.as_deref().unwrap_or("(untitled)"),
            book.authors.join(", ")
        );
    }
    Ok(())
}
