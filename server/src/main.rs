use anyhow::Result;
use axum::Router;
use clap::Parser;
use pepsearch_core::EngineConfig;
use pepsearch_server::{build_app, AppState, ServerOptions};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Snapshot directory written by `indexer build`
    #[arg(long)]
    index: Option<PathBuf>,
    /// Record file (.csv, .json, .jsonl) ingested at startup and on /index/rebuild
    #[arg(long)]
    data: Option<PathBuf>,
    /// Engine config JSON (field weights, rebuild time bound)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let opts = ServerOptions { index_dir: args.index, data_file: args.data, config };
    let state = tokio::task::spawn_blocking(move || AppState::load(opts)).await??;
    let app: Router = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
