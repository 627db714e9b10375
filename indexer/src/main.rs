use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pepsearch_core::persist::{load_snapshot, save_snapshot};
use pepsearch_core::{EngineConfig, FileSource, Hit, IndexHandle, Ingestor, QueryEngine};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query fuzzy n-gram record indexes", long_about = None)]
struct Cli {
    /// Engine config JSON (field weights, rebuild time bound)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a snapshot from a record file (.csv, .json or .jsonl)
    Build {
        /// Input record file
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
    },
    /// Run one query and print ranked hits as JSON lines
    Query {
        /// Snapshot directory written by `build`
        #[arg(long, conflicts_with = "input")]
        index: Option<PathBuf>,
        /// Record file to index in memory before querying
        #[arg(long)]
        input: Option<PathBuf>,
        /// Query text
        #[arg(long)]
        text: String,
        /// Maximum hits to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct HitLine<'a> {
    score: f32,
    document: &'a pepsearch_core::Document,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Build { input, output } => build_index(&config, &input, &output),
        Commands::Query { index, input, text, limit } => {
            let handle = match (index, input) {
                (Some(dir), _) => IndexHandle::from_index(load_snapshot(&dir)?.0),
                (None, Some(file)) => {
                    let handle = IndexHandle::new();
                    ingestor(&config, &handle).rebuild_from(&FileSource::open(file)?)?;
                    handle
                }
                (None, None) => bail!("query needs --index or --input"),
            };
            let hits = QueryEngine::new(handle, config.weights).search_with_limit(&text, limit)?;
            print_hits(&hits)
        }
    }
}

fn ingestor(config: &EngineConfig, handle: &IndexHandle) -> Ingestor {
    Ingestor::new(handle.clone()).with_max_duration(config.max_rebuild_duration())
}

fn build_index(config: &EngineConfig, input: &Path, output: &Path) -> Result<()> {
    let handle = IndexHandle::new();
    let summary = ingestor(config, &handle).rebuild_from(&FileSource::open(input)?)?;
    tracing::info!(indexed = summary.indexed, skipped = summary.skipped, took_s = summary.took_s, "ingested records");
    if summary.indexed == 0 {
        tracing::warn!(input = %input.display(), "no records indexed");
    }
    let meta = save_snapshot(output, &handle.snapshot())?;
    tracing::info!(output = %output.display(), num_docs = meta.num_docs, "index build complete");
    Ok(())
}

fn print_hits(hits: &[Hit]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for hit in hits {
        serde_json::to_writer(&mut out, &HitLine { score: hit.score, document: &hit.document })?;
        writeln!(out)?;
    }
    if hits.is_empty() {
        tracing::info!("no results found");
    }
    Ok(())
}
