//! `tag-graph`: run a command script as one batch and print the result
//!
//! ```text
//! tag-graph [--config engine.yaml] [--format compact] [script.tg]
//! ```
//!
//! The script is read from stdin when no file is given.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tag_graph::{EngineConfig, GraphEngine, MemoryBlobStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tag-graph", version, about = "Run a tag-graph command script as one batch")]
struct Args {
    /// Engine configuration (YAML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "pretty")]
    format: OutputFormat,

    /// Script file; read from stdin when omitted
    script: Option<PathBuf>,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading script from stdin")?;
            text
        }
    };

    tracing::info!("Tag Graph v{}", tag_graph::version());

    let engine =
        GraphEngine::with_config(config).with_blob_store(Arc::new(MemoryBlobStore::new()));
    let batch = engine.execute(&script).await;

    let output = match args.format {
        OutputFormat::Pretty => serde_json::to_string_pretty(&batch)?,
        OutputFormat::Compact => serde_json::to_string(&batch)?,
    };
    println!("{}", output);

    if !batch.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
