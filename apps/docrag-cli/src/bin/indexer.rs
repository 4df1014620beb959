//! Indexes every supported file under a directory into one namespace.
//!
//! Usage:
//!   docrag-indexer ./docs --namespace bakery
//!   docrag-indexer ./docs --chunk-size 600 --chunk-overlap 100

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use docrag_core::data_processor::{ChunkingConfig, DataProcessor};
use docrag_core::types::Namespace;

#[derive(Parser)]
#[command(name = "docrag-indexer", version, about = "Index a directory of documents")]
struct Cli {
    /// Directory to walk (recursively) for .txt .md .pdf .docx .html .htm
    dir: PathBuf,

    #[arg(short, long, default_value = "default")]
    namespace: Namespace,

    /// Overrides chunking.chunk_size
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Overrides chunking.chunk_overlap
    #[arg(long)]
    chunk_overlap: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    docrag_cli::init_tracing(cli.verbose);
    let (mut settings, base) = docrag_cli::load_settings()?;
    settings.chunking = ChunkingConfig::new(
        cli.chunk_size.unwrap_or(settings.chunking.chunk_size),
        cli.chunk_overlap.unwrap_or(settings.chunking.chunk_overlap),
    )?;

    let documents = DataProcessor::with_config(settings.chunking)?.load_directory(&cli.dir)?;
    if documents.is_empty() {
        println!("No supported files under {}", cli.dir.display());
        return Ok(());
    }
    let engine = docrag_cli::build_engine(&settings, &base).await?;

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut total_chunks = 0;
    let mut empty = 0;
    for document in documents {
        pb.set_message(document.filename.clone());
        let report = engine.index_documents(&cli.namespace, vec![document]).await?;
        total_chunks += report.documents;
        for file in report.files.iter().filter(|f| f.chunks == 0) {
            warn!(source = %file.source, "no text extracted");
            empty += 1;
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("Indexed {total_chunks} chunks into '{}'", cli.namespace);
    if empty > 0 {
        println!("{empty} file(s) produced no text");
    }
    println!("Namespace now holds {} chunks", engine.count(&cli.namespace).await?);
    Ok(())
}
