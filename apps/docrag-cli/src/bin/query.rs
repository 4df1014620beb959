//! Asks a question against a namespace, or manages namespaces.
//!
//! Usage:
//!   docrag-query "when do you open?" --namespace bakery
//!   docrag-query "refund policy" --mode llm --json
//!   docrag-query --list
//!   docrag-query --drop bakery

use anyhow::{bail, Result};
use clap::Parser;

use docrag_core::types::{AnswerMode, Namespace, QueryRequest};

#[derive(Parser)]
#[command(name = "docrag-query", version, about = "Query indexed documents")]
struct Cli {
    question: Option<String>,

    #[arg(short, long, default_value = "default")]
    namespace: Namespace,

    #[arg(short = 'k', long)]
    top_k: Option<i64>,

    /// simple | llm
    #[arg(short, long, default_value = "simple")]
    mode: AnswerMode,

    /// Only print the retrieved contexts
    #[arg(long)]
    no_answer: bool,

    /// Print the raw result as JSON
    #[arg(long)]
    json: bool,

    /// List namespaces with their chunk counts
    #[arg(long, conflicts_with = "question")]
    list: bool,

    /// Delete every chunk of a namespace
    #[arg(long, value_name = "NS", conflicts_with_all = ["question", "list"])]
    drop: Option<Namespace>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    docrag_cli::init_tracing(cli.verbose);
    let (settings, base) = docrag_cli::load_settings()?;
    let engine = docrag_cli::build_engine(&settings, &base).await?;

    if cli.list {
        for ns in engine.namespaces().await? {
            println!("{ns}\t{}", engine.count(&ns).await?);
        }
        return Ok(());
    }
    if let Some(ns) = cli.drop {
        if engine.drop_namespace(&ns).await? {
            println!("Dropped '{ns}'");
        } else {
            println!("Nothing stored under '{ns}'");
        }
        return Ok(());
    }

    let Some(question) = cli.question else {
        bail!("a question is required unless --list or --drop is given");
    };
    let mut request = QueryRequest::new(question, cli.namespace).with_mode(cli.mode);
    if let Some(k) = cli.top_k {
        request = request.with_top_k(k);
    }
    if cli.no_answer {
        request = request.without_answer();
    }
    let result = engine.query(&request).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if let Some(answer) = &result.answer {
        println!("{answer}\n");
    }
    println!("Contexts ({}):", result.contexts.len());
    for (i, (context, meta)) in result.contexts.iter().zip(&result.metadatas).enumerate() {
        println!("{}. {} [{}/{}]", i + 1, meta.source, meta.chunk_index + 1, meta.total_chunks);
        println!("   {}", context.replace('\n', " "));
    }
    Ok(())
}
