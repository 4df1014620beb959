//! Runs the HTTP service. Host and port come from `[server]` in config or
//! `APP_SERVER__HOST` / `APP_SERVER__PORT`.

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "docrag-server", version, about = "Serve the RAG HTTP API")]
struct Cli {
    /// Overrides server.port
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    docrag_cli::init_tracing(cli.verbose);
    let (mut settings, base) = docrag_cli::load_settings()?;
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    let engine = docrag_cli::build_engine(&settings, &base).await?;
    docrag_http::serve(engine, &settings.server).await
}
