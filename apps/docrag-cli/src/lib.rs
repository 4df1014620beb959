//! Shared start-up for the `docrag-*` binaries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use docrag_core::config::{Config, Settings};
use docrag_engine::RagEngine;

/// `RUST_LOG` wins; otherwise `info`, or `debug` when verbose.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug,lance=info,lancedb=info,hyper=info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_target(false)
        .init();
}

/// Loads layered settings; relative paths resolve against the working directory.
pub fn load_settings() -> Result<(Settings, PathBuf)> {
    let config = Config::load().context("loading config")?;
    let settings = config.settings()?;
    let base = std::env::current_dir().context("resolving working directory")?;
    Ok((settings, base))
}

pub async fn build_engine(settings: &Settings, base: &std::path::Path) -> Result<Arc<RagEngine>> {
    let engine = RagEngine::from_settings(settings, base).await?;
    Ok(Arc::new(engine))
}
