//! Embedding providers behind the [`Embedder`] trait.
//!
//! The provider is chosen once at startup by [`select_embedder`]:
//! `APP_USE_FAKE_EMBEDDINGS=1` or `embedding.use_fake = true` selects the
//! deterministic [`HashEmbedder`]; otherwise `embedding.model_dir` loads a
//! local transformer.

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use docrag_core::config::{resolve_with_base, EmbeddingSettings};
use docrag_core::traits::Embedder;

mod device;
mod hashed;
mod model;
mod pool;
mod tokenize;

pub use hashed::HashEmbedder;
pub use model::SentenceEmbedder;
pub use pool::masked_mean_l2;

pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Picks the embedding provider. Relative `model_dir` values resolve against `base`.
pub fn select_embedder(settings: &EmbeddingSettings, base: &Path) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake || fake_embeddings_requested() {
        info!(dim = settings.dimension, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dimension)));
    }
    match &settings.model_dir {
        Some(dir) => {
            let embedder = SentenceEmbedder::load(&resolve_with_base(base, dir), settings.max_len)?;
            if embedder.dim() != settings.dimension {
                bail!(
                    "model produces {}-d vectors but embedding.dimension is {}",
                    embedder.dim(),
                    settings.dimension
                );
            }
            Ok(Arc::new(embedder))
        }
        None => {
            warn!(dim = settings.dimension, "no embedding.model_dir configured; falling back to hash embedder");
            Ok(Arc::new(HashEmbedder::new(settings.dimension)))
        }
    }
}
