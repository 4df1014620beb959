//! Text-level facade over an [`Embedder`] and a [`VectorStore`].
use std::sync::Arc;
use tracing::debug;

use docrag_core::error::{Error, Result};
use docrag_core::traits::{Embedder, VectorStore};
use docrag_core::types::{Chunk, Namespace, ScoredChunk};

/// Texts handed to the embedder per call.
pub const EMBED_BATCH: usize = 32;

#[derive(Clone)]
pub struct Collections {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl Collections {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self { Self { store, embedder } }

    pub fn store(&self) -> &Arc<dyn VectorStore> { &self.store }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    /// Embeds off the async runtime in batches of [`EMBED_BATCH`]; inference is CPU bound.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embedder = Arc::clone(&self.embedder);
        let expected = texts.len();
        let vectors = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for batch in texts.chunks(EMBED_BATCH) {
                out.extend(embedder.embed_batch(batch)?);
            }
            Ok(out)
        })
        .await
        .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
        .map_err(|e| Error::Embedding(format!("{e:#}")))?;
        if vectors.len() != expected {
            return Err(Error::Embedding(format!("embedder returned {} vectors for {expected} texts", vectors.len())));
        }
        Ok(vectors)
    }

    pub async fn add(&self, namespace: &Namespace, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() { return Ok(0); }
        let texts = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embed(texts).await?;
        self.store.add(namespace, chunks, &embeddings).await.map_err(store_error)?;
        debug!(namespace = %namespace, chunks = chunks.len(), embedder = self.embedder.id(), "stored chunks");
        Ok(chunks.len())
    }

    /// Up to `k` chunks of `namespace` most similar to `question`, best first.
    pub async fn query(&self, namespace: &Namespace, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.count(namespace).await? == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embed(vec![question.to_string()]).await?.remove(0);
        self.store.search_vec(namespace, &query_vec, k).await.map_err(store_error)
    }

    pub async fn count(&self, namespace: &Namespace) -> Result<usize> {
        self.store.count(namespace).await.map_err(store_error)
    }

    pub async fn namespaces(&self) -> Result<Vec<Namespace>> {
        self.store.namespaces().await.map_err(store_error)
    }

    pub async fn drop_namespace(&self, namespace: &Namespace) -> Result<bool> {
        self.store.drop_namespace(namespace).await.map_err(store_error)
    }
}

fn store_error(e: anyhow::Error) -> Error { Error::Store(format!("{e:#}")) }
