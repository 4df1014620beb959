use async_trait::async_trait;

use crate::types::{Chunk, Namespace, ScoredChunk};

/// Turns texts into fixed-dimension, L2-normalized vectors.
///
/// Implementations are CPU/GPU bound and synchronous; async callers should
/// run them on a blocking thread.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the provider/model (e.g. `hash:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Durable nearest-neighbour storage partitioned by namespace.
///
/// `add` is atomic per call: concurrent readers see either none or all of
/// the chunks it writes. Unknown namespaces behave as empty ones.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, namespace: &Namespace, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;

    /// Returns at most `k` chunks, most relevant first.
    async fn search_vec(&self, namespace: &Namespace, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<ScoredChunk>>;

    async fn count(&self, namespace: &Namespace) -> anyhow::Result<usize>;

    /// Namespaces that currently hold at least one chunk.
    async fn namespaces(&self) -> anyhow::Result<Vec<Namespace>>;

    /// Removes every chunk of `namespace`; returns whether anything was removed.
    async fn drop_namespace(&self, namespace: &Namespace) -> anyhow::Result<bool>;
}
