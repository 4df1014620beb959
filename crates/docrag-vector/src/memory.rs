//! In-memory [`VectorStore`] with brute-force cosine search, for tests and
//! ephemeral runs.
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use docrag_core::traits::VectorStore;
use docrag_core::types::{Chunk, Namespace, ScoredChunk};

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<Namespace, Vec<(Chunk, Vec<f32>)>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add(&self, namespace: &Namespace, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            bail!("{} chunks but {} embeddings", chunks.len(), embeddings.len());
        }
        if chunks.is_empty() { return Ok(()); }
        let rows = chunks.iter().cloned().zip(embeddings.iter().cloned());
        self.entries.write().await.entry(namespace.clone()).or_default().extend(rows);
        Ok(())
    }

    async fn search_vec(&self, namespace: &Namespace, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let entries = self.entries.read().await;
        let Some(rows) = entries.get(namespace) else { return Ok(Vec::new()) };
        let mut hits: Vec<ScoredChunk> = rows
            .iter()
            .map(|(chunk, vector)| ScoredChunk {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                score: Self::cosine_similarity(query_vec, vector),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self, namespace: &Namespace) -> Result<usize> {
        Ok(self.entries.read().await.get(namespace).map_or(0, Vec::len))
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>> {
        let mut names: Vec<Namespace> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(ns, _)| ns.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn drop_namespace(&self, namespace: &Namespace) -> Result<bool> {
        Ok(self.entries.write().await.remove(namespace).is_some_and(|rows| !rows.is_empty()))
    }
}
