//! Persistent [`VectorStore`] on LanceDB: one table per namespace.
use anyhow::Result;
use arrow_array::RecordBatchIterator;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use docrag_core::traits::VectorStore;
use docrag_core::types::{Chunk, Namespace, ScoredChunk};

use crate::schema::build_chunk_schema;
use crate::search::batch_to_scored;
use crate::table::{ensure_table, open_db, table_exists};
use crate::writer::chunks_to_record_batch;

pub struct LanceStore {
    db: Connection,
    dim: i32,
    /// Serializes writers within a namespace; namespaces never contend.
    write_locks: Mutex<HashMap<Namespace, Arc<tokio::sync::Mutex<()>>>>,
}

impl LanceStore {
    pub async fn open(path: &Path, dim: usize) -> Result<Self> {
        tokio::fs::create_dir_all(path).await?;
        let db = open_db(path.to_string_lossy().as_ref()).await?;
        info!(path = %path.display(), dim, "opened lancedb store");
        Ok(Self { db, dim: i32::try_from(dim)?, write_locks: Mutex::new(HashMap::new()) })
    }

    fn write_lock(&self, namespace: &Namespace) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.write_locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.entry(namespace.clone()).or_default().clone()
    }

    async fn open_if_exists(&self, namespace: &Namespace) -> Result<Option<lancedb::Table>> {
        if !table_exists(&self.db, namespace.as_str()).await? {
            return Ok(None);
        }
        Ok(Some(self.db.open_table(namespace.as_str()).execute().await?))
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn add(&self, namespace: &Namespace, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.is_empty() { return Ok(()); }
        let batch = chunks_to_record_batch(chunks, embeddings, self.dim)?;
        let schema = batch.schema();
        let lock = self.write_lock(namespace);
        let _guard = lock.lock().await;
        ensure_table(&self.db, namespace.as_str(), build_chunk_schema(self.dim)).await?;
        let table = self.db.open_table(namespace.as_str()).execute().await?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        table.add(reader).execute().await?;
        debug!(namespace = %namespace, rows = chunks.len(), "added chunks");
        Ok(())
    }

    async fn search_vec(&self, namespace: &Namespace, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 { return Ok(Vec::new()); }
        let Some(table) = self.open_if_exists(namespace).await? else { return Ok(Vec::new()) };
        if table.count_rows(None).await? == 0 { return Ok(Vec::new()); }
        let mut stream = table
            .vector_search(query_vec.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            hits.extend(batch_to_scored(&batch)?);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self, namespace: &Namespace) -> Result<usize> {
        match self.open_if_exists(namespace).await? {
            Some(table) => Ok(table.count_rows(None).await?),
            None => Ok(0),
        }
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>> {
        let mut out = Vec::new();
        for name in self.db.table_names().execute().await? {
            let Ok(namespace) = Namespace::new(name) else { continue };
            if self.count(&namespace).await? > 0 {
                out.push(namespace);
            }
        }
        out.sort();
        Ok(out)
    }

    async fn drop_namespace(&self, namespace: &Namespace) -> Result<bool> {
        let lock = self.write_lock(namespace);
        let _guard = lock.lock().await;
        let dropped = self.delete_all(namespace).await;
        self.forget_lock(namespace);
        dropped
    }
}

impl LanceStore {
    async fn delete_all(&self, namespace: &Namespace) -> Result<bool> {
        let Some(table) = self.open_if_exists(namespace).await? else { return Ok(false) };
        let rows = table.count_rows(None).await?;
        if rows == 0 { return Ok(false); }
        table.delete("id IS NOT NULL").await?;
        info!(namespace = %namespace, rows, "dropped namespace");
        Ok(true)
    }

    fn forget_lock(&self, namespace: &Namespace) {
        self.write_locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner).remove(namespace);
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.write_locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}
