use anyhow::{bail, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use std::sync::Arc;

use docrag_core::types::Chunk;

use crate::schema::build_chunk_schema;

/// Packs chunks and their vectors into a single batch so one `add` is one commit.
pub fn chunks_to_record_batch(chunks: &[Chunk], embeddings: &[Vec<f32>], dim: i32) -> Result<RecordBatch> {
    if chunks.len() != embeddings.len() {
        bail!("{} chunks but {} embeddings", chunks.len(), embeddings.len());
    }
    let expected = usize::try_from(dim)?;
    if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
        bail!("embedding has {} dims, table expects {expected}", bad.len());
    }

    let now = Utc::now().timestamp_millis();
    let mut ids = Vec::with_capacity(chunks.len());
    let mut sources = Vec::with_capacity(chunks.len());
    let mut contents = Vec::with_capacity(chunks.len());
    let mut chunk_indices = Vec::with_capacity(chunks.len());
    let mut totals = Vec::with_capacity(chunks.len());
    for c in chunks {
        ids.push(c.id.as_str());
        sources.push(c.metadata.source.as_str());
        contents.push(c.text.as_str());
        chunk_indices.push(i32::try_from(c.metadata.chunk_index)?);
        totals.push(i32::try_from(c.metadata.total_chunks)?);
    }
    let vectors = embeddings.iter().map(|e| Some(e.iter().copied().map(Some)));

    Ok(RecordBatch::try_new(
        build_chunk_schema(dim),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(contents)),
            Arc::new(Int32Array::from(chunk_indices)),
            Arc::new(Int32Array::from(totals)),
            Arc::new(TimestampMillisecondArray::from(vec![now; chunks.len()])),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
        ],
    )?)
}
