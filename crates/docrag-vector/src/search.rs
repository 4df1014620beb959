use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, StringArray};

use docrag_core::types::{ChunkMetadata, ScoredChunk};

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("missing or mistyped column '{name}'"))
}

/// Converts a vector-search result batch; cosine `_distance` becomes `1 - distance`.
pub fn batch_to_scored(batch: &RecordBatch) -> Result<Vec<ScoredChunk>> {
    let ids = column::<StringArray>(batch, "id")?;
    let sources = column::<StringArray>(batch, "source")?;
    let contents = column::<StringArray>(batch, "content")?;
    let chunk_indices = column::<Int32Array>(batch, "chunk_index")?;
    let totals = column::<Int32Array>(batch, "total_chunks")?;
    let distances = column::<Float32Array>(batch, "_distance").ok();

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        out.push(ScoredChunk {
            id: ids.value(i).to_string(),
            text: contents.value(i).to_string(),
            metadata: ChunkMetadata {
                source: sources.value(i).to_string(),
                chunk_index: usize::try_from(chunk_indices.value(i)).unwrap_or(0),
                total_chunks: usize::try_from(totals.value(i)).unwrap_or(0),
            },
            score: distances.map_or(0.5, |d| 1.0 - d.value(i)),
        });
    }
    Ok(out)
}
