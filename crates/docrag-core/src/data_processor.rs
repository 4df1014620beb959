//! Text splitting and document preparation.
//!
//! The splitter works paragraph -> sentence -> fixed window: paragraphs are
//! cut on blank lines, sentences on `.`/`!`/`?` once the running buffer is
//! longer than 40 characters, sentences are packed greedily into chunks of at
//! most `chunk_size` characters, oversized sentences are hard-wrapped into
//! overlapping windows, and finally every chunk after the first is prefixed
//! with the tail of the chunk emitted before it.
//!
//! All lengths are counted in `char`s.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 900;
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// A terminator only ends a sentence once the buffer is longer than this.
const SENTENCE_MIN_CHARS: usize = 40;

/// Extensions picked up when ingesting a directory.
pub const INGESTIBLE_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "docx", "html", "htm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { chunk_size: DEFAULT_CHUNK_SIZE, chunk_overlap: DEFAULT_CHUNK_OVERLAP } }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, chunk_overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split `text` into ordered, overlapping chunks. Never returns empty strings.
///
/// The configuration is not validated here; with `chunk_overlap >= chunk_size`
/// hard-wrapped windows advance one character at a time.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let sentences: Vec<String> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .flat_map(naive_sentences)
        .collect();

    let chunks = pack_sentences(sentences, chunk_size, chunk_overlap);
    let chunks = if chunk_overlap > 0 && chunks.len() > 1 { stitch_overlaps(chunks, chunk_overlap) } else { chunks };

    chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Heuristic, not grammar-aware: "Dr. Smith" early in a paragraph stays whole
/// because the buffer is still short.
fn naive_sentences(paragraph: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;
    for ch in paragraph.chars() {
        buf.push(ch);
        buf_len += 1;
        if matches!(ch, '.' | '!' | '?') && buf_len > SENTENCE_MIN_CHARS {
            parts.push(buf.trim().to_string());
            buf.clear();
            buf_len = 0;
        }
    }
    let rest = buf.trim();
    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    if parts.is_empty() {
        parts.push(paragraph.to_string());
    }
    parts
}

fn pack_sentences(sentences: Vec<String>, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences {
        let len = char_len(&sentence);
        if current_len + 1 + len <= chunk_size {
            if current.is_empty() {
                current = sentence;
                current_len = len;
            } else {
                current.push(' ');
                current.push_str(&sentence);
                current_len += 1 + len;
            }
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if len > chunk_size {
            hard_wrap(&sentence, chunk_size, chunk_overlap, &mut chunks);
        } else {
            current = sentence;
            current_len = len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Fixed windows of `chunk_size` chars, each starting `chunk_size - chunk_overlap`
/// after the previous one; the last window may be shorter.
fn hard_wrap(sentence: &str, chunk_size: usize, chunk_overlap: usize, out: &mut Vec<String>) {
    let chars: Vec<char> = sentence.chars().collect();
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        start += step;
    }
}

fn stitch_overlaps(chunks: Vec<String>, chunk_overlap: usize) -> Vec<String> {
    let mut stitched: Vec<String> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let next = match stitched.last() {
            Some(prev) => format!("{} {}", last_chars(prev, chunk_overlap), chunk).trim().to_string(),
            None => chunk,
        };
        stitched.push(next);
    }
    stitched
}

fn char_len(s: &str) -> usize { s.chars().count() }

/// The trailing `n` chars of `s` (all of `s` when shorter).
fn last_chars(s: &str, n: usize) -> &str {
    let total = char_len(s);
    if total <= n {
        return s;
    }
    match s.char_indices().nth(total - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Turns extracted document text into chunks with fresh ids.
#[derive(Debug, Clone, Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Result<Self> {
        chunking_config.validate()?;
        Ok(Self { chunking_config })
    }

    pub fn config(&self) -> &ChunkingConfig { &self.chunking_config }

    pub fn split(&self, text: &str) -> Vec<String> {
        split_text(text, self.chunking_config.chunk_size, self.chunking_config.chunk_overlap)
    }

    /// Splits `text` and wraps each piece as a [`Chunk`] attributed to `source`.
    /// Ids are random UUIDs, so concurrent indexing calls never collide.
    pub fn chunk_text(&self, source: &str, text: &str) -> Vec<Chunk> {
        let pieces = self.split(text);
        let total_chunks = pieces.len();
        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                id: Uuid::new_v4().to_string(),
                text,
                metadata: ChunkMetadata { source: source.to_string(), chunk_index, total_chunks },
            })
            .collect()
    }

    /// Reads every ingestible file under `data_dir` (recursively, sorted by path).
    /// Unreadable files are skipped with a warning.
    pub fn load_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("directory {}", data_dir.display())));
        }
        let files = list_ingestible_files(data_dir);
        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match fs::read(&path) {
                Ok(content) => {
                    let filename = path.strip_prefix(data_dir).unwrap_or(&path).to_string_lossy().to_string();
                    documents.push(Document::new(filename, content));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }
        debug!(count = documents.len(), dir = %data_dir.display(), "loaded documents");
        Ok(documents)
    }
}

fn list_ingestible_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| INGESTIBLE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        })
        .collect();
    files.sort();
    files
}
