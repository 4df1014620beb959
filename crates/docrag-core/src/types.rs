//! Domain types shared by the indexing and query paths.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub type ChunkId = String;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_TOP_K: i64 = 5;
const MAX_NAMESPACE_LEN: usize = 64;

/// A named byte blob submitted for indexing. Lives only for the duration of
/// one indexing call.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { filename: filename.into(), content: content.into() }
    }
}

/// Where a chunk came from.
///
/// - `source`: the submitted filename
/// - `chunk_index`/`total_chunks`: position within that document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A bounded unit of source text, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A stored chunk returned by a similarity query. Higher `score` is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// A tenant partition of the index. Names double as on-disk table names, so
/// they are restricted to `[A-Za-z0-9_.-]`, 1..=64 chars, not starting with `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_NAMESPACE_LEN {
            return Err(Error::InvalidInput(format!(
                "namespace must be 1..={MAX_NAMESPACE_LEN} characters, got {}",
                name.len()
            )));
        }
        if name.starts_with('.') {
            return Err(Error::InvalidInput(format!("namespace '{name}' may not start with '.'")));
        }
        if let Some(bad) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))) {
            return Err(Error::InvalidInput(format!("namespace '{name}' contains invalid character {bad:?}")));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for Namespace {
    fn default() -> Self { Self(DEFAULT_NAMESPACE.to_string()) }
}

impl TryFrom<String> for Namespace {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self { ns.0 }
}

impl FromStr for Namespace {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> { Self::new(s) }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Selects between deterministic context-echo and model-generated synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    #[default]
    Simple,
    Llm,
}

impl FromStr for AnswerMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "llm" => Ok(Self::Llm),
            other => Err(Error::InvalidInput(format!("unknown answer_mode '{other}', expected 'simple' or 'llm'"))),
        }
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::Simple => "simple", Self::Llm => "llm" })
    }
}

fn default_with_answer() -> bool { true }

/// Input of the query call. `top_k` is signed on the wire so that
/// non-positive values can be rejected explicitly; when absent the engine's
/// configured default applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub namespace: Namespace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(default = "default_with_answer")]
    pub with_answer: bool,
    #[serde(default)]
    pub answer_mode: AnswerMode,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            question: question.into(),
            namespace,
            top_k: None,
            with_answer: true,
            answer_mode: AnswerMode::Simple,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: i64) -> Self { self.top_k = Some(top_k); self }

    #[must_use]
    pub fn with_mode(mut self, mode: AnswerMode) -> Self { self.answer_mode = mode; self }

    #[must_use]
    pub fn without_answer(mut self) -> Self { self.with_answer = false; self }

    /// Checks the request and returns the effective `k`: `top_k` or
    /// `default_top_k`, clamped to `max_top_k`.
    pub fn validate(&self, default_top_k: i64, max_top_k: usize) -> Result<usize> {
        if self.question.trim().is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }
        let top_k = self.top_k.unwrap_or(default_top_k);
        if top_k <= 0 {
            return Err(Error::InvalidInput(format!("top_k must be positive, got {top_k}")));
        }
        let k = usize::try_from(top_k).unwrap_or(usize::MAX);
        Ok(k.min(max_top_k))
    }
}

/// Output of the query call. Built per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub ok: bool,
    pub namespace: Namespace,
    pub question: String,
    pub contexts: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub source: String,
    pub chunks: usize,
}

/// Output of the indexing call. `documents` is the total chunk count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    pub ok: bool,
    pub namespace: Namespace,
    pub documents: usize,
    pub files: Vec<FileReport>,
}

/// Events of the streaming query variant, in emission order:
/// one `Meta`, zero or more `Delta`, then exactly one of `Done` or `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Meta { contexts: Vec<String>, metadatas: Vec<ChunkMetadata> },
    Delta(String),
    Done,
    Error(String),
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Meta { .. } => "meta",
            Self::Delta(_) => "delta",
            Self::Done => "done",
            Self::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Done | Self::Error(_)) }

    /// JSON payload carried in the event's `data` field.
    pub fn payload(&self) -> Value {
        match self {
            Self::Meta { contexts, metadatas } => json!({ "contexts": contexts, "metadatas": metadatas }),
            Self::Delta(piece) => Value::String(piece.clone()),
            Self::Done => json!({}),
            Self::Error(message) => Value::String(message.clone()),
        }
    }
}
