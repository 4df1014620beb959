//! The indexing and query pipeline: extract, split, embed, store, retrieve,
//! compose.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use docrag_answer::{select_model, AnswerComposer};
use docrag_core::config::{QuerySettings, Settings, StreamSettings};
use docrag_core::data_processor::DataProcessor;
use docrag_core::error::{Error, Result};
use docrag_core::types::{Chunk, Document, FileReport, IndexReport, Namespace, QueryRequest, QueryResult, StreamEvent};
use docrag_embed::select_embedder;
use docrag_vector::{Collections, LanceStore};

pub struct RagEngine {
    processor: DataProcessor,
    collections: Collections,
    composer: AnswerComposer,
    query: QuerySettings,
    stream: StreamSettings,
}

impl RagEngine {
    pub fn new(
        processor: DataProcessor,
        collections: Collections,
        composer: AnswerComposer,
        query: QuerySettings,
        stream: StreamSettings,
    ) -> Self {
        Self { processor, collections, composer, query, stream }
    }

    /// Wires the persistent stack from settings. Providers are chosen here,
    /// once; relative paths resolve against `base`.
    pub async fn from_settings(settings: &Settings, base: &Path) -> Result<Self> {
        settings.validate().map_err(|e| Error::InvalidConfig(format!("{e:#}")))?;
        let processor = DataProcessor::with_config(settings.chunking)?;
        let embedder = select_embedder(&settings.embedding, base).map_err(|e| Error::Embedding(format!("{e:#}")))?;
        let db_path = settings.storage.lancedb_path(base);
        let store = LanceStore::open(&db_path, embedder.dim()).await.map_err(|e| Error::Store(format!("{e:#}")))?;
        let model = select_model(&settings.answer).map_err(|e| Error::Provider(format!("{e:#}")))?;
        info!(db = %db_path.display(), embedder = embedder.id(), model = model.name(), "engine ready");
        let composer = AnswerComposer::new(model, settings.answer.simple_budget, settings.answer.llm_context_budget);
        Ok(Self::new(
            processor,
            Collections::new(Arc::new(store), embedder),
            composer,
            settings.query.clone(),
            settings.stream.clone(),
        ))
    }

    /// Extracts and splits every document in parallel, then stores all chunks
    /// in one write. Documents yielding no text, or whose extraction task
    /// dies, are listed with zero chunks and do not affect their siblings.
    pub async fn index_documents(&self, namespace: &Namespace, documents: Vec<Document>) -> Result<IndexReport> {
        let tasks = documents.into_iter().map(|doc| {
            let processor = self.processor.clone();
            let source = doc.filename.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let text = docrag_extract::extract(&doc.filename, &doc.content);
                processor.chunk_text(&doc.filename, &text)
            });
            async move { (source, handle.await) }
        });

        let mut files = Vec::new();
        let mut chunks: Vec<Chunk> = Vec::new();
        for (source, joined) in join_all(tasks).await {
            let doc_chunks = joined.unwrap_or_else(|e| {
                warn!(source = %source, error = %e, "extraction task failed; skipping document");
                Vec::new()
            });
            if doc_chunks.is_empty() {
                debug!(source = %source, "no text extracted; skipping");
            }
            files.push(FileReport { source, chunks: doc_chunks.len() });
            chunks.extend(doc_chunks);
        }

        let stored = self.collections.add(namespace, &chunks).await?;
        info!(namespace = %namespace, files = files.len(), chunks = stored, "indexed documents");
        Ok(IndexReport { ok: true, namespace: namespace.clone(), documents: stored, files })
    }

    pub async fn index_directory(&self, namespace: &Namespace, dir: &Path) -> Result<IndexReport> {
        let documents = self.processor.load_directory(dir)?;
        self.index_documents(namespace, documents).await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResult> {
        let k = request.validate(self.query.default_top_k, self.query.max_top_k)?;
        let hits = self.collections.query(&request.namespace, &request.question, k).await?;
        let (contexts, metadatas): (Vec<_>, Vec<_>) = hits.into_iter().map(|h| (h.text, h.metadata)).unzip();
        let answer = if request.with_answer {
            Some(self.composer.compose(&request.question, &contexts, request.answer_mode).await)
        } else {
            None
        };
        debug!(namespace = %request.namespace, k, hits = contexts.len(), "query answered");
        Ok(QueryResult {
            ok: true,
            namespace: request.namespace.clone(),
            question: request.question.clone(),
            contexts,
            metadatas,
            answer,
        })
    }

    /// Runs the query on a background task and yields `meta`, `delta`*, then
    /// `done`, or a single `error` if the query fails. The answer is always
    /// computed. Dropping the stream stops the task at its next send.
    pub fn stream_query(self: &Arc<Self>, request: QueryRequest) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(16);
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_stream(request, tx).await });
        ReceiverStream::new(rx)
    }

    async fn run_stream(&self, request: QueryRequest, tx: mpsc::Sender<StreamEvent>) {
        let request = QueryRequest { with_answer: true, ..request };
        let result = match self.query(&request).await {
            Ok(result) => result,
            Err(e) => {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        };
        if tx.send(StreamEvent::Meta { contexts: result.contexts, metadatas: result.metadatas }).await.is_err() {
            return;
        }
        let answer = result.answer.unwrap_or_default();
        let delay = Duration::from_millis(self.stream.piece_delay_ms);
        for piece in slice_answer(&answer, self.stream.min_piece_chars, self.stream.target_pieces) {
            if tx.send(StreamEvent::Delta(piece)).await.is_err() {
                debug!("stream receiver dropped");
                return;
            }
            tokio::time::sleep(delay).await;
        }
        let _ = tx.send(StreamEvent::Done).await;
    }

    pub async fn namespaces(&self) -> Result<Vec<Namespace>> { self.collections.namespaces().await }

    pub async fn count(&self, namespace: &Namespace) -> Result<usize> { self.collections.count(namespace).await }

    pub async fn drop_namespace(&self, namespace: &Namespace) -> Result<bool> {
        let dropped = self.collections.drop_namespace(namespace).await?;
        info!(namespace = %namespace, dropped, "drop namespace");
        Ok(dropped)
    }
}

/// Cuts `answer` into pieces of `max(min_piece_chars, chars / target_pieces)` chars.
pub fn slice_answer(answer: &str, min_piece_chars: usize, target_pieces: usize) -> Vec<String> {
    let chars: Vec<char> = answer.chars().collect();
    let step = min_piece_chars.max(chars.len() / target_pieces.max(1)).max(1);
    chars.chunks(step).map(|piece| piece.iter().collect()).collect()
}
