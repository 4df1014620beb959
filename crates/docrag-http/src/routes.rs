use std::convert::Infallible;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use docrag_core::types::{AnswerMode, Document, IndexReport, Namespace, QueryRequest, QueryResult, StreamEvent};

use crate::error::ApiError;
use crate::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Multipart form: one or more `files` parts and an optional `namespace` field.
pub async fn index(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<IndexReport>, ApiError> {
    let mut namespace = Namespace::default();
    let mut documents = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::bad_request(e.body_text()))? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "namespace" => {
                let value = field.text().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
                namespace = value.trim().parse()?;
            }
            "files" => {
                let filename = field.file_name().map_or_else(|| "upload".to_string(), str::to_string);
                let content = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
                documents.push(Document::new(filename, content.to_vec()));
            }
            other => debug!(field = other, "ignoring multipart field"),
        }
    }
    if documents.is_empty() {
        return Err(ApiError::bad_request("no files uploaded"));
    }
    Ok(Json(state.engine.index_documents(&namespace, documents).await?))
}

pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(state.engine.query(&request).await?))
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub question: String,
    pub namespace: Option<String>,
    pub top_k: Option<i64>,
    pub answer_mode: Option<String>,
}

impl StreamParams {
    fn into_request(self) -> docrag_core::Result<QueryRequest> {
        let namespace = match self.namespace {
            Some(ns) => ns.parse()?,
            None => Namespace::default(),
        };
        let mode = match self.answer_mode {
            Some(mode) => mode.parse()?,
            None => AnswerMode::Simple,
        };
        let request = QueryRequest::new(self.question, namespace).with_mode(mode);
        Ok(match self.top_k {
            Some(k) => request.with_top_k(k),
            None => request,
        })
    }
}

/// Server-sent events `meta`, `delta`*, then `done`; failures after the
/// stream opened arrive as a single `error` event.
pub async fn stream_query(
    State(state): State<AppState>,
    params: Result<Query<StreamParams>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let events: BoxStream<'static, StreamEvent> = match params.into_request() {
        Ok(request) => state.engine.stream_query(request).boxed(),
        Err(e) => stream::iter([StreamEvent::Error(e.to_string())]).boxed(),
    };
    let sse = events.map(|event| Ok::<_, Infallible>(Event::default().event(event.name()).data(event.payload().to_string())));
    Ok(Sse::new(sse).keep_alive(KeepAlive::default()))
}
