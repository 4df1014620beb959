//! Builds the final answer from ranked context.
use std::sync::Arc;
use tracing::{debug, warn};

use docrag_core::types::AnswerMode;

use crate::model::ChatModel;

pub const NO_CONTEXT_ANSWER: &str = "No context available. Try indexing documents first.";
pub const SIMPLE_LEAD_IN: &str = "Based on the indexed documents, here are the most relevant passages:\n\n";
const CONTEXT_SEPARATOR: &str = "\n\n";

/// The first `max` chars of `s`.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn join_contexts(contexts: &[String]) -> String { contexts.join(CONTEXT_SEPARATOR) }

/// Deterministic context echo, bounded to `budget` chars of context.
pub fn simple_answer(context: &str, budget: usize) -> String {
    if context.is_empty() {
        return NO_CONTEXT_ANSWER.to_string();
    }
    format!("{SIMPLE_LEAD_IN}{}", truncate_chars(context, budget))
}

pub fn build_prompt(question: &str, context: &str, budget: usize) -> String {
    format!(
        "You are a helpful assistant. Answer the user's question using ONLY the provided context. \
         If the answer isn't in the context, say you don't know succinctly.\n\n\
         Context:\n{}\n\nQuestion: {question}\nAnswer:",
        truncate_chars(context, budget)
    )
}

pub struct AnswerComposer {
    model: Arc<dyn ChatModel>,
    simple_budget: usize,
    llm_context_budget: usize,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn ChatModel>, simple_budget: usize, llm_context_budget: usize) -> Self {
        Self { model, simple_budget, llm_context_budget }
    }

    pub fn model(&self) -> &Arc<dyn ChatModel> { &self.model }

    /// Never fails: an unconfigured or failing model degrades to the simple answer.
    pub async fn compose(&self, question: &str, contexts: &[String], mode: AnswerMode) -> String {
        let context = join_contexts(contexts);
        if mode == AnswerMode::Llm {
            if self.model.is_configured() {
                match self.model.complete(&build_prompt(question, &context, self.llm_context_budget)).await {
                    Ok(answer) => return answer,
                    Err(e) => warn!(model = self.model.name(), error = %e, "llm answer failed; using simple answer"),
                }
            } else {
                debug!("llm mode requested without a configured model; using simple answer");
            }
        }
        simple_answer(&context, self.simple_budget)
    }
}
