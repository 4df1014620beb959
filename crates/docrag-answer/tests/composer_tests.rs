use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use docrag_answer::{AnswerComposer, ChatModel, NoopModel, NO_CONTEXT_ANSWER, SIMPLE_LEAD_IN};
use docrag_core::types::AnswerMode;

struct CannedModel { reply: Result<String, String>, calls: AtomicUsize, last_prompt: std::sync::Mutex<String> }

impl CannedModel {
    fn ok(reply: &str) -> Self { Self { reply: Ok(reply.into()), calls: AtomicUsize::new(0), last_prompt: std::sync::Mutex::new(String::new()) } }
    fn failing() -> Self { Self { reply: Err("upstream 500".into()), calls: AtomicUsize::new(0), last_prompt: std::sync::Mutex::new(String::new()) } }
}

#[async_trait]
impl ChatModel for CannedModel {
    fn name(&self) -> &str { "canned" }
    fn is_configured(&self) -> bool { true }
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("lock") = prompt.to_string();
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => bail!("{e}"),
        }
    }
}

fn contexts() -> Vec<String> { vec!["We open at 9am.".into(), "Closed on Sundays.".into()] }

#[tokio::test]
async fn simple_mode_echoes_joined_context() {
    let composer = AnswerComposer::new(Arc::new(NoopModel), 1200, 6000);
    let answer = composer.compose("hours?", &contexts(), AnswerMode::Simple).await;
    assert_eq!(answer, format!("{SIMPLE_LEAD_IN}We open at 9am.\n\nClosed on Sundays."));
}

#[tokio::test]
async fn empty_context_has_defined_answer() {
    let composer = AnswerComposer::new(Arc::new(NoopModel), 1200, 6000);
    assert_eq!(composer.compose("hours?", &[], AnswerMode::Simple).await, NO_CONTEXT_ANSWER);
    assert_eq!(composer.compose("hours?", &[], AnswerMode::Llm).await, NO_CONTEXT_ANSWER);
}

#[tokio::test]
async fn llm_mode_without_model_falls_back_to_simple() {
    let composer = AnswerComposer::new(Arc::new(NoopModel), 1200, 6000);
    let simple = composer.compose("hours?", &contexts(), AnswerMode::Simple).await;
    assert_eq!(composer.compose("hours?", &contexts(), AnswerMode::Llm).await, simple);
}

#[tokio::test]
async fn llm_mode_uses_model_reply() {
    let model = Arc::new(CannedModel::ok("9am, except Sundays."));
    let composer = AnswerComposer::new(model.clone(), 1200, 6000);
    assert_eq!(composer.compose("When do you open?", &contexts(), AnswerMode::Llm).await, "9am, except Sundays.");
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    let prompt = model.last_prompt.lock().expect("lock").clone();
    assert!(prompt.contains("We open at 9am.\n\nClosed on Sundays."));
    assert!(prompt.ends_with("Question: When do you open?\nAnswer:"));
}

#[tokio::test]
async fn failing_model_falls_back_to_simple() {
    let model = Arc::new(CannedModel::failing());
    let composer = AnswerComposer::new(model.clone(), 1200, 6000);
    let answer = composer.compose("hours?", &contexts(), AnswerMode::Llm).await;
    assert!(answer.starts_with(SIMPLE_LEAD_IN));
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn simple_mode_never_calls_model() {
    let model = Arc::new(CannedModel::ok("unused"));
    let composer = AnswerComposer::new(model.clone(), 1200, 6000);
    composer.compose("hours?", &contexts(), AnswerMode::Simple).await;
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}
