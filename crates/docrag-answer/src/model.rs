//! Chat-completion models used by `llm` answer mode.
//!
//! The model is selected once at startup: with an API key available the
//! OpenAI-compatible client is used, otherwise [`NoopModel`], which reports
//! itself as unconfigured so the composer answers in simple mode.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use docrag_core::config::AnswerSettings;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;
    /// False when no backend is available; callers should not call `complete`.
    fn is_configured(&self) -> bool;
    /// Sends `prompt` as a single user message and returns the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct NoopModel;

#[async_trait]
impl ChatModel for NoopModel {
    fn name(&self) -> &str { "noop" }
    fn is_configured(&self) -> bool { false }
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("no language model configured")
    }
}

/// Any endpoint speaking the `/chat/completions` dialect.
pub struct OpenAiCompatibleModel {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiCompatibleModel {
    pub fn new(api_key: String, base_url: &str, model: String, temperature: f32, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), model, temperature, client })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleModel {
    fn name(&self) -> &str { &self.model }
    fn is_configured(&self) -> bool { true }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| anyhow!("{} connection failed ({}): {}", self.model, url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("{} API error {}: {}", self.model, status, text);
        }
        let body: Value = resp.json().await?;
        debug!(model = %self.model, "chat completion received");
        parse_chat_response(&body)
    }
}

/// Text of the first choice; a null `content` counts as an empty answer.
pub fn parse_chat_response(body: &Value) -> Result<String> {
    let choice = body["choices"].get(0).ok_or_else(|| anyhow!("No choices in response"))?;
    Ok(choice["message"]["content"].as_str().unwrap_or_default().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> { value.filter(|v| !v.trim().is_empty()) }

/// Resolution order for each field: settings, then `OPENAI_*` env, then default.
pub fn select_model(settings: &AnswerSettings) -> Result<Arc<dyn ChatModel>> {
    let api_key = non_empty(settings.api_key.clone()).or_else(|| non_empty(std::env::var("OPENAI_API_KEY").ok()));
    let Some(api_key) = api_key else {
        info!("no OPENAI_API_KEY; llm answers fall back to simple mode");
        return Ok(Arc::new(NoopModel));
    };
    let base_url = non_empty(settings.base_url.clone())
        .or_else(|| non_empty(std::env::var("OPENAI_BASE_URL").ok()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let model = non_empty(settings.model.clone())
        .or_else(|| non_empty(std::env::var("OPENAI_MODEL").ok()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    info!(model = %model, base_url = %base_url, "using OpenAI-compatible chat model");
    Ok(Arc::new(OpenAiCompatibleModel::new(
        api_key,
        &base_url,
        model,
        settings.temperature,
        Duration::from_secs(settings.timeout_secs),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "We open at 9."}}]});
        assert_eq!(parse_chat_response(&body).expect("parse"), "We open at 9.");
    }

    #[test]
    fn null_content_is_empty_and_missing_choices_is_error() {
        assert_eq!(parse_chat_response(&json!({"choices": [{"message": {"content": null}}]})).expect("parse"), "");
        assert!(parse_chat_response(&json!({"error": {"message": "bad key"}})).is_err());
    }

    #[test]
    fn explicit_key_selects_http_model() {
        let settings = AnswerSettings { api_key: Some("sk-test".into()), model: Some("tiny".into()), ..AnswerSettings::default() };
        let model = select_model(&settings).expect("select");
        assert!(model.is_configured());
        assert_eq!(model.name(), "tiny");
    }

    #[test]
    fn request_body_is_single_user_message() {
        let m = OpenAiCompatibleModel::new("k".into(), "http://localhost/v1/", "m".into(), 0.2, Duration::from_secs(1)).expect("client");
        assert_eq!(m.base_url, "http://localhost/v1");
        let body = m.request_body("hi");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["model"], "m");
    }
}
