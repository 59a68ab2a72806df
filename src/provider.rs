use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::RuntimeConfig;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Model access settings. Passed into the client at construction instead of
/// living in process environment.
#[derive(Clone)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl LlmConfig {
    pub fn from_runtime(cfg: &RuntimeConfig, api_key: &str) -> Self {
        Self {
            model: cfg.model.clone(),
            api_key: api_key.trim().to_string(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            request_timeout: cfg.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

pub fn validate_model_name(model_name: &str) -> Result<()> {
    if model_name.trim().is_empty() {
        return Err(anyhow::anyhow!("model name cannot be empty"));
    }
    if model_name.chars().any(char::is_whitespace) {
        return Err(anyhow::anyhow!(
            "model '{}' is not a valid model identifier",
            model_name
        ));
    }
    Ok(())
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiChatModel {
    config: LlmConfig,
    http: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(config: LlmConfig) -> Result<Self> {
        validate_model_name(&config.model)?;
        if config.api_key.is_empty() {
            return Err(anyhow::anyhow!("OpenAI api_key is required to build the model client"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build HTTP client for the model provider")?;

        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": messages,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("model request to '{}' failed", self.endpoint()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("failed to read model provider response body")?;

        parse_completion_body(status, &body)
    }
}

/// Longest slice of a non-JSON error body echoed back in an error message.
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Turns a chat-completions HTTP response into the completion text. The status
/// is checked before the body is decoded so gateway error pages keep their code.
pub fn parse_completion_body(status: u16, body: &str) -> Result<String> {
    let payload = serde_json::from_str::<Value>(body);

    if !(200..300).contains(&status) {
        let detail = match &payload {
            Ok(payload) => provider_error_message(payload),
            Err(_) => body.trim().chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
        };
        return Err(anyhow::anyhow!(
            "model provider returned HTTP {status}: {detail}"
        ));
    }

    let payload = payload.with_context(|| {
        format!("model provider returned a non-JSON response (HTTP {status})")
    })?;
    extract_completion_text(&payload)
}

pub fn provider_error_message(payload: &Value) -> String {
    payload
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string())
}

pub fn extract_completion_text(payload: &Value) -> Result<String> {
    let text = payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("model response is missing choices[0].message.content"))?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("model did not produce textual output"));
    }
    Ok(trimmed.to_string())
}

pub fn env_present(key: &str) -> bool {
    std::env::var(key)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}
