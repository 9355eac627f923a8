//! OpenAI-compatible chat-completions client shared by the vision (C2) and
//! chat (C3) roles. Modeled on the donor's `AxumLLMClient`
//! (`pagi-chat-desktop-backend/src/llm_client/mod.rs`), with the tolerant
//! response-shape handling from the donor orchestrator's
//! `extract_openrouter_content`.

use std::time::Duration;

use ambient_core::error::LlmError;
use ambient_core::LlmConfig;
use serde_json::{json, Value};
use tracing::debug;

/// Real Cerebras API endpoint used when a secondary chat deployment is
/// configured via `llm.cerebras_api_key`/`llm.cerebras_model`.
const CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai/v1";

pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            max_tokens,
            temperature,
            api_key,
        }
    }

    /// Primary (vision) endpoint, per §6.A.
    pub fn for_vision(config: &LlmConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.model,
            config.max_tokens,
            config.temperature,
            config.timeout_seconds,
            None,
        )
    }

    /// Secondary (chat) endpoint when configured, otherwise the primary
    /// (§4.3 "Deployment split": empty key → reuse primary).
    pub fn for_chat(config: &LlmConfig) -> Self {
        if config.cerebras_api_key.is_empty() {
            Self::new(
                &config.base_url,
                &config.model,
                config.max_tokens,
                config.temperature,
                config.timeout_seconds,
                None,
            )
        } else {
            Self::new(
                CEREBRAS_BASE_URL,
                &config.cerebras_model,
                config.max_tokens,
                config.temperature,
                config.timeout_seconds,
                Some(config.cerebras_api_key.clone()),
            )
        }
    }

    /// POSTs `{base_url}/chat/completions` and returns the assistant's
    /// message content, tolerant of the response-shape variants in §6.B.
    pub async fn chat_completion(&self, messages: Vec<Value>) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        extract_content(&parsed)
    }

    /// GETs `{base_url}/models`, the standard OpenAI-compatible liveness
    /// endpoint, discarding the body. Used by startup health checks.
    pub async fn health(&self) -> Result<(), LlmError> {
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));

        let mut request = self.http.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Ported from the donor's `extract_openrouter_content`: handles the
/// string-content, array-of-parts, `choices[0].text` and
/// `choices[0].delta.content` shapes, plus an error object smuggled in a
/// 200 response.
fn extract_content(response: &Value) -> Result<String, LlmError> {
    if let Some(err) = response.get("error") {
        return Err(LlmError::Status {
            status: 200,
            body: err.to_string(),
        });
    }

    let choice0 = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first());

    let choice0 = match choice0 {
        Some(c) => c,
        None => return Err(LlmError::NoChoices),
    };

    if let Some(content) = choice0.get("message").and_then(|m| m.get("content")) {
        if let Some(s) = content.as_str() {
            return Ok(s.to_string());
        }
        if let Some(parts) = content.as_array() {
            let mut out = String::new();
            for part in parts {
                if let Some(s) = part.as_str() {
                    out.push_str(s);
                } else if let Some(s) = part.get("text").and_then(|t| t.as_str()) {
                    out.push_str(s);
                } else if part.is_object() {
                    out.push_str(&part.to_string());
                }
            }
            if !out.trim().is_empty() {
                return Ok(out);
            }
        }
        if content.is_object() {
            return Ok(content.to_string());
        }
    }

    if let Some(text) = choice0.get("text").and_then(|t| t.as_str()) {
        return Ok(text.to_string());
    }

    if let Some(delta) = choice0
        .get("delta")
        .and_then(|d| d.get("content"))
        .and_then(|t| t.as_str())
    {
        debug!("using streaming delta.content shape");
        return Ok(delta.to_string());
    }

    Err(LlmError::NoChoices)
}
