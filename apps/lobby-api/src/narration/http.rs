//! Narration over an OpenAI-compatible `/v1/responses` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{NarrationError, NarrationProvider, NarrationRequest};
use crate::config::NarrationConfig;

/// Upper bound on generated text per call.
const MAX_OUTPUT_TOKENS: u32 = 300;

#[derive(Clone)]
pub struct HttpNarrator {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl HttpNarrator {
    /// Fails if the HTTP client cannot be built with the given timeout.
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, NarrationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NarrationError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            http,
        })
    }

    /// Build from config; `Ok(None)` when no API key is set.
    pub fn from_config(config: &NarrationConfig) -> Result<Option<Self>, NarrationError> {
        let Some(api_key) = config.api_key.as_deref() else {
            return Ok(None);
        };
        Self::new(&config.base_url, api_key, &config.model, config.timeout).map(Some)
    }
}

#[async_trait]
impl NarrationProvider for HttpNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<String, NarrationError> {
        let url = format!("{}/v1/responses", self.base_url);
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = serde_json::json!({
            "model": model,
            "input": request.compose(),
            "max_output_tokens": MAX_OUTPUT_TOKENS,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NarrationError::Timeout
                } else {
                    NarrationError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NarrationError::Upstream(status.as_u16()));
        }

        let value: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                NarrationError::Timeout
            } else {
                NarrationError::Malformed
            }
        })?;
        extract_output_text(&value)
    }
}

/// Pull generated text out of a responses-API body. Accepts the flattened
/// `output_text` field or the nested `output[].content[].text` form.
pub fn extract_output_text(body: &Value) -> Result<String, NarrationError> {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return non_empty(text);
    }

    let output = body
        .get("output")
        .and_then(Value::as_array)
        .ok_or(NarrationError::Malformed)?;
    let text: String = output
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    non_empty(&text)
}

fn non_empty(text: &str) -> Result<String, NarrationError> {
    let text = text.trim();
    if text.is_empty() {
        Err(NarrationError::Empty)
    } else {
        Ok(text.to_string())
    }
}
