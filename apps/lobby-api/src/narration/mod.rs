//! Flavor-text generation.
//!
//! The lobby never depends on narration. Routes call
//! [`narrate_or_fallback`], which turns every provider failure into a marked
//! fallback line.

pub mod http;

use ashwood_common::id::{prefix, prefixed_ulid};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use http::HttpNarrator;

/// Models the upstream may be asked for.
pub const MODEL_ALLOWLIST: [&str; 4] = ["gpt-4.1-mini", "gpt-4.1", "o4-mini", "o4-mini-high"];

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NarrationRequest {
    /// Scene text or question for the narrator.
    pub prompt: String,
    /// Optional system instructions.
    pub system: Option<String>,
    /// Desired tone, e.g. `ominous` or `playful`.
    pub tone: Option<String>,
    /// Overrides the configured model; must be on the allowlist.
    pub model: Option<String>,
}

impl NarrationRequest {
    /// Single-string prompt with the system and tone folded in.
    pub fn compose(&self) -> String {
        let mut system = self.system.clone().unwrap_or_default().trim().to_string();
        if let Some(tone) = self.tone.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if !system.is_empty() {
                system.push('\n');
            }
            system.push_str(&format!("Tone: {tone}."));
        }
        let prompt = self.prompt.trim();
        if system.is_empty() {
            prompt.to_string()
        } else {
            format!("SYSTEM:\n{system}\n\nUSER:\n{prompt}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Narration {
    pub text: String,
    /// `true` when `text` is a canned line standing in for a failed call.
    pub fallback: bool,
}

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("narration is not configured")]
    Disabled,
    #[error("narration timed out")]
    Timeout,
    #[error("upstream returned status {0}")]
    Upstream(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed upstream response")]
    Malformed,
    #[error("upstream returned no text")]
    Empty,
}

#[async_trait]
pub trait NarrationProvider: Send + Sync {
    async fn narrate(&self, request: &NarrationRequest) -> Result<String, NarrationError>;
}

/// Provider used when no upstream is configured; every call falls back.
pub struct FallbackNarrator;

#[async_trait]
impl NarrationProvider for FallbackNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> Result<String, NarrationError> {
        Err(NarrationError::Disabled)
    }
}

const FALLBACK_LINES: [&str; 3] = [
    "The candles gutter, and for a moment the house keeps its secrets.",
    "A draught moves through Ashwood Hall. Whatever it carried, it is gone.",
    "The narrator's voice is lost beneath the storm. Play on.",
];

/// Canned line for `request`, stable for a given prompt.
pub fn fallback_line(request: &NarrationRequest) -> String {
    let idx = request.prompt.bytes().map(usize::from).sum::<usize>() % FALLBACK_LINES.len();
    format!("[fallback] {}", FALLBACK_LINES[idx])
}

/// Ask `provider` for text; any failure degrades to [`fallback_line`].
pub async fn narrate_or_fallback(
    provider: &dyn NarrationProvider,
    request: &NarrationRequest,
) -> Narration {
    let call_id = prefixed_ulid(prefix::NARRATION);
    tracing::debug!(%call_id, prompt_chars = request.prompt.chars().count(), "narration requested");
    match provider.narrate(request).await {
        Ok(text) => Narration {
            text,
            fallback: false,
        },
        Err(err) => {
            if !matches!(err, NarrationError::Disabled) {
                tracing::warn!(%call_id, error = %err, "narration failed, using fallback");
            }
            Narration {
                text: fallback_line(request),
                fallback: true,
            }
        }
    }
}
