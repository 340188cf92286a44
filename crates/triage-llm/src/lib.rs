//! Text completion: the `Completer` capability and an HTTP client for
//! OpenAI-compatible chat-completion endpoints (Groq by default).

pub mod http;

pub use http::{ClientConfig, CompletionClient};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("completion contained no choices")]
    NoChoices,
}

/// Sampling parameters for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// Prompt-in, text-out completion service.
///
/// One prompt per call: no streaming and no conversation history.
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, LlmError>;
}
