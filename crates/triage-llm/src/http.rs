//! HTTP completion client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Completer, CompletionParams, LlmError};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Completion client over an OpenAI-compatible chat API.
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionClient {
    pub fn new(config: ClientConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            api_key: config.api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait::async_trait]
impl Completer for CompletionClient {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, LlmError> {
        let url = self.endpoint();
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        info!(url = %url, model = %self.model, max_tokens = params.max_tokens, "requesting completion");
        debug!(prompt, "completion prompt");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let text = parse_completion(&body)?;
        debug!(reply = %text, "completion reply");
        Ok(text)
    }
}

/// Extract the first choice's text from a chat-completion response body.
fn parse_completion(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    let choice = parsed.choices.into_iter().next().ok_or(LlmError::NoChoices)?;
    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let mut config = ClientConfig::new("key");
        config.base_url = "http://localhost:8080/v1/".into();
        let client = CompletionClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn config_defaults_to_groq() {
        let config = ClientConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn request_body_shape() {
        let request = ChatRequest {
            model: "m",
            messages: [ChatMessage {
                role: "user",
                content: "Classify this",
            }],
            temperature: 0.1,
            max_tokens: 512,
        };
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Classify this");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn parses_first_choice_trimmed() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  Technical:0.9\n"}},
                {"index": 1, "message": {"role": "assistant", "content": "Billing:0.1"}}
            ]
        }"#;
        assert_eq!(parse_completion(body).unwrap(), "Technical:0.9");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let body = r#"{"choices": []}"#;
        assert!(matches!(parse_completion(body), Err(LlmError::NoChoices)));
    }

    #[test]
    fn null_content_is_empty_text() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "");
    }

    #[test]
    fn malformed_body_is_json_error() {
        assert!(matches!(parse_completion("not json"), Err(LlmError::Json(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_http_error() {
        let mut config = ClientConfig::new("key");
        config.base_url = "http://127.0.0.1:1".into();
        config.timeout = Duration::from_secs(2);
        let client = CompletionClient::new(config).unwrap();
        let result = client.complete("hi", CompletionParams::new(0.1, 16)).await;
        assert!(matches!(result, Err(LlmError::Http(_))));
    }
}
