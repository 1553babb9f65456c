use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::llm::{LlmClient, LlmResponse};

const API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Messages-API adapter for the Anthropic backend.
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ScrapeError::Model(format!("http client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<LlmResponse, ScrapeError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            temperature,
            system: system_prompt.map(String::from),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending messages request");

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScrapeError::Model(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::Model(format!("response read failed: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            warn!(%status, "Model request rejected: {}", message);
            return Err(ScrapeError::Model(format!("{}: {}", status, message)));
        }

        let parsed: MessagesResponse = serde_json::from_slice(&body)
            .map_err(|e| ScrapeError::Model(format!("malformed model response: {}", e)))?;

        let text = parsed
            .content
            .iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.clone())
            .ok_or_else(|| ScrapeError::Model("response contained no text block".to_string()))?;

        Ok(LlmResponse {
            text,
            model: parsed.model,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_parses_text_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "content": [{"type": "text", "text": "<!DOCTYPE html><html></html>"}],
                    "model": "claude-3-5-sonnet-20241022"
                }"#,
            )
            .create_async()
            .await;

        let client = AnthropicClient::new("test-key".to_string(), None)
            .unwrap()
            .with_base_url(&server.url());

        let response = client.generate("prompt", Some("system"), 100, 0.1).await.unwrap();
        assert!(response.text.starts_with("<!DOCTYPE html>"));
        assert_eq!(response.model.as_deref(), Some("claude-3-5-sonnet-20241022"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"error": {"message": "invalid x-api-key"}}"#)
            .create_async()
            .await;

        let client = AnthropicClient::new("bad-key".to_string(), None)
            .unwrap()
            .with_base_url(&server.url());

        let err = client.generate("prompt", None, 100, 0.1).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Model(_)));
        assert!(err.to_string().contains("invalid x-api-key"));
    }
}
