//! Chat-completion clients.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::openai::{build_client, endpoint, error_detail};
use crate::error::CompletionError;
use crate::models::OpenAiConfig;

/// Generates a reply for a single-turn prompt.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion model backed by the OpenAI `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCompletion {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompletion {
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let client = build_client(config.timeout_secs)
            .map_err(|e| CompletionError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.completion_model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[async_trait]
impl CompletionModel for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "requesting completion");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "completion request failed");
                if e.is_timeout() {
                    CompletionError::Timeout
                } else if e.is_connect() {
                    CompletionError::ConnectionError(e.to_string())
                } else {
                    CompletionError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "completion API error");
            return Err(CompletionError::ServerError(format!(
                "status {}: {}",
                status,
                error_detail(body)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("no completion choices".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_model() {
        let config = OpenAiConfig {
            completion_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            ..Default::default()
        };
        let completion = OpenAiCompletion::new(&config, "sk-test").unwrap();
        assert_eq!(completion.model(), "gpt-4o-mini");
        assert!((completion.temperature() - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"What would happen if you were?"},"finish_reason":"stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("What would happen if you were?")
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let config = OpenAiConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            timeout_secs: 5,
            ..Default::default()
        };
        let completion = OpenAiCompletion::new(&config, "sk-test").unwrap();
        assert!(completion.complete("hi").await.is_err());
    }
}
