//! Embedding clients for turning text into vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::openai::{build_client, endpoint, error_detail};
use crate::error::EmbeddingError;
use crate::models::OpenAiConfig;

/// Produces embedding vectors for documents and queries.
///
/// The same model must embed both sides for similarity scores to be meaningful.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts, one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Name of the embedding model.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by the OpenAI `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self, EmbeddingError> {
        let client = build_client(config.timeout_secs)
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            batch_size: (config.batch_size as usize).max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "embeddings"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "embedding API error");
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status,
                error_detail(body)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        parse_embeddings(&body, texts.len())
    }
}

/// Decode an `/embeddings` response body into vectors in input order.
fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

    if parsed.data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            parsed.data.len()
        )));
    }

    parsed.data.sort_by_key(|d| d.index);
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            all_embeddings.extend(self.embed_single_batch(batch).await?);
        }

        Ok(all_embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_single_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> OpenAiConfig {
        OpenAiConfig {
            base_url: "http://127.0.0.1:9/v1/".to_string(),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let embedder = OpenAiEmbedder::new(&unreachable_config(), "sk-test").unwrap();
        assert_eq!(embedder.base_url(), "http://127.0.0.1:9/v1");
        assert_eq!(embedder.model(), "text-embedding-3-small");
    }

    #[test]
    fn test_response_parsing_restores_input_order() {
        let body = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[0.0,1.0]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0]}
        ],"model":"text-embedding-3-small"}"#;
        let vectors = parse_embeddings(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_response_parsing_rejects_wrong_count() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0]}]}"#;
        let err = parse_embeddings(body, 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
        assert!(err.to_string().contains("expected 2 embeddings, got 1"));

        let err = parse_embeddings("not json", 1).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let embedder = OpenAiEmbedder::new(&unreachable_config(), "sk-test").unwrap();
        let vectors = embedder.embed_documents(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let embedder = OpenAiEmbedder::new(&unreachable_config(), "sk-test").unwrap();
        let result = embedder.embed_query("I am not good enough").await;
        assert!(result.is_err());
    }
}
