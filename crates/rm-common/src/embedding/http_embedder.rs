use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{EmbedError, Embedding, EmbedderConfig, EmbeddingSource, TextEmbedder, preprocess_text};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedder backed by an Ollama-compatible `/api/embeddings` endpoint.
pub struct HttpEmbedder {
    config: EmbedderConfig,
    client: reqwest::Client,
}

impl HttpEmbedder {
    pub fn new(config: EmbedderConfig) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::Http(format!("http client build: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    fn name(&self) -> &'static str {
        "http"
    }

    fn version(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(
        &self,
        text: &str,
        source: EmbeddingSource,
    ) -> Result<Embedding, EmbedError> {
        let processed = preprocess_text(text);
        if processed.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let url = format!("{}/api/embeddings", self.config.endpoint);
        let request = EmbedRequest {
            model: &self.config.model,
            prompt: &processed,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbedError::Http(format!("POST {url}: {e}")))?;

        if response.status() != StatusCode::OK {
            let code = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".into());
            return Err(EmbedError::Http(format!(
                "embeddings endpoint returned {code}; body: {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Http(format!("parse embeddings json: {e}")))?;

        if parsed.embedding.len() != self.config.dimension {
            return Err(EmbedError::DimensionMismatch {
                got: parsed.embedding.len(),
                expected: self.config.dimension,
                model: self.config.model.clone(),
            });
        }

        // Model output is not guaranteed unit-length; the scoring convention
        // requires it.
        let mut vector = parsed.embedding;
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(Embedding::new(vector, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_without_connecting() {
        let embedder = HttpEmbedder::new(EmbedderConfig::default());
        assert!(embedder.is_ok());
        let embedder = embedder.unwrap();
        assert_eq!(embedder.name(), "http");
        assert_eq!(embedder.dimension(), 384);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_request() {
        let embedder = HttpEmbedder::new(EmbedderConfig::default()).unwrap();
        let err = embedder.embed("", EmbeddingSource::Query).await;
        assert!(matches!(err, Err(EmbedError::EmptyInput)));
    }
}
