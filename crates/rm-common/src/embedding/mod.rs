pub mod hash_embedder;
pub mod http_embedder;
pub mod similarity;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use hash_embedder::HashEmbedder;
pub use http_embedder::HttpEmbedder;
pub use similarity::cosine_similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingSource {
    Resume,
    Job,
    Query,
}

/// A fixed-length vector for one document. Dimensionality is a deployment
/// constant; changing the embedding model invalidates every stored vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub source: EmbeddingSource,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, source: EmbeddingSource) -> Self {
        Self {
            vector,
            source,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("cannot embed empty text")]
    EmptyInput,
    #[error("embedding request failed: {0}")]
    Http(String),
    #[error("embedding dimension {got} != expected {expected} (model: {model})")]
    DimensionMismatch {
        got: usize,
        expected: usize,
        model: String,
    },
}

/// Abstract embedding backend.
///
/// Implementations:
/// - HttpEmbedder: remote model server (the production path)
/// - HashEmbedder: deterministic feature hashing (dev/test fallback)
///
/// Every implementation L2-normalizes its output; downstream cosine scores
/// rely on that.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Implementation name ("http", "hash").
    fn name(&self) -> &'static str;

    /// Version tag for model generation tracking.
    fn version(&self) -> &str;

    /// Output dimensionality; constant for the embedder's lifetime.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str, source: EmbeddingSource)
    -> Result<Embedding, EmbedError>;
}

#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub dimension: usize,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            endpoint: "http://localhost:11434".into(),
            model: "all-minilm".into(),
            timeout_secs: 60,
        }
    }
}

/// Read embedder settings from the environment.
pub fn load_config_from_env() -> EmbedderConfig {
    let defaults = EmbedderConfig::default();
    EmbedderConfig {
        dimension: std::env::var("EMBEDDING_DIM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.dimension),
        endpoint: std::env::var("EMBEDDING_ENDPOINT").unwrap_or(defaults.endpoint),
        model: std::env::var("EMBEDDING_MODEL").unwrap_or(defaults.model),
        timeout_secs: std::env::var("EMBEDDING_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.timeout_secs),
    }
}

/// Embedder factory. Unknown names and HTTP client construction failures fall
/// back to the hash embedder so the pipeline stays usable offline.
pub fn create_embedder(name: &str, config: EmbedderConfig) -> Arc<dyn TextEmbedder> {
    match name {
        "http" => match HttpEmbedder::new(config.clone()) {
            Ok(embedder) => Arc::new(embedder),
            Err(err) => {
                tracing::warn!(error = %err, "http embedder unavailable; falling back to hash");
                Arc::new(HashEmbedder::new(config))
            }
        },
        _ => Arc::new(HashEmbedder::new(config)),
    }
}

/// Collapse whitespace and cap length before sending text to a model.
pub(crate) fn preprocess_text(text: &str) -> String {
    const MAX_TOKENS: usize = 512;

    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() > MAX_TOKENS {
        tokens.truncate(MAX_TOKENS);
    }
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_collapses_whitespace() {
        assert_eq!(preprocess_text("  a \n b\t c "), "a b c");
    }

    #[test]
    fn preprocess_caps_token_count() {
        let long = "word ".repeat(1000);
        let processed = preprocess_text(&long);
        assert_eq!(processed.split_whitespace().count(), 512);
    }

    #[test]
    fn factory_defaults_to_hash() {
        let embedder = create_embedder("unknown", EmbedderConfig::default());
        assert_eq!(embedder.name(), "hash");
        assert_eq!(embedder.dimension(), 384);
    }
}
