use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use super::{EmbedError, Embedding, EmbedderConfig, EmbeddingSource, TextEmbedder, preprocess_text};

/// Fixed seeds for deterministic hashing.
/// Changing either value changes every embedding; bump version() with it.
const HASH_SEED_K0: u64 = 0x6d61_7463_6865_7231;
const HASH_SEED_K1: u64 = 0x7265_7375_6d65_7631;

/// Deterministic feature-hashing embedder.
///
/// - no model download, no network
/// - O(n) in token count
/// - SipHash13 + fixed seeds keep vectors stable across Rust versions
///
/// Quality is far below a real sentence model; it exists so development and
/// tests can run the full pipeline offline.
pub struct HashEmbedder {
    config: EmbedderConfig,
}

impl HashEmbedder {
    pub fn new(config: EmbedderConfig) -> Self {
        let mut cfg = config;
        cfg.dimension = cfg.dimension.max(1);
        Self { config: cfg }
    }

    fn hash_token(&self, token: &str) -> usize {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.config.dimension
    }

    fn tokens_to_vector(&self, tokens: &[String]) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.config.dimension];

        for token in tokens {
            let idx = self.hash_token(token);
            // Sign hashing keeps the expected dot product of unrelated texts
            // near zero.
            let sign = if self.hash_token(&format!("{token}_sign")) % 2 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[idx] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}

#[async_trait]
impl TextEmbedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn version(&self) -> &str {
        "v1"
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

        let tokens = tokenize(&processed);
        Ok(Embedding::new(self.tokens_to_vector(&tokens), source))
    }
}
