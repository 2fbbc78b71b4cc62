pub mod memory;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DocumentKind;

pub use memory::MemoryIndex;
pub use qdrant::{QdrantConfig, QdrantIndex};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector length {got} != index dimension {expected} for id {id}")]
    DimensionMismatch {
        id: String,
        got: usize,
        expected: usize,
    },
    #[error("vector index backend error: {0}")]
    Backend(String),
}

/// Payload stored alongside each vector; enough for listings without a record
/// lookup. The full record lives in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub kind: DocumentKind,
    pub title: String,
    pub skills: Vec<String>,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// One nearest-neighbor hit. `score` follows the index's cosine convention;
/// `vector` is returned so ranking can score without re-embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub vector: Option<Vec<f32>>,
}

/// Vector store abstraction: upsert points, query k nearest, report size.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, points: Vec<IndexPoint>) -> Result<usize, IndexError>;

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>, IndexError>;

    async fn count(&self) -> Result<usize, IndexError>;
}

/// Payload preview: first 200 characters of the source text.
pub fn preview_of(text: &str) -> String {
    let mut preview: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        preview.push('…');
    }
    preview
}
