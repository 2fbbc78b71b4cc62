use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{IndexError, IndexPoint, PointPayload, ScoredPoint, VectorIndex};
use crate::embedding::cosine_similarity;

/// Brute-force in-memory index for tests and offline development.
/// Same upsert/query semantics as the Qdrant adapter, including the
/// dimension check.
pub struct MemoryIndex {
    dimension: usize,
    points: RwLock<HashMap<String, (Vec<f32>, PointPayload)>>,
}

impl MemoryIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, points: Vec<IndexPoint>) -> Result<usize, IndexError> {
        for point in &points {
            if point.vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    id: point.id.clone(),
                    got: point.vector.len(),
                    expected: self.dimension,
                });
            }
        }

        let mut guard = self.points.write().await;
        let count = points.len();
        for point in points {
            guard.insert(point.id, (point.vector, point.payload));
        }
        Ok(count)
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                id: "<query>".into(),
                got: vector.len(),
                expected: self.dimension,
            });
        }

        let guard = self.points.read().await;
        let mut hits: Vec<ScoredPoint> = guard
            .iter()
            .map(|(id, (stored, _))| ScoredPoint {
                id: id.clone(),
                score: cosine_similarity(vector, stored),
                vector: Some(stored.clone()),
            })
            .collect();

        // Ties break on id so repeated queries return a stable order.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.points.read().await.len())
    }
}
