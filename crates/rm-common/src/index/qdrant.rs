use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};

use super::{IndexError, IndexPoint, PointPayload, ScoredPoint, VectorIndex};

/// Qdrant-backed vector index over gRPC. Collection distance is cosine, so
/// query scores are similarities, matching the in-memory adapter.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub dimension: usize,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".into(),
            collection: "resumes".into(),
            dimension: 384,
        }
    }
}

impl QdrantConfig {
    pub fn from_env(collection_default: &str, dimension: usize) -> Self {
        Self {
            url: std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".into()),
            collection: std::env::var("QDRANT_COLLECTION")
                .unwrap_or_else(|_| collection_default.into()),
            dimension,
        }
    }
}

impl QdrantIndex {
    /// Connect and create the collection when absent. Existing collections
    /// are left untouched; records survive restarts.
    pub async fn connect(config: QdrantConfig) -> Result<Self, IndexError> {
        let client = Qdrant::from_url(&config.url)
            .build()
            .map_err(|e| IndexError::Backend(format!("client build: {e}")))?;

        let exists = client
            .collection_exists(&config.collection)
            .await
            .map_err(|e| IndexError::Backend(format!("collection_exists: {e}")))?;

        if !exists {
            client
                .create_collection(
                    CreateCollectionBuilder::new(&config.collection).vectors_config(
                        VectorParamsBuilder::new(config.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| IndexError::Backend(format!("create_collection: {e}")))?;
        }

        Ok(Self {
            client,
            collection: config.collection,
            dimension: config.dimension,
        })
    }
}

fn payload_to_qdrant(payload: &PointPayload) -> Result<Payload, IndexError> {
    serde_json::to_value(payload)
        .map_err(|e| IndexError::Backend(format!("payload serialize: {e}")))?
        .try_into()
        .map_err(|e| IndexError::Backend(format!("payload convert: {e}")))
}

fn point_id(sp: &qdrant_client::qdrant::ScoredPoint) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;

    match sp.id.as_ref().and_then(|pid| pid.point_id_options.clone()) {
        Some(PointIdOptions::Uuid(s)) => s,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn point_vector(sp: &qdrant_client::qdrant::ScoredPoint) -> Option<Vec<f32>> {
    use qdrant_client::qdrant::vectors_output::VectorsOptions;

    match sp.vectors.as_ref().and_then(|v| v.vectors_options.as_ref()) {
        Some(VectorsOptions::Vector(vector)) => Some(vector.data.clone()),
        _ => None,
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn upsert(&self, points: Vec<IndexPoint>) -> Result<usize, IndexError> {
        if points.is_empty() {
            return Ok(0);
        }

        let mut structs = Vec::with_capacity(points.len());
        for point in points {
            if point.vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    id: point.id,
                    got: point.vector.len(),
                    expected: self.dimension,
                });
            }

            let payload = payload_to_qdrant(&point.payload)?;
            structs.push(PointStruct::new(point.id, point.vector, payload));
        }

        let count = structs.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, structs))
            .await
            .map_err(|e| IndexError::Backend(format!("upsert_points: {e}")))?;

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

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector.to_vec(), k as u64)
                    .with_payload(false)
                    .with_vectors(true),
            )
            .await
            .map_err(|e| IndexError::Backend(format!("search_points: {e}")))?;

        Ok(response
            .result
            .iter()
            .map(|sp| ScoredPoint {
                id: point_id(sp),
                score: sp.score,
                vector: point_vector(sp),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| IndexError::Backend(format!("count: {e}")))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}
