use std::cmp::Ordering;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;

use super::scoring::{InvalidEmbeddingError, MatchResult, MatchScorer};
use crate::JobRecord;
use crate::embedding::{Embedding, EmbeddingSource};
use crate::index::{IndexError, VectorIndex};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Multiplier on top_k when querying the index. Vector-nearest order and
    /// overall-score order can disagree, so the shortlist is wider than the
    /// final cut. Clamped to 2..=5 at use.
    pub oversample_factor: usize,
    /// Budget per record lookup; a slow store skips that candidate only.
    pub lookup_timeout: Duration,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            oversample_factor: 3,
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

impl RankerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            oversample_factor: std::env::var("RM_OVERSAMPLE_FACTOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.oversample_factor),
            lookup_timeout: std::env::var("RM_LOOKUP_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.lookup_timeout),
        }
    }
}

/// Only the job side can fail a ranking call; per-candidate problems are
/// logged and skipped.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("vector index query failed: {0}")]
    Index(#[from] IndexError),
}

/// Stateless top-k ranking over vector-search candidates.
pub struct Ranker<'a> {
    index: &'a dyn VectorIndex,
    store: &'a dyn RecordStore,
    scorer: MatchScorer,
    config: RankerConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(
        index: &'a dyn VectorIndex,
        store: &'a dyn RecordStore,
        scorer: MatchScorer,
        config: RankerConfig,
    ) -> Self {
        Self {
            index,
            store,
            scorer,
            config,
        }
    }

    /// Rank candidates for a job. Returns at most `top_k` results; fewer when
    /// the index is small or candidates drop out, empty when everything does.
    pub async fn rank(
        &self,
        job: &JobRecord,
        job_embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<MatchResult>, RankError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let oversample = self.config.oversample_factor.clamp(2, 5);
        let index_size = self.index.count().await?;
        let fetch_k = top_k.saturating_mul(oversample).min(index_size);
        if fetch_k == 0 {
            return Ok(Vec::new());
        }

        let hits = self.index.query(&job_embedding.vector, fetch_k).await?;

        let mut results: Vec<MatchResult> = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(vector) = hit.vector.filter(|v| !v.is_empty()) else {
                let err = InvalidEmbeddingError::Missing { side: "resume" };
                warn!(resume_id = %hit.id, error = %err, "skipping candidate");
                continue;
            };

            let resume = match timeout(
                self.config.lookup_timeout,
                self.store.fetch_resume(&hit.id),
            )
            .await
            {
                Err(_) => {
                    warn!(resume_id = %hit.id, "record lookup timed out; skipping candidate");
                    continue;
                }
                Ok(Err(err)) => {
                    warn!(resume_id = %hit.id, error = %err, "record lookup failed; skipping candidate");
                    continue;
                }
                Ok(Ok(None)) => {
                    // Stale index entry: deleted after indexing. Tolerated.
                    warn!(resume_id = %hit.id, "indexed candidate has no stored record; skipping");
                    continue;
                }
                Ok(Ok(Some(resume))) => resume,
            };

            let candidate_embedding = Embedding::new(vector, EmbeddingSource::Resume);
            match self
                .scorer
                .score(job, &resume, job_embedding, &candidate_embedding)
            {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(resume_id = %resume.id, error = %err, "skipping candidate");
                }
            }
        }

        results.sort_by(compare_results);
        results.truncate(top_k);
        Ok(results)
    }
}

/// Overall score desc, then semantic similarity desc, then id asc. The id
/// tail makes repeated runs reproducible.
fn compare_results(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.overall_score
        .partial_cmp(&a.overall_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.semantic_similarity_score
                .partial_cmp(&a.semantic_similarity_score)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.resume_id.cmp(&b.resume_id))
}
