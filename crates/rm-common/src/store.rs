use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::matching::MatchResult;
use crate::{JobRecord, ResumeRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store backend error: {0}")]
    Backend(String),
}

/// Full-record storage behind the vector index. The index answers "which
/// ids are near this vector"; this store answers "what is record X".
///
/// Implementations: `db::PgStore` (production), `MemoryStore` (tests/dev).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_resume(&self, resume: &ResumeRecord) -> Result<(), StoreError>;

    async fn insert_job(&self, job: &JobRecord) -> Result<(), StoreError>;

    async fn fetch_resume(&self, id: &str) -> Result<Option<ResumeRecord>, StoreError>;

    async fn fetch_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Persist one ranking run's results as a snapshot. Match results are
    /// never written implicitly; only this call stores them.
    async fn record_match_run(
        &self,
        run_id: &str,
        results: &[MatchResult],
    ) -> Result<u64, StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    resumes: RwLock<HashMap<String, ResumeRecord>>,
    jobs: RwLock<HashMap<String, JobRecord>>,
    match_runs: RwLock<Vec<(String, MatchResult)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a resume without touching the index; used to exercise the
    /// stale-index path in tests.
    pub async fn remove_resume(&self, id: &str) {
        self.resumes.write().await.remove(id);
    }

    pub async fn match_run_len(&self) -> usize {
        self.match_runs.read().await.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_resume(&self, resume: &ResumeRecord) -> Result<(), StoreError> {
        self.resumes
            .write()
            .await
            .insert(resume.id.clone(), resume.clone());
        Ok(())
    }

    async fn insert_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn fetch_resume(&self, id: &str) -> Result<Option<ResumeRecord>, StoreError> {
        Ok(self.resumes.read().await.get(id).cloned())
    }

    async fn fetch_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn record_match_run(
        &self,
        run_id: &str,
        results: &[MatchResult],
    ) -> Result<u64, StoreError> {
        let mut guard = self.match_runs.write().await;
        for result in results {
            guard.push((run_id.to_string(), result.clone()));
        }
        Ok(results.len() as u64)
    }
}
