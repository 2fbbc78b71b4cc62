pub mod match_results;
pub mod migrations;
pub mod pool;
pub mod records;
pub mod schema;

use async_trait::async_trait;

use crate::matching::MatchResult;
use crate::store::{RecordStore, StoreError};
use crate::{JobRecord, ResumeRecord};

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use match_results::{MatchResultStorageError, insert_match_results};
pub use migrations::run_migrations;
pub use pool::{DbPoolError, PgPool, create_pool_from_url};
pub use records::{RecordStorageError, fetch_job, fetch_resume, insert_job, insert_resume};

/// Postgres-backed record store; the production implementation behind the
/// ranker and the API handlers.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_resume(&self, resume: &ResumeRecord) -> Result<(), StoreError> {
        records::insert_resume(&self.pool, resume)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn insert_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        records::insert_job(&self.pool, job)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn fetch_resume(&self, id: &str) -> Result<Option<ResumeRecord>, StoreError> {
        records::fetch_resume(&self.pool, id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn fetch_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        records::fetch_job(&self.pool, id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn record_match_run(
        &self,
        run_id: &str,
        results: &[MatchResult],
    ) -> Result<u64, StoreError> {
        insert_match_results(&self.pool, run_id, results)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
