use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::types::Json;
use tracing::instrument;

use crate::db::PgPool;
use crate::extraction::content_hash;
use crate::{JobRecord, ResumeRecord};

#[derive(Debug, thiserror::Error)]
pub enum RecordStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to (de)serialize record: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Insert or replace a resume. Reprocessing the same source text under a new
/// id leaves the old row until the caller deletes it; same-id upserts replace
/// the whole record.
#[instrument(skip(pool, resume))]
pub async fn insert_resume(pool: &PgPool, resume: &ResumeRecord) -> Result<u64, RecordStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare(
            "INSERT INTO rm.resumes (id, record, content_hash, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE
                SET record = EXCLUDED.record,
                    content_hash = EXCLUDED.content_hash",
        )
        .await?;

    let record = serde_json::to_value(resume)?;
    let rows = client
        .execute(
            &stmt,
            &[
                &resume.id,
                &Json(&record),
                &content_hash(&resume.source_text),
                &resume.created_at,
            ],
        )
        .await?;
    Ok(rows)
}

#[instrument(skip(pool))]
pub async fn fetch_resume(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ResumeRecord>, RecordStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare("SELECT record FROM rm.resumes WHERE id = $1")
        .await?;

    let row = client.query_opt(&stmt, &[&id]).await?;
    match row {
        Some(row) => {
            let Json(value): Json<serde_json::Value> = row.get("record");
            Ok(Some(serde_json::from_value(value)?))
        }
        None => Ok(None),
    }
}

#[instrument(skip(pool, job))]
pub async fn insert_job(pool: &PgPool, job: &JobRecord) -> Result<u64, RecordStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare(
            "INSERT INTO rm.jobs (id, record, content_hash, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE
                SET record = EXCLUDED.record,
                    content_hash = EXCLUDED.content_hash",
        )
        .await?;

    let record = serde_json::to_value(job)?;
    let rows = client
        .execute(
            &stmt,
            &[
                &job.id,
                &Json(&record),
                &content_hash(&job.source_text),
                &job.created_at,
            ],
        )
        .await?;
    Ok(rows)
}

#[instrument(skip(pool))]
pub async fn fetch_job(pool: &PgPool, id: &str) -> Result<Option<JobRecord>, RecordStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare("SELECT record FROM rm.jobs WHERE id = $1")
        .await?;

    let row = client.query_opt(&stmt, &[&id]).await?;
    match row {
        Some(row) => {
            let Json(value): Json<serde_json::Value> = row.get("record");
            Ok(Some(serde_json::from_value(value)?))
        }
        None => Ok(None),
    }
}
