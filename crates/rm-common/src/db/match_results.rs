use deadpool_postgres::PoolError;
use serde_json::json;
use tokio_postgres::Error as PgError;
use tokio_postgres::types::Json;
use tracing::instrument;

use crate::db::PgPool;
use crate::matching::MatchResult;

#[derive(Debug, thiserror::Error)]
pub enum MatchResultStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

/// Persist one ranking run. Duplicate (run, job, resume) triples are ignored
/// so a retried run cannot double-insert.
#[instrument(skip(pool, results))]
pub async fn insert_match_results(
    pool: &PgPool,
    run_id: &str,
    results: &[MatchResult],
) -> Result<u64, MatchResultStorageError> {
    if results.is_empty() {
        return Ok(0);
    }

    let client = pool.get().await?;
    let stmt = client
        .prepare(
            "INSERT INTO rm.match_results (
                job_id,
                resume_id,
                match_run_id,
                overall_score,
                score_breakdown,
                matching_skills,
                missing_skills,
                recommendation,
                explanation,
                engine_version
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            )
            ON CONFLICT DO NOTHING;",
        )
        .await?;

    let engine_version = env!("CARGO_PKG_VERSION");
    let mut written = 0u64;
    for result in results {
        let breakdown = score_breakdown(result);
        written += client
            .execute(
                &stmt,
                &[
                    &result.job_id,
                    &result.resume_id,
                    &run_id,
                    &result.overall_score,
                    &Json(&breakdown),
                    &Json(&result.matching_skills),
                    &Json(&result.missing_skills),
                    &result.recommendation,
                    &result.explanation,
                    &engine_version,
                ],
            )
            .await?;
    }

    Ok(written)
}

fn score_breakdown(result: &MatchResult) -> serde_json::Value {
    json!({
        "skills": result.skills_match_score,
        "experience": result.experience_match_score,
        "semantic": result.semantic_similarity_score,
    })
}
