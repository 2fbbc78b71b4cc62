use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use rm_common::api::{RankQuery, RankResponse, ScoreRequest};
use rm_common::embedding::EmbeddingSource;
use rm_common::matching::{MatchResult, MatchScorer, Ranker};
use rm_common::run_id;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

const MAX_TOP_K: usize = 100;

/// Rank indexed resumes against one job. A failure on the job side (missing
/// record, embedding outage) fails the call; per-candidate problems shrink
/// the result list instead.
pub async fn rank_candidates(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
    Query(query): Query<RankQuery>,
    _auth: AuthUser,
) -> Result<Json<RankResponse>, ApiError> {
    let job = state
        .store
        .fetch_job(&job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;

    let job_embedding = state
        .embedder
        .embed(&job.source_text, EmbeddingSource::Job)
        .await?;

    let top_k = query.top_k.clamp(1, MAX_TOP_K);
    let mut config = state.ranker_config.clone();
    if let Some(oversample) = query.oversample {
        config.oversample_factor = oversample;
    }

    let ranker = Ranker::new(
        state.index.as_ref(),
        state.store.as_ref(),
        MatchScorer::new(state.weights),
        config,
    );
    let results = ranker.rank(&job, &job_embedding, top_k).await?;

    let match_run_id = run_id::get();
    if query.persist {
        let written = state.store.record_match_run(match_run_id, &results).await?;
        info!(job_id = %job.id, written, "persisted match run snapshot");
    }

    info!(
        job_id = %job.id,
        returned = results.len(),
        top_k,
        "ranking completed"
    );

    Ok(Json(RankResponse {
        job_id: job.id,
        match_run_id: match_run_id.to_string(),
        results,
    }))
}

/// Score one explicit (job, resume) pair.
pub async fn score_pair(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<MatchResult>, ApiError> {
    let job = state
        .store
        .fetch_job(&request.job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {} not found", request.job_id)))?;

    let resume = state
        .store
        .fetch_resume(&request.resume_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("resume {} not found", request.resume_id)))?;

    let job_embedding = state
        .embedder
        .embed(&job.source_text, EmbeddingSource::Job)
        .await?;
    let resume_embedding = state
        .embedder
        .embed(&resume.source_text, EmbeddingSource::Resume)
        .await?;

    let result = MatchScorer::new(state.weights).score(
        &job,
        &resume,
        &job_embedding,
        &resume_embedding,
    )?;

    Ok(Json(result))
}
