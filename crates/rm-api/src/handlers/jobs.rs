use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use rm_common::JobRecord;
use rm_common::api::UploadJobRequest;
use rm_common::embedding::EmbeddingSource;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Process raw job-description text. Explicit request fields override
/// whatever extraction found.
pub async fn upload_job(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<UploadJobRequest>,
) -> Result<(StatusCode, Json<JobRecord>), ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }

    let fields = state.extraction.extract_job(text).await;

    // Embed up front so a broken embedding service fails the upload here
    // instead of at ranking time. Only resumes live in the vector index; the
    // job side re-embeds per ranking call.
    state.embedder.embed(text, EmbeddingSource::Job).await?;

    let mut record = fields.into_record(text);
    if let Some(title) = request.title.filter(|t| !t.trim().is_empty()) {
        record.title = title;
    }
    if request.company.is_some() {
        record.company = request.company;
    }
    if request.required_experience_years.is_some() {
        record.required_experience_years = request.required_experience_years;
    }

    state.store.insert_job(&record).await?;

    info!(job_id = %record.id, title = %record.title, "job processed and stored");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_job(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<JobRecord>, ApiError> {
    let record = state
        .store
        .fetch_job(&job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;

    Ok(Json(record))
}
