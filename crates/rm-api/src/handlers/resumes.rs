use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, warn};

use rm_common::ResumeRecord;
use rm_common::api::UploadResumeRequest;
use rm_common::embedding::EmbeddingSource;
use rm_common::extraction::ResumeFields;
use rm_common::index::{IndexPoint, PointPayload, preview_of};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Process raw resume text: extract, embed, store, index.
///
/// Extraction failure degrades to default (empty) fields so the upload still
/// succeeds with predictably low scores. Embedding failure is surfaced and
/// nothing is stored or indexed.
pub async fn upload_resume(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<UploadResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRecord>), ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }

    let fields = state.extraction.extract_resume(text).await;
    if fields == ResumeFields::default() {
        warn!(
            filename = request.filename.as_deref().unwrap_or(""),
            "resume extraction produced no fields; storing with defaults"
        );
    }

    let embedding = state.embedder.embed(text, EmbeddingSource::Resume).await?;

    let record = fields.into_record(text);
    state.store.insert_resume(&record).await?;

    state
        .index
        .upsert(vec![IndexPoint {
            id: record.id.clone(),
            vector: embedding.vector,
            payload: PointPayload {
                kind: rm_common::DocumentKind::Resume,
                title: record.profile.title.clone().unwrap_or_default(),
                skills: record.skills.technical.clone(),
                preview: preview_of(text),
            },
        }])
        .await?;

    info!(resume_id = %record.id, "resume processed and indexed");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_resume(
    State(state): State<SharedState>,
    Path(resume_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<ResumeRecord>, ApiError> {
    let record = state
        .store
        .fetch_resume(&resume_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("resume {resume_id} not found")))?;

    Ok(Json(record))
}
