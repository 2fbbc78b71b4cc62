use axum::{Json, extract::State};
use serde_json::json;
use tokio::time::{Duration, timeout};

use crate::SharedState;
use crate::error::ApiError;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    let indexed = timeout(READINESS_TIMEOUT, state.index.count())
        .await
        .map_err(|_| ApiError::ServiceUnavailable("index_ping_timeout".into()))
        .and_then(|result| {
            result.map_err(|err| {
                ApiError::ServiceUnavailable(format!("vector index unavailable: {err}"))
            })
        })?;

    Ok(Json(json!({
        "status": "ok",
        "indexed_documents": indexed,
        "embedder": state.embedder.name(),
        "application": env!("CARGO_PKG_NAME"),
    })))
}
