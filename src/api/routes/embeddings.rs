use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::{CacheStatus, ReconcileReport};

#[derive(Debug, Default, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub force_regenerate: bool,
}

pub async fn reconcile(
    State(state): State<AppState>,
    body: Option<Json<ReconcileRequest>>,
) -> Result<Json<ReconcileReport>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let report = state
        .embeddings
        .reconcile(&state.corpus, request.force_regenerate)
        .await?;
    Ok(Json(report))
}

pub async fn status(State(state): State<AppState>) -> Json<CacheStatus> {
    Json(state.embeddings.cache_status().await)
}

pub async fn clear(State(state): State<AppState>) -> Result<Json<CacheStatus>, ApiError> {
    state.embeddings.clear_cache().await?;
    Ok(Json(state.embeddings.cache_status().await))
}
