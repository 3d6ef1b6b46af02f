use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub documents: usize,
    pub cached_embeddings: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Ready once every corpus document has a cached embedding.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let cache = state.embeddings.cache();
    let missing = state
        .corpus
        .unique_documents()
        .filter(|doc| !cache.is_fresh(doc))
        .count();

    let response = ReadinessResponse {
        status: if missing == 0 { "ready" } else { "not_ready" }.into(),
        documents: state.corpus.len(),
        cached_embeddings: cache.len(),
    };

    let status = if missing == 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
