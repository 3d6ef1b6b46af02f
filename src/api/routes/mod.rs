pub mod embeddings;
pub mod health;
pub mod questions;

use axum::http::{header, Method};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{middleware::request_logger, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", api_v1_routes())
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/embeddings/reconcile", post(embeddings::reconcile))
        .route("/embeddings/status", get(embeddings::status))
        .route("/embeddings/cache", delete(embeddings::clear))
        .route("/questions", post(questions::ask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::application::{
        AnswerOrchestrator, EmbeddingManager, RetrievalSettings, RetryPolicy,
    };
    use crate::domain::{Document, DocumentCorpus};
    use crate::infrastructure::{AppConfig, LinearRetriever, VectorCache};
    use crate::testing::{Failure, FakeEmbedding, FakeGeneration, FAKE_DIMENSION, FAKE_MODEL};

    fn app(dir: &tempfile::TempDir, generation: FakeGeneration) -> Router {
        let corpus: DocumentCorpus = [
            ("refunds", "Refunds take five business days."),
            ("hours", "The office opens at 9am on weekdays."),
        ]
        .into_iter()
        .map(|(id, text)| Document::new(id, text).unwrap())
        .collect();
        let corpus = Arc::new(corpus);

        let embedding = Arc::new(FakeEmbedding::new());
        let cache = Arc::new(VectorCache::empty(
            VectorCache::path_for(dir.path(), FAKE_MODEL),
            FAKE_MODEL,
            FAKE_DIMENSION,
        ));
        let retry = RetryPolicy::new(2).with_base_delay(Duration::from_millis(1));

        let embeddings = Arc::new(EmbeddingManager::new(
            embedding.clone(),
            cache.clone(),
            retry.clone(),
            10,
        ));
        let answers = Arc::new(
            AnswerOrchestrator::new(
                embedding,
                Arc::new(generation),
                Arc::new(LinearRetriever),
                cache,
                corpus.clone(),
            )
            .with_retry(retry)
            .with_retrieval(RetrievalSettings {
                max_results: 5,
                min_similarity: 0.0,
            }),
        );

        create_router(AppState::new(
            embeddings,
            answers,
            corpus,
            AppConfig::default(),
        ))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, FakeGeneration::new());

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_reconcile_then_status_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, FakeGeneration::new());

        let (status, _) = send(&app, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, report) = send(&app, "POST", "/api/v1/embeddings/reconcile", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["embedded_count"], 2);

        let (_, report) = send(
            &app,
            "POST",
            "/api/v1/embeddings/reconcile",
            Some(json!({ "force_regenerate": false })),
        )
        .await;
        assert_eq!(report["embedded_count"], 0);
        assert_eq!(report["reused_count"], 2);

        let (status, _) = send(&app, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, cache) = send(&app, "GET", "/api/v1/embeddings/status", None).await;
        assert_eq!(cache["exists"], true);
        assert_eq!(cache["entry_count"], 2);
        assert_eq!(cache["model_name"], FAKE_MODEL);

        let (status, cache) = send(&app, "DELETE", "/api/v1/embeddings/cache", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache["exists"], false);
        assert_eq!(cache["entry_count"], 0);
    }

    #[tokio::test]
    async fn test_question_outcomes_map_to_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, FakeGeneration::new());
        send(&app, "POST", "/api/v1/embeddings/reconcile", None).await;

        let too_short = json!({ "question": "hi" });
        let (status, body) = send(&app, "POST", "/api/v1/questions", Some(too_short)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "validation_error");

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/questions",
            Some(json!({ "question": "How long do refunds take?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["retrieved_count"], 2);
        assert_eq!(body["sources"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, FakeGeneration::new().failing(Failure::Permanent));

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/questions",
            Some(json!({ "question": "How long do refunds take?" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "processing_error");
    }
}
