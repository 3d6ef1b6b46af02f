use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::domain::AnswerOutcome;

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> (StatusCode, Json<AnswerOutcome>) {
    let outcome = state.answers.answer(&request.question).await;
    let status = match &outcome {
        AnswerOutcome::Success { .. } => StatusCode::OK,
        AnswerOutcome::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnswerOutcome::ProcessingError { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome))
}
