use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::exam_dto::{GenerateExamPayload, SupportedExam},
    error::{Error, Result},
    AppState,
};

#[axum::debug_handler]
pub async fn list_supported_exams(State(state): State<AppState>) -> impl IntoResponse {
    let exams: Vec<SupportedExam> = state
        .exam_service
        .exams()
        .iter()
        .map(SupportedExam::from)
        .collect();
    Json(exams)
}

#[axum::debug_handler]
pub async fn generate_exam(
    State(state): State<AppState>,
    Json(payload): Json<GenerateExamPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let exam_name = payload.exam_name.trim();

    tracing::info!(exam = %exam_name, stream = ?payload.stream, year = ?payload.year, "Exam generation requested");

    let generation = state
        .exam_service
        .generate_full_exam(exam_name, payload.stream.as_deref(), payload.year);

    match tokio::time::timeout(state.exam_timeout, generation).await {
        Ok(Ok(exam)) => Ok(Json(exam)),
        Ok(Err(e)) => Err(e),
        Err(_) => {
            tracing::warn!(exam = %exam_name, "Exam generation timed out");
            Err(Error::Timeout("Exam generation did not finish in time".to_string()))
        }
    }
}
