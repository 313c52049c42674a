use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut collections = state.index.collections();
    collections.sort();
    let corpus: serde_json::Map<String, serde_json::Value> = state
        .corpus
        .exams()
        .map(|exam| {
            let sections: serde_json::Map<String, serde_json::Value> = state
                .corpus
                .section_keys(exam)
                .map(|key| (key.to_string(), json!(state.corpus.records_for(exam, key).len())))
                .collect();
            (exam.to_string(), serde_json::Value::Object(sections))
        })
        .collect();
    let body = json!({
        "status": "ok",
        "corpus": corpus,
        "collections": collections,
    });
    (StatusCode::OK, Json(body))
}
