#![allow(dead_code)]

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use mockexam_backend::config::LlmConfig;
use mockexam_backend::models::exam::{ExamStructure, SectionQuota, SectionSpec};
use mockexam_backend::models::question::{QuestionRecord, QuestionType};
use mockexam_backend::services::{
    ai_service::AIService,
    corpus_service::QuestionCorpus,
    exam_service::{ExamService, SectionPacer},
    index_service::{IndexError, SimilarityIndex},
    retrieval_service::ContextRetriever,
    sampler_service::SeedSampler,
    storage_service::ExamStorage,
};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Copy, Debug)]
pub enum StubMode {
    Answer,
    ServerError,
    NotJson,
}

#[derive(Clone)]
struct StubState {
    mode: StubMode,
    requests: Arc<Mutex<Vec<JsonValue>>>,
}

pub struct StubLlm {
    pub url: String,
    pub requests: Arc<Mutex<Vec<JsonValue>>>,
}

/// Local stand-in for the chat completion endpoint.
pub async fn spawn_stub_llm(mode: StubMode) -> StubLlm {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        mode,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(stub_completion))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    StubLlm {
        url: format!("http://{}/v1/chat/completions", addr),
        requests,
    }
}

async fn stub_completion(
    State(state): State<StubState>,
    Json(body): Json<JsonValue>,
) -> axum::response::Response {
    state.requests.lock().unwrap().push(body.clone());
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default().to_string();

    match state.mode {
        StubMode::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        StubMode::NotJson => (StatusCode::OK, "<html>gateway</html>").into_response(),
        StubMode::Answer => {
            let content = if prompt.contains("\"option1\"") {
                json!({
                    "question_text": "Which word best completes the sentence?",
                    "option1": "alpha", "option2": "beta", "option3": "gamma", "option4": "delta",
                    "answer": "gamma",
                    "explanation": "Only gamma fits the tone."
                })
            } else {
                json!({
                    "question_text": "How many arrangements are possible?",
                    "answer": 24,
                    "explanation": "4! = 24."
                })
            };
            Json(json!({
                "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
            }))
            .into_response()
        }
    }
}

pub struct StaticIndex;

#[async_trait]
impl SimilarityIndex for StaticIndex {
    async fn query(&self, collection: &str, _text: &str, k: usize) -> Result<Vec<String>, IndexError> {
        if collection.starts_with("missing") {
            return Err(IndexError::CollectionNotFound(collection.to_string()));
        }
        Ok((0..k).map(|i| format!("Section: X Question: exemplar {}", i)).collect())
    }

    fn collections(&self) -> Vec<String> {
        vec!["cat_varc_all_years_combined".to_string()]
    }
}

/// Static exemplars that also counts how often it was queried.
#[derive(Default)]
pub struct CountingIndex {
    pub queries: AtomicUsize,
}

#[async_trait]
impl SimilarityIndex for CountingIndex {
    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<String>, IndexError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        StaticIndex.query(collection, text, k).await
    }

    fn collections(&self) -> Vec<String> {
        StaticIndex.collections()
    }
}

#[derive(Default)]
pub struct RecordingPacer {
    pub pauses: Mutex<Vec<(String, Duration)>>,
}

#[async_trait]
impl SectionPacer for RecordingPacer {
    async fn pause(&self, after_section: &str, delay: Duration) {
        self.pauses
            .lock()
            .unwrap()
            .push((after_section.to_string(), delay));
    }
}

pub fn record(id: &str, section: &str, options: usize) -> QuestionRecord {
    QuestionRecord {
        id: id.to_string(),
        exam: "CAT".to_string(),
        section: section.to_string(),
        stream: None,
        year: Some(2023),
        slot: Some(1),
        question_text: format!("Prior question {}", id),
        passage_context: None,
        options: (1..=options).map(|i| format!("option {}", i)).collect(),
        answer: Some("1".to_string()),
    }
}

pub fn corpus(sections: Vec<(&str, Vec<QuestionRecord>)>) -> Arc<QuestionCorpus> {
    let map: HashMap<String, Vec<QuestionRecord>> = sections
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    Arc::new(QuestionCorpus::from_sections("CAT", map))
}

pub fn structure(sections: Vec<(&str, &str, Vec<(QuestionType, usize)>)>) -> ExamStructure {
    ExamStructure {
        exam: "CAT".to_string(),
        sections: sections
            .into_iter()
            .map(|(key, label, quotas)| SectionQuota {
                section: SectionSpec::new("CAT", key, label),
                quotas,
            })
            .collect(),
    }
}

pub fn exam_service(
    corpus: Arc<QuestionCorpus>,
    llm_url: &str,
    api_key: Option<&str>,
    storage_dir: &Path,
    exam: ExamStructure,
    pacer: Arc<RecordingPacer>,
) -> ExamService {
    exam_service_with_index(
        corpus,
        llm_url,
        api_key,
        storage_dir,
        exam,
        pacer,
        Arc::new(StaticIndex),
    )
}

pub fn exam_service_with_index(
    corpus: Arc<QuestionCorpus>,
    llm_url: &str,
    api_key: Option<&str>,
    storage_dir: &Path,
    exam: ExamStructure,
    pacer: Arc<RecordingPacer>,
    index: Arc<dyn SimilarityIndex>,
) -> ExamService {
    let ai = AIService::new(
        LlmConfig {
            api_key: api_key.map(str::to_string),
            api_url: llm_url.to_string(),
            timeout_secs: 10,
            ..LlmConfig::default()
        },
        reqwest::Client::new(),
    );
    ExamService::new(
        SeedSampler::new(corpus),
        ContextRetriever::new(index),
        ai,
        ExamStorage::new(storage_dir),
    )
    .with_exams(vec![exam])
    .with_pacer(pacer)
    .with_cooldown(Duration::from_secs(60))
}
