pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::models::catalog::supported_exams;
use crate::services::{
    ai_service::AIService, corpus_service::QuestionCorpus, embed_service::EmbedService,
    exam_service::ExamService, index_service::{FileIndexStore, SimilarityIndex},
    retrieval_service::ContextRetriever, sampler_service::SeedSampler,
    storage_service::ExamStorage,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide services, built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<QuestionCorpus>,
    pub index: Arc<dyn SimilarityIndex>,
    pub exam_service: ExamService,
    pub exam_timeout: Duration,
}

impl AppState {
    pub async fn init(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()?;

        let exams = supported_exams();
        let corpus = Arc::new(QuestionCorpus::load(&config.questions_dir, &exams).await);

        let embedder = Arc::new(EmbedService::new(&config.embeddings, http_client.clone()));
        let index: Arc<dyn SimilarityIndex> =
            Arc::new(FileIndexStore::open(&config.vector_db_dir, embedder).await.map_err(|e| {
                crate::error::Error::Internal(format!("Could not open vector DB: {}", e))
            })?);

        let ai_service = AIService::new(config.llm.clone(), http_client);
        let exam_service = ExamService::new(
            SeedSampler::new(corpus.clone()),
            ContextRetriever::new(index.clone()),
            ai_service,
            ExamStorage::new(config.generated_exams_dir.clone()),
        )
        .with_exams(exams)
        .with_cooldown(Duration::from_secs(config.section_cooldown_secs))
        .with_max_concurrent_tasks(config.max_concurrent_tasks);

        Ok(Self::from_parts(
            corpus,
            index,
            exam_service,
            Duration::from_secs(config.exam_timeout_secs),
        ))
    }

    pub fn from_parts(
        corpus: Arc<QuestionCorpus>,
        index: Arc<dyn SimilarityIndex>,
        exam_service: ExamService,
        exam_timeout: Duration,
    ) -> Self {
        Self {
            corpus,
            index,
            exam_service,
            exam_timeout,
        }
    }
}
