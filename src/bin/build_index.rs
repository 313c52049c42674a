//! Offline build of the per-section similarity collections from the structured corpus.

use mockexam_backend::{
    config::{get_config, init_config},
    models::catalog::supported_exams,
    services::{
        corpus_service::QuestionCorpus, embed_service::EmbedService,
        index_service::FileIndexStore,
    },
};
use reqwest::Client;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    init_config()?;
    let config = get_config();

    let client = Client::builder().timeout(Duration::from_secs(300)).build()?;
    let embedder = EmbedService::new(&config.embeddings, client);

    let exams = supported_exams();
    let corpus = QuestionCorpus::load(&config.questions_dir, &exams).await;

    for exam in &exams {
        for quota in &exam.sections {
            let records = corpus.records_for(&exam.exam, &quota.section.key);
            if records.is_empty() {
                tracing::warn!(section = %quota.section.label, "No questions found, skipping");
                continue;
            }
            info!(
                collection = %quota.section.collection,
                documents = records.len(),
                "Embedding section"
            );
            FileIndexStore::build_collection(
                &config.vector_db_dir,
                &quota.section.collection,
                records,
                &embedder,
            )
            .await?;
        }
    }

    info!(dir = %config.vector_db_dir.display(), "Vector database build complete");
    Ok(())
}
