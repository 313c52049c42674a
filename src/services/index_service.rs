//! Per-section similarity index over question text.
//!
//! Collections are built offline with [`FileIndexStore::build_collection`] and
//! loaded read-only at startup. Queries embed the text with the same model the
//! collection was built with and rank entries by cosine similarity.

use crate::models::question::QuestionRecord;
use crate::services::embed_service::{EmbedService, Embedder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Inputs per embeddings request during a build; providers cap request size.
pub const EMBED_BATCH_SIZE: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Vector DB collection '{0}' not found. Please run the build script.")]
    CollectionNotFound(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index collection '{collection}' is corrupt: {reason}")]
    Corrupt { collection: String, reason: String },

    #[error("Index IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Up to `k` document texts nearest to `text`, closest first.
    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<String>, IndexError>;

    fn collections(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub slot: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexCollection {
    pub name: String,
    pub model: String,
    pub entries: Vec<IndexEntry>,
}

impl IndexCollection {
    fn nearest(&self, query: &[f32], k: usize) -> Vec<String> {
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|e| (EmbedService::cosine_sim(query, &e.embedding), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(_, e)| e.document.clone())
            .collect()
    }
}

/// Text embedded for a corpus record: section, question and any options on one line.
pub fn document_text(record: &QuestionRecord) -> String {
    let mut parts = vec![
        format!("Section: {}", record.section),
        format!("Question: {}", record.question_text),
    ];
    for (i, opt) in record.options.iter().enumerate() {
        parts.push(format!("Option {}: {}", i + 1, opt));
    }
    parts.join(" ")
}

/// Collections persisted as `<dir>/<collection>.json`.
pub struct FileIndexStore {
    collections: HashMap<String, IndexCollection>,
    embedder: Arc<dyn Embedder>,
}

impl FileIndexStore {
    pub fn from_collections(collections: Vec<IndexCollection>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            collections: collections.into_iter().map(|c| (c.name.clone(), c)).collect(),
            embedder,
        }
    }

    /// Loads every collection file under `dir`. A missing directory yields an
    /// empty store; unreadable files are skipped with a warning.
    pub async fn open(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, IndexError> {
        let mut collections = Vec::new();
        let model = embedder.model();

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "Vector DB directory not found");
                return Ok(Self::from_collections(collections, embedder));
            }
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_collection(&path).await {
                Ok(collection) => {
                    if collection.model != model {
                        tracing::warn!(
                            collection = %collection.name,
                            built_with = %collection.model,
                            querying_with = %model,
                            "Collection was built with a different embedding model"
                        );
                    }
                    collections.push(collection);
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping index collection"),
            }
        }

        let store = Self::from_collections(collections, embedder);
        let mut names = store.collections();
        names.sort();
        if names.is_empty() {
            tracing::warn!("No collections found. Please run the index build to create them.");
        } else {
            tracing::info!(count = names.len(), collections = ?names, "Loaded vector DB collections");
        }
        Ok(store)
    }

    /// Embeds `records` and upserts them by id into `<dir>/<name>.json`.
    pub async fn build_collection(
        dir: &Path,
        name: &str,
        records: &[QuestionRecord],
        embedder: &dyn Embedder,
    ) -> Result<IndexCollection, IndexError> {
        fs::create_dir_all(dir).await?;
        let path = collection_path(dir, name);

        let mut collection = match read_collection(&path).await {
            Ok(existing) => existing,
            Err(IndexError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => IndexCollection {
                name: name.to_string(),
                model: embedder.model(),
                entries: Vec::new(),
            },
            Err(e) => return Err(e),
        };
        collection.model = embedder.model();

        let documents: Vec<String> = records.iter().map(document_text).collect();
        let mut embeddings = Vec::with_capacity(documents.len());
        for batch in documents.chunks(EMBED_BATCH_SIZE) {
            let vectors = embedder
                .embed_texts(batch)
                .await
                .map_err(|e| IndexError::Embedding(e.to_string()))?;
            if vectors.len() != batch.len() {
                return Err(IndexError::Embedding(format!(
                    "{} vectors returned for {} documents",
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
        }

        for ((record, document), embedding) in records.iter().zip(documents).zip(embeddings) {
            let entry = IndexEntry {
                id: record.id.clone(),
                document,
                embedding,
                year: record.year,
                slot: record.slot,
            };
            match collection.entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => collection.entries.push(entry),
            }
        }

        let raw = serde_json::to_vec(&collection).map_err(|e| IndexError::Corrupt {
            collection: name.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, raw).await?;
        tracing::info!(collection = %name, items = collection.entries.len(), "Collection written");
        Ok(collection)
    }
}

#[async_trait]
impl SimilarityIndex for FileIndexStore {
    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<String>, IndexError> {
        let coll = self
            .collections
            .get(collection)
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;

        let mut vectors = self
            .embedder
            .embed_texts(&[text.to_string()])
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;
        let query = vectors
            .pop()
            .ok_or_else(|| IndexError::Embedding("no vector returned for query".to_string()))?;

        Ok(coll.nearest(&query, k))
    }

    fn collections(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }
}

fn collection_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

async fn read_collection(path: &Path) -> Result<IndexCollection, IndexError> {
    let raw = fs::read(path).await?;
    serde_json::from_slice(&raw).map_err(|e| IndexError::Corrupt {
        collection: path.display().to_string(),
        reason: e.to_string(),
    })
}
