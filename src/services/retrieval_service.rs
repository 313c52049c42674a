use crate::models::exam::{GenerationError, SectionSpec};
use crate::models::question::QuestionRecord;
use crate::services::index_service::{IndexError, SimilarityIndex};
use std::sync::Arc;

pub const DEFAULT_EXEMPLARS: usize = 3;

/// Fetches stylistically similar prior questions to show the model as exemplars.
#[derive(Clone)]
pub struct ContextRetriever {
    index: Arc<dyn SimilarityIndex>,
    k: usize,
}

impl ContextRetriever {
    pub fn new(index: Arc<dyn SimilarityIndex>) -> Self {
        Self {
            index,
            k: DEFAULT_EXEMPLARS,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    pub async fn retrieve(
        &self,
        section: &SectionSpec,
        seed: &QuestionRecord,
    ) -> Result<Vec<String>, GenerationError> {
        match self.index.query(&section.collection, &seed.question_text, self.k).await {
            Ok(docs) => Ok(docs),
            Err(e @ IndexError::CollectionNotFound(_)) => Err(GenerationError::new(e.to_string())),
            Err(e) => {
                tracing::warn!(collection = %section.collection, seed = %seed.id, error = %e, "Similarity search failed");
                Err(GenerationError::new(format!("An exception occurred: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Reply {
        Docs,
        Missing,
        EmbeddingDown,
    }

    struct RecordingIndex {
        calls: Mutex<Vec<(String, String, usize)>>,
        reply: Reply,
    }

    impl RecordingIndex {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(vec![]),
                reply,
            })
        }
    }

    #[async_trait]
    impl SimilarityIndex for RecordingIndex {
        async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<String>, IndexError> {
            self.calls
                .lock()
                .unwrap()
                .push((collection.to_string(), text.to_string(), k));
            match self.reply {
                Reply::Docs => Ok((0..k).map(|i| format!("example {}", i)).collect()),
                Reply::Missing => Err(IndexError::CollectionNotFound(collection.to_string())),
                Reply::EmbeddingDown => Err(IndexError::Embedding("connection refused".into())),
            }
        }

        fn collections(&self) -> Vec<String> {
            vec![]
        }
    }

    fn seed() -> QuestionRecord {
        QuestionRecord {
            id: "cat_2023_s1_varc_004".into(),
            exam: "CAT".into(),
            section: "VARC".into(),
            stream: None,
            year: Some(2023),
            slot: Some(1),
            question_text: "The author implies that".into(),
            passage_context: None,
            options: vec!["a".into()],
            answer: None,
        }
    }

    #[tokio::test]
    async fn queries_section_collection_with_seed_text() {
        let index = RecordingIndex::new(Reply::Docs);
        let retriever = ContextRetriever::new(index.clone());
        let section = SectionSpec::new("CAT", "varc", "VARC");

        let docs = retriever.retrieve(&section, &seed()).await.unwrap();

        assert_eq!(docs.len(), 3);
        let calls = index.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                "cat_varc_all_years_combined".to_string(),
                "The author implies that".to_string(),
                3
            )
        );
    }

    #[tokio::test]
    async fn missing_collection_names_it() {
        let index = RecordingIndex::new(Reply::Missing);
        let retriever = ContextRetriever::new(index).with_k(5);
        let section = SectionSpec::new("CAT", "dilr", "DILR");

        let err = retriever.retrieve(&section, &seed()).await.unwrap_err();

        assert!(err.error.contains("'cat_dilr_all_years_combined' not found"));
    }

    #[tokio::test]
    async fn other_index_failures_are_reported_as_exceptions() {
        let index = RecordingIndex::new(Reply::EmbeddingDown);
        let retriever = ContextRetriever::new(index.clone());
        let section = SectionSpec::new("CAT", "quant", "QA");

        let err = retriever.retrieve(&section, &seed()).await.unwrap_err();

        assert!(err.error.starts_with("An exception occurred: "));
        assert!(err.error.contains("connection refused"));
        assert!(!err.error.contains("not found"));
        assert_eq!(index.calls.lock().unwrap().len(), 1);
    }
}
