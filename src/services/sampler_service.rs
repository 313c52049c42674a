use crate::models::exam::GenerationError;
use crate::models::question::{QuestionRecord, QuestionType};
use crate::services::corpus_service::QuestionCorpus;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Exact-match filters; `None` skips the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedFilters {
    pub exam: Option<String>,
    pub stream: Option<String>,
    pub year: Option<i32>,
}

impl SeedFilters {
    fn matches(&self, record: &QuestionRecord) -> bool {
        if let Some(exam) = &self.exam {
            if !record.exam.eq_ignore_ascii_case(exam) {
                return false;
            }
        }
        if let Some(stream) = &self.stream {
            match &record.stream {
                Some(s) if s.eq_ignore_ascii_case(stream) => {}
                _ => return false,
            }
        }
        if let Some(year) = self.year {
            if record.year != Some(year) {
                return false;
            }
        }
        true
    }

    fn describe(&self) -> String {
        [
            self.exam.clone().unwrap_or_default(),
            self.stream.clone().unwrap_or_default(),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Records surviving the filters, in corpus order.
pub fn seed_candidates<'a>(
    records: &'a [QuestionRecord],
    question_type: QuestionType,
    filters: &SeedFilters,
) -> Vec<&'a QuestionRecord> {
    records
        .iter()
        .filter(|r| filters.matches(r))
        .filter(|r| r.question_type() == question_type)
        .collect()
}

#[derive(Clone)]
pub struct SeedSampler {
    corpus: Arc<QuestionCorpus>,
}

impl SeedSampler {
    pub fn new(corpus: Arc<QuestionCorpus>) -> Self {
        Self { corpus }
    }

    /// `exam` is the catalog key (`CAT`, `GATE_CS`) the corpus was loaded under.
    pub fn sample(
        &self,
        exam: &str,
        section: &str,
        question_type: QuestionType,
        filters: &SeedFilters,
    ) -> Result<QuestionRecord, GenerationError> {
        self.sample_with(exam, section, question_type, filters, &mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(
        &self,
        exam: &str,
        section: &str,
        question_type: QuestionType,
        filters: &SeedFilters,
        rng: &mut R,
    ) -> Result<QuestionRecord, GenerationError> {
        let candidates = seed_candidates(self.corpus.records_for(exam, section), question_type, filters);
        candidates.choose(rng).map(|r| (*r).clone()).ok_or_else(|| {
            GenerationError::new(format!(
                "No seed questions found for {} - {} {}",
                filters.describe(),
                section,
                question_type
            ))
        })
    }
}
