use super::question::QuestionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Naming for one exam section across corpus files, index collections and output tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSpec {
    /// Lowercase key used in quota tables, e.g. `quant`.
    pub key: String,
    /// Output tag and corpus filename abbreviation, e.g. `QA`.
    pub label: String,
    /// Similarity index collection, e.g. `cat_qa_all_years_combined`.
    pub collection: String,
}

impl SectionSpec {
    pub fn new(exam: &str, key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            collection: format!(
                "{}_{}_all_years_combined",
                exam.to_lowercase(),
                label.to_lowercase()
            ),
        }
    }

    pub fn corpus_file_name(&self, exam: &str) -> String {
        format!("{}_{}_all_years_combined.json", exam.to_uppercase(), self.label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionQuota {
    pub section: SectionSpec,
    /// Ordered (type, count) pairs.
    pub quotas: Vec<(QuestionType, usize)>,
}

impl SectionQuota {
    pub fn total(&self) -> usize {
        self.quotas.iter().map(|(_, count)| *count).sum()
    }
}

/// Fixed per-family layout of a full exam, sections in generation order.
#[derive(Debug, Clone, Serialize)]
pub struct ExamStructure {
    pub exam: String,
    pub sections: Vec<SectionQuota>,
}

impl ExamStructure {
    pub fn section(&self, key: &str) -> Option<&SectionQuota> {
        self.sections.iter().find(|s| s.section.key == key)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.section.label.as_str())
    }

    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(SectionQuota::total).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqOptions {
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
}

/// A question produced by the language model, already checked against its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question_text: String,
    #[serde(flatten)]
    pub options: Option<McqOptions>,
    pub answer: String,
    pub explanation: String,
    pub section: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

/// Failure of a single generation task, carried as data in the exam's error list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}")]
pub struct GenerationError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
}

impl GenerationError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            section: None,
            question_type: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<JsonValue>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn for_task(mut self, section: &str, question_type: QuestionType) -> Self {
        self.section.get_or_insert_with(|| section.to_string());
        self.question_type.get_or_insert(question_type);
        self
    }
}

pub type TaskOutcome = std::result::Result<GeneratedQuestion, GenerationError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamDetails {
    pub name: String,
    pub stream: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDocument {
    pub exam_details: ExamDetails,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub sections: BTreeMap<String, Vec<GeneratedQuestion>>,
    pub errors: Vec<GenerationError>,
}

impl ExamDocument {
    pub fn new(details: ExamDetails, structure: &ExamStructure, generated_at: DateTime<Utc>) -> Self {
        Self {
            exam_details: details,
            generated_at,
            sections: structure
                .labels()
                .map(|label| (label.to_string(), Vec::new()))
                .collect(),
            errors: Vec::new(),
        }
    }

    pub fn section(&self, label: &str) -> &[GeneratedQuestion] {
        self.sections.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn question_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }
}
