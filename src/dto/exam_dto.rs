use crate::models::exam::ExamStructure;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateExamPayload {
    #[validate(length(min = 1, max = 32))]
    pub exam_name: String,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub stream: Option<String>,
    #[validate(range(min = 1990, max = 2100))]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportedExam {
    pub exam: String,
    pub total_questions: usize,
    /// Sections in generation order.
    pub sections: Vec<SupportedSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportedSection {
    pub key: String,
    pub label: String,
    pub quotas: BTreeMap<String, usize>,
}

impl From<&ExamStructure> for SupportedExam {
    fn from(structure: &ExamStructure) -> Self {
        Self {
            exam: structure.exam.clone(),
            total_questions: structure.total_questions(),
            sections: structure
                .sections
                .iter()
                .map(|s| SupportedSection {
                    key: s.section.key.clone(),
                    label: s.section.label.clone(),
                    quotas: s
                        .quotas
                        .iter()
                        .map(|(qt, count)| (qt.as_str().to_string(), *count))
                        .collect(),
                })
                .collect(),
        }
    }
}

fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::cat_structure;
    use serde_json::json;

    #[test]
    fn blank_stream_becomes_none() {
        let p: GenerateExamPayload =
            serde_json::from_value(json!({"exam_name": "CAT", "stream": "  "})).unwrap();
        assert!(p.stream.is_none());
        assert!(p.year.is_none());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_empty_exam_and_silly_year() {
        let p: GenerateExamPayload =
            serde_json::from_value(json!({"exam_name": "", "year": 12})).unwrap();
        let errs = p.validate().unwrap_err();
        let fields = errs.field_errors();
        assert!(fields.contains_key("exam_name"));
        assert!(fields.contains_key("year"));
    }

    #[test]
    fn supported_exam_summary() {
        let s = SupportedExam::from(&cat_structure());
        assert_eq!(s.total_questions, 68);
        assert_eq!(s.sections[2].label, "QA");
        assert_eq!(s.sections[2].quotas["tita"], 8);
    }
}
