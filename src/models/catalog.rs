use super::exam::{ExamStructure, SectionQuota, SectionSpec};
use super::question::QuestionType;

/// Exam families the generator knows how to assemble.
pub fn supported_exams() -> Vec<ExamStructure> {
    vec![cat_structure()]
}

pub fn cat_structure() -> ExamStructure {
    let exam = "CAT";
    let section = |key: &str, label: &str, mcq: usize, tita: usize| SectionQuota {
        section: SectionSpec::new(exam, key, label),
        quotas: vec![(QuestionType::Mcq, mcq), (QuestionType::Tita, tita)],
    };
    ExamStructure {
        exam: exam.to_string(),
        sections: vec![
            section("varc", "VARC", 21, 3),
            section("dilr", "DILR", 12, 10),
            section("quant", "QA", 14, 8),
        ],
    }
}

/// `CAT` has a single structure; other exams are split per stream (`GATE_CS`).
pub fn resolve_exam_key(exam_name: &str, stream: Option<&str>) -> String {
    let exam = exam_name.trim().to_uppercase();
    match stream.map(str::trim).filter(|s| !s.is_empty()) {
        Some(stream) if exam != "CAT" => format!("{}_{}", exam, stream.to_uppercase()),
        _ => exam,
    }
}
