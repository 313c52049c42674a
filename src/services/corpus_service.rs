use crate::models::exam::ExamStructure;
use crate::models::question::QuestionRecord;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

type Sections = HashMap<String, Vec<QuestionRecord>>;

/// In-memory snapshot of the structured question corpus, keyed by exam then section key.
///
/// Loaded once at startup and never mutated; a reload means building a new one.
#[derive(Debug, Default, Clone)]
pub struct QuestionCorpus {
    exams: HashMap<String, Sections>,
}

impl QuestionCorpus {
    pub fn from_exams(exams: HashMap<String, Sections>) -> Self {
        Self { exams }
    }

    /// Corpus holding a single exam.
    pub fn from_sections(exam: &str, sections: Sections) -> Self {
        Self::from_exams(HashMap::from([(exam.to_string(), sections)]))
    }

    /// Reads `<dir>/<EXAM>/<EXAM>_<LABEL>_all_years_combined.json` for every section.
    /// Missing or unparsable files load as empty sections with a warning.
    pub async fn load(questions_dir: &Path, structures: &[ExamStructure]) -> Self {
        let mut exams: HashMap<String, Sections> = HashMap::new();

        for structure in structures {
            let exam_dir = questions_dir.join(&structure.exam);
            let sections = exams.entry(structure.exam.clone()).or_default();
            for quota in &structure.sections {
                let path = exam_dir.join(quota.section.corpus_file_name(&structure.exam));
                let records = match fs::read_to_string(&path).await {
                    Ok(raw) => match serde_json::from_str::<Vec<QuestionRecord>>(&raw) {
                        Ok(records) => records,
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Could not decode question file");
                            Vec::new()
                        }
                    },
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Question file not found");
                        Vec::new()
                    }
                };
                sections.insert(quota.section.key.clone(), records);
            }
        }

        let corpus = Self { exams };
        corpus.log_summary();
        corpus
    }

    pub fn records_for(&self, exam: &str, section: &str) -> &[QuestionRecord] {
        self.exams
            .get(exam)
            .and_then(|sections| sections.get(section))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn exams(&self) -> impl Iterator<Item = &str> {
        self.exams.keys().map(String::as_str)
    }

    pub fn section_keys<'a>(&'a self, exam: &str) -> impl Iterator<Item = &'a str> {
        self.exams
            .get(exam)
            .into_iter()
            .flat_map(|sections| sections.keys().map(String::as_str))
    }

    fn log_summary(&self) {
        let mut keys: Vec<(&String, &String)> = self
            .exams
            .iter()
            .flat_map(|(exam, sections)| sections.keys().map(move |s| (exam, s)))
            .collect();
        keys.sort();
        for (exam, key) in keys {
            let records = &self.exams[exam][key];
            if records.is_empty() {
                tracing::warn!(exam = %exam, section = %key.to_uppercase(), "0 questions loaded, check the source JSON file");
                continue;
            }
            let mcq = records.iter().filter(|r| r.is_mcq()).count();
            tracing::info!(
                exam = %exam,
                section = %key.to_uppercase(),
                total = records.len(),
                mcq,
                tita = records.len() - mcq,
                "Loaded source questions"
            );
        }
    }
}
