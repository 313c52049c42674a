//! Full-exam assembly.
//!
//! Sections run strictly one after another. Inside a section every required
//! question is an independent task (seed → exemplars → prompt → completion);
//! all of them are awaited before the results are drained into the document.
//! A fixed cooldown between sections keeps the completion provider under its
//! rate limit.

use crate::error::{Error, Result};
use crate::models::catalog::{resolve_exam_key, supported_exams};
use crate::models::exam::{
    ExamDetails, ExamDocument, ExamStructure, GeneratedQuestion, GenerationError, SectionQuota,
    SectionSpec, TaskOutcome,
};
use crate::models::question::QuestionType;
use crate::services::ai_service::AIService;
use crate::services::prompt_service::build_prompt;
use crate::services::retrieval_service::ContextRetriever;
use crate::services::sampler_service::{SeedFilters, SeedSampler};
use crate::services::storage_service::ExamStorage;
use crate::utils::time::now;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SECTION_COOLDOWN: Duration = Duration::from_secs(60);

/// Scheduler step between two section phases.
#[async_trait]
pub trait SectionPacer: Send + Sync {
    async fn pause(&self, after_section: &str, delay: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl SectionPacer for TokioPacer {
    async fn pause(&self, after_section: &str, delay: Duration) {
        tracing::info!(section = %after_section, secs = delay.as_secs(), "Waiting to avoid rate limiting");
        tokio::time::sleep(delay).await;
    }
}

#[derive(Clone)]
pub struct ExamService {
    exams: Arc<Vec<ExamStructure>>,
    sampler: SeedSampler,
    retriever: ContextRetriever,
    ai: AIService,
    storage: ExamStorage,
    pacer: Arc<dyn SectionPacer>,
    cooldown: Duration,
    max_concurrent_tasks: Option<usize>,
}

impl ExamService {
    pub fn new(
        sampler: SeedSampler,
        retriever: ContextRetriever,
        ai: AIService,
        storage: ExamStorage,
    ) -> Self {
        Self {
            exams: Arc::new(supported_exams()),
            sampler,
            retriever,
            ai,
            storage,
            pacer: Arc::new(TokioPacer),
            cooldown: DEFAULT_SECTION_COOLDOWN,
            max_concurrent_tasks: None,
        }
    }

    pub fn with_exams(mut self, exams: Vec<ExamStructure>) -> Self {
        self.exams = Arc::new(exams);
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn SectionPacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// `None` keeps every task of a section in flight at once; otherwise tasks run in batches of `limit`.
    pub fn with_max_concurrent_tasks(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_tasks = limit.map(|l| l.max(1));
        self
    }

    pub fn exams(&self) -> &[ExamStructure] {
        &self.exams
    }

    pub fn structure_for(&self, exam_name: &str, stream: Option<&str>) -> Option<&ExamStructure> {
        let key = resolve_exam_key(exam_name, stream);
        self.exams.iter().find(|s| s.exam == key)
    }

    pub async fn generate_full_exam(
        &self,
        exam_name: &str,
        stream: Option<&str>,
        year: Option<i32>,
    ) -> Result<ExamDocument> {
        let structure = self
            .structure_for(exam_name, stream)
            .ok_or_else(|| Error::UnsupportedExam(resolve_exam_key(exam_name, stream)))?;

        tracing::info!(exam = %structure.exam, questions = structure.total_questions(), "Generating mock exam");

        let mut exam = ExamDocument::new(
            ExamDetails {
                name: exam_name.to_string(),
                stream: stream.map(str::to_string),
                year,
            },
            structure,
            now(),
        );
        let filters = SeedFilters {
            exam: Some(exam_name.to_string()),
            stream: stream.map(str::to_string),
            year,
        };
        let labels: Vec<&str> = structure.labels().collect();

        for (i, quota) in structure.sections.iter().enumerate() {
            tracing::info!(section = %quota.section.label, tasks = quota.total(), "Generating section");

            let results = self.run_section(&structure.exam, quota, &filters).await;
            let (sections, errors) = drain(&labels, &results);
            for (label, questions) in sections {
                exam.sections.entry(label).or_default().extend(questions);
            }
            exam.errors.extend(errors);

            tracing::info!(
                section = %quota.section.label,
                generated = exam.section(&quota.section.label).len(),
                errors = exam.errors.len(),
                "Section generation complete"
            );

            if i + 1 < structure.sections.len() {
                self.pacer.pause(&quota.section.label, self.cooldown).await;
            }
        }

        tracing::info!(
            questions = exam.question_count(),
            errors = exam.errors.len(),
            "Full exam generation complete"
        );

        match self.storage.save(&exam).await {
            Ok(path) => tracing::info!(path = %path.display(), "Saved generated exam"),
            Err(e) => tracing::error!(error = %e, "Error saving the generated exam"),
        }

        Ok(exam)
    }

    /// One task per required question; returns once every task has settled.
    async fn run_section(
        &self,
        exam: &str,
        quota: &SectionQuota,
        filters: &SeedFilters,
    ) -> Vec<TaskOutcome> {
        let jobs: Vec<QuestionType> = quota
            .quotas
            .iter()
            .flat_map(|(qt, count)| std::iter::repeat(*qt).take(*count))
            .collect();
        if jobs.is_empty() {
            return Vec::new();
        }
        let batch_size = self.max_concurrent_tasks.unwrap_or(jobs.len());

        let mut results = Vec::with_capacity(jobs.len());
        for batch in jobs.chunks(batch_size) {
            let futures: Vec<_> = batch
                .iter()
                .map(|qt| self.generate_single(exam, &quota.section, *qt, filters))
                .collect();
            results.extend(join_all(futures).await);
        }
        results
    }

    async fn generate_single(
        &self,
        exam: &str,
        section: &SectionSpec,
        question_type: QuestionType,
        filters: &SeedFilters,
    ) -> TaskOutcome {
        let outcome = async {
            self.ai.ensure_ready()?;
            let seed = self.sampler.sample(exam, &section.key, question_type, filters)?;
            let exemplars = self.retriever.retrieve(section, &seed).await?;
            let prompt = build_prompt(exam, &section.label, question_type, &exemplars);
            self.ai.complete(&prompt, &section.label, question_type).await
        }
        .await;

        match outcome {
            Ok(q) => Ok(q),
            Err(e) => {
                tracing::debug!(section = %section.label, question_type = %question_type, error = %e, "Generation task failed");
                Err(e.for_task(&section.label, question_type))
            }
        }
    }
}

/// Routes settled results by section tag. Unknown tags land in the error list.
pub fn drain(
    labels: &[&str],
    results: &[TaskOutcome],
) -> (BTreeMap<String, Vec<GeneratedQuestion>>, Vec<GenerationError>) {
    let mut sections: BTreeMap<String, Vec<GeneratedQuestion>> = BTreeMap::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(q) if labels.contains(&q.section.as_str()) => {
                sections.entry(q.section.clone()).or_default().push(q.clone());
            }
            Ok(q) => {
                tracing::error!(section = %q.section, "Generated question has unknown section tag");
                errors.push(
                    GenerationError::new("Generated question has unknown section")
                        .with_details(serde_json::to_value(q).unwrap_or_default()),
                );
            }
            Err(e) => errors.push(e.clone()),
        }
    }

    (sections, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(section: &str) -> GeneratedQuestion {
        GeneratedQuestion {
            question_text: "Q".into(),
            options: None,
            answer: "1".into(),
            explanation: "e".into(),
            section: section.into(),
            question_type: QuestionType::Tita,
        }
    }

    #[test]
    fn drain_partitions_by_tag() {
        let results = vec![
            Ok(question("VARC")),
            Err(GenerationError::new("LLM API Error: 500")),
            Ok(question("QA")),
            Ok(question("XYZ")),
        ];
        let (sections, errors) = drain(&["VARC", "QA"], &results);

        assert_eq!(sections["VARC"].len(), 1);
        assert_eq!(sections["QA"].len(), 1);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].error, "Generated question has unknown section");
        assert_eq!(errors[1].details.as_ref().unwrap()["section"], "XYZ");
    }

    #[test]
    fn drain_is_idempotent() {
        let results = vec![
            Ok(question("VARC")),
            Err(GenerationError::new("x")),
            Ok(question("nope")),
        ];
        let first = drain(&["VARC"], &results);
        let second = drain(&["VARC"], &results);
        assert_eq!(first, second);
    }
}
