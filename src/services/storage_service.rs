use crate::error::Result;
use crate::models::exam::ExamDocument;
use crate::utils::time::file_stamp;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Append-only archive of generated exams, one pretty JSON file per run.
#[derive(Debug, Clone)]
pub struct ExamStorage {
    root: PathBuf,
}

impl ExamStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `<root>/<EXAM>/exam_<timestamp>.json`; never overwrites an existing file.
    pub async fn save(&self, exam: &ExamDocument) -> Result<PathBuf> {
        let dir = self.root.join(exam.exam_details.name.to_uppercase());
        fs::create_dir_all(&dir).await?;

        let stamp = file_stamp(exam.generated_at);
        let mut path = dir.join(format!("exam_{}.json", stamp));
        let mut n = 1;
        while fs::try_exists(&path).await? {
            path = dir.join(format!("exam_{}_{}.json", stamp, n));
            n += 1;
        }

        let body = serde_json::to_vec_pretty(exam)?;
        fs::write(&path, body).await?;
        Ok(path)
    }

    pub async fn load(path: &Path) -> Result<ExamDocument> {
        let raw = fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::cat_structure;
    use crate::models::exam::{ExamDetails, GenerationError};
    use chrono::{TimeZone, Utc};

    fn exam() -> ExamDocument {
        let mut doc = ExamDocument::new(
            ExamDetails {
                name: "CAT".into(),
                stream: None,
                year: Some(2024),
            },
            &cat_structure(),
            Utc.with_ymd_and_hms(2024, 11, 24, 9, 30, 5).unwrap(),
        );
        doc.errors.push(GenerationError::new("boom"));
        doc
    }

    #[tokio::test]
    async fn saves_under_exam_dir_with_timestamp_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExamStorage::new(dir.path());

        let path = storage.save(&exam()).await.unwrap();

        assert_eq!(
            path,
            dir.path().join("CAT").join("exam_20241124_093005_000.json")
        );
        let loaded = ExamStorage::load(&path).await.unwrap();
        assert_eq!(loaded.errors.len(), 1);
        assert_eq!(loaded.sections.len(), 3);
        assert_eq!(loaded.exam_details.year, Some(2024));
    }

    #[tokio::test]
    async fn same_timestamp_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExamStorage::new(dir.path());

        let first = storage.save(&exam()).await.unwrap();
        let second = storage.save(&exam()).await.unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("exam_20241124_093005_000_1.json"));
    }

    #[tokio::test]
    async fn unwritable_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let storage = ExamStorage::new(&blocker);
        assert!(storage.save(&exam()).await.is_err());
    }
}
