use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A prior exam question as stored in the structured corpus.
///
/// Options arrive in two layouts: an `options` array, or `option1`..`optionN`
/// keys. Both collapse into `options`; an empty list means free-response.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRecord {
    pub id: String,
    pub exam: String,
    pub section: String,
    pub stream: Option<String>,
    pub year: Option<i32>,
    pub slot: Option<i32>,
    pub question_text: String,
    pub passage_context: Option<String>,
    pub options: Vec<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionType {
    #[serde(alias = "mcq")]
    Mcq,
    #[serde(alias = "tita")]
    Tita,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::Tita => "tita",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Tita => "TITA",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QuestionRecord {
    /// Presence of at least one option is the only thing that makes a record MCQ.
    pub fn question_type(&self) -> QuestionType {
        if self.options.is_empty() {
            QuestionType::Tita
        } else {
            QuestionType::Mcq
        }
    }

    pub fn is_mcq(&self) -> bool {
        self.question_type() == QuestionType::Mcq
    }
}

#[derive(Deserialize)]
struct RawQuestionRecord {
    id: String,
    #[serde(default)]
    exam: String,
    #[serde(default)]
    section: String,
    #[serde(default)]
    stream: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    slot: Option<i32>,
    #[serde(default)]
    question_text: String,
    #[serde(default)]
    passage_context: Option<String>,
    #[serde(default)]
    options: Option<Vec<JsonValue>>,
    #[serde(default)]
    answer: Option<JsonValue>,
    #[serde(flatten)]
    extra: Map<String, JsonValue>,
}

impl<'de> Deserialize<'de> for QuestionRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawQuestionRecord::deserialize(deserializer)?;

        let mut options: Vec<String> = raw
            .options
            .unwrap_or_default()
            .iter()
            .filter_map(value_as_text)
            .collect();

        if options.is_empty() {
            let mut numbered: Vec<(u32, String)> = raw
                .extra
                .iter()
                .filter_map(|(key, val)| {
                    let idx = key.strip_prefix("option")?.parse::<u32>().ok()?;
                    Some((idx, value_as_text(val)?))
                })
                .collect();
            numbered.sort_by_key(|(idx, _)| *idx);
            options = numbered.into_iter().map(|(_, text)| text).collect();
        }

        Ok(QuestionRecord {
            id: raw.id,
            exam: raw.exam,
            section: raw.section,
            stream: raw.stream.filter(|s| !s.trim().is_empty()),
            year: raw.year,
            slot: raw.slot,
            question_text: raw.question_text,
            passage_context: raw.passage_context.filter(|s| !s.trim().is_empty()),
            options,
            answer: raw.answer.as_ref().and_then(value_as_text),
        })
    }
}

fn value_as_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
