use crate::config::LlmConfig;
use crate::models::exam::{GeneratedQuestion, GenerationError, McqOptions, TaskOutcome};
use crate::models::question::QuestionType;
use reqwest::Client;
use serde_json::{Map, Value as JsonValue};
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 200;

/// Client for the chat completion endpoint that writes new questions.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    config: LlmConfig,
}

impl AIService {
    pub fn new(config: LlmConfig, client: Client) -> Self {
        Self { client, config }
    }

    /// Sends `prompt` and returns a validated question tagged with `section` and `question_type`.
    /// Every failure comes back as a `GenerationError`; nothing is retried.
    pub async fn complete(
        &self,
        prompt: &str,
        section: &str,
        question_type: QuestionType,
    ) -> TaskOutcome {
        let content = self.chat_completion(prompt).await?;
        parse_generated(&content, section, question_type)
    }

    /// Fails when no credentials are configured, before any other work is spent on a task.
    pub fn ensure_ready(&self) -> Result<(), GenerationError> {
        self.api_key().map(|_| ())
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            GenerationError::new(
                "LLM API key not found. Please set the LLM_API_KEY environment variable.",
            )
        })
    }

    async fn chat_completion(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;

        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "response_format": { "type": "json_object" }
        });

        let res = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| GenerationError::new(format!("LLM request failed: {}", e)))?;

        let status = res.status();
        let text = res.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "LLM API returned an error");
            return Err(GenerationError::new(format!("LLM API Error: {}", status.as_u16()))
                .with_details(truncate(&text, ERROR_BODY_LIMIT)));
        }

        let body: JsonValue = serde_json::from_str(&text).map_err(|_| {
            GenerationError::new("Failed to parse LLM API response")
                .with_details(serde_json::json!({ "raw_response": text }))
        })?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationError::new("Invalid LLM response format")
                    .with_details(serde_json::json!({ "raw_response": text }))
            })
    }
}

/// Checks model output against the fixed MCQ / free-response shapes.
pub fn parse_generated(content: &str, section: &str, question_type: QuestionType) -> TaskOutcome {
    let raw: JsonValue = serde_json::from_str(content).map_err(|_| {
        GenerationError::new("Failed to parse LLM JSON response")
            .with_details(serde_json::json!({ "raw_response": content }))
    })?;

    let malformed = |reason: &str| {
        GenerationError::new(format!("Malformed LLM question: {}", reason))
            .with_details(serde_json::json!({ "raw_response": content }))
    };

    let obj = raw
        .as_object()
        .ok_or_else(|| malformed("response is not a JSON object"))?;

    let question_text = required_text(obj, "question_text").ok_or_else(|| malformed("missing question_text"))?;
    let answer = required_text(obj, "answer").ok_or_else(|| malformed("missing answer"))?;
    let explanation = required_text(obj, "explanation").ok_or_else(|| malformed("missing explanation"))?;

    let options = match question_type {
        QuestionType::Mcq => {
            let mut opts = Vec::with_capacity(4);
            for key in ["option1", "option2", "option3", "option4"] {
                opts.push(required_text(obj, key).ok_or_else(|| malformed(&format!("missing {}", key)))?);
            }
            let mut it = opts.into_iter();
            Some(McqOptions {
                option1: it.next().unwrap_or_default(),
                option2: it.next().unwrap_or_default(),
                option3: it.next().unwrap_or_default(),
                option4: it.next().unwrap_or_default(),
            })
        }
        QuestionType::Tita => {
            if obj.keys().any(|k| k.starts_with("option")) {
                return Err(malformed("free-response question carries options"));
            }
            None
        }
    };

    Ok(GeneratedQuestion {
        question_text,
        options,
        answer,
        explanation,
        section: section.to_string(),
        question_type,
    })
}

fn required_text(obj: &Map<String, JsonValue>, key: &str) -> Option<String> {
    let text = match obj.get(key)? {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
