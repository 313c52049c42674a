use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub questions_dir: PathBuf,
    pub vector_db_dir: PathBuf,
    pub generated_exams_dir: PathBuf,
    pub llm: LlmConfig,
    pub embeddings: EmbeddingsConfig,
    pub section_cooldown_secs: u64,
    pub max_concurrent_tasks: Option<usize>,
    pub exam_timeout_secs: u64,
}

/// Settings for the chat completion endpoint used to write new questions.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Missing key is not fatal at startup; every generation task reports it instead.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.3,
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "http://localhost:8080/v1/embeddings".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let llm_defaults = LlmConfig::default();
        let emb_defaults = EmbeddingsConfig::default();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            questions_dir: get_env_or("QUESTIONS_DIR", "app_data/structured_questions").into(),
            vector_db_dir: get_env_or("VECTOR_DB_DIR", "app_data/vector_db").into(),
            generated_exams_dir: get_env_or("GENERATED_EXAMS_DIR", "app_data/generated_questions")
                .into(),
            llm: LlmConfig {
                api_key: get_env_opt("LLM_API_KEY"),
                api_url: get_env_or("LLM_API_URL", &llm_defaults.api_url),
                model: get_env_or("LLM_MODEL", &llm_defaults.model),
                temperature: get_env_parse_or("LLM_TEMPERATURE", llm_defaults.temperature)?,
                max_tokens: get_env_parse_or("LLM_MAX_TOKENS", llm_defaults.max_tokens)?,
                timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", llm_defaults.timeout_secs)?,
            },
            embeddings: EmbeddingsConfig {
                api_key: get_env_opt("EMBEDDINGS_API_KEY"),
                api_url: get_env_or("EMBEDDINGS_API_URL", &emb_defaults.api_url),
                model: get_env_or("EMBEDDINGS_MODEL", &emb_defaults.model),
            },
            section_cooldown_secs: get_env_parse_or("SECTION_COOLDOWN_SECS", 60)?,
            max_concurrent_tasks: match get_env_opt("MAX_CONCURRENT_TASKS") {
                Some(_) => Some(get_env_parse("MAX_CONCURRENT_TASKS")?),
                None => None,
            },
            exam_timeout_secs: get_env_parse_or("EXAM_TIMEOUT_SECS", 900)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(_) => get_env_parse(name),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
