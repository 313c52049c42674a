use crate::config::EmbeddingsConfig;
use crate::error::Result;
use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;

/// Turns text into vectors. Index build and query must use the same model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn model(&self) -> String;
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct EmbedService {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl EmbedService {
    pub fn new(config: &EmbeddingsConfig, client: Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
        }
    }

    pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
        let mut dot = 0f32;
        let mut na = 0f32;
        let mut nb = 0f32;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += x * y;
            na += x * x;
            nb += y * y;
        }
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na.sqrt() * nb.sqrt())
        }
    }
}

#[async_trait]
impl Embedder for EmbedService {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(serde::Serialize)]
        struct EmbReq<'a> {
            model: &'a str,
            input: &'a [String],
        }
        #[derive(serde::Deserialize)]
        struct EmbData {
            embedding: Vec<f32>,
        }
        #[derive(serde::Deserialize)]
        struct EmbResp {
            data: Vec<EmbData>,
        }

        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = EmbReq {
            model: &self.model,
            input: texts,
        };
        let mut req = self
            .client
            .post(&self.api_url)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.context("embeddings request failed")?;

        let status = resp.status();
        let txt = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow::anyhow!("embeddings status {}: {}", status.as_u16(), txt).into());
        }
        let parsed: EmbResp = serde_json::from_str(&txt).context("embeddings parse failed")?;
        if parsed.data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "embeddings returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )
            .into());
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}
