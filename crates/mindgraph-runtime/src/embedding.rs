//! HTTP embedding provider.
//!
//! An OpenAI-compatible implementation of [`EmbeddingProvider`] that works with
//! any service offering a `/v1/embeddings` endpoint (OpenAI, Together, Mistral,
//! Ollama, vLLM, LM Studio, etc.).

use async_trait::async_trait;
use mindgraph_types::config::EmbeddingSettings;
use mindgraph_types::embedding::{EmbeddingError, EmbeddingProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const VLLM_BASE_URL: &str = "http://localhost:8000/v1";
pub const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

/// Configuration for creating an embedding driver.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Provider name (openai, ollama, etc.).
    pub provider: String,
    /// Model name (e.g., "text-embedding-3-small", "all-minilm").
    pub model: String,
    /// API key (resolved from env var).
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Vector length; inferred from the model name when `None`.
    pub dimensions: Option<usize>,
}

/// OpenAI-compatible embedding driver.
pub struct OpenAIEmbeddingDriver {
    api_key: Zeroizing<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
    dims: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl OpenAIEmbeddingDriver {
    /// Create a new OpenAI-compatible embedding driver.
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let dims = config
            .dimensions
            .unwrap_or_else(|| infer_dimensions(&config.model));

        Ok(Self {
            api_key: Zeroizing::new(config.api_key),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            client: reqwest::Client::new(),
            dims,
        })
    }
}

/// Infer embedding dimensions from model name.
fn infer_dimensions(model: &str) -> usize {
    match model {
        // OpenAI
        "text-embedding-3-small" => 1536,
        "text-embedding-3-large" => 3072,
        "text-embedding-ada-002" => 1536,
        // Sentence Transformers / local models
        "all-MiniLM-L6-v2" | "all-minilm" => 384,
        "all-MiniLM-L12-v2" => 384,
        "all-mpnet-base-v2" => 768,
        "nomic-embed-text" => 768,
        "mxbai-embed-large" => 1024,
        "mistral-embed" => 1024,
        // Default to 1536 (most common)
        _ => 1536,
    }
}

/// Put response rows back in request order when the provider reports indices.
fn order_embeddings(mut data: Vec<EmbedData>) -> Vec<Vec<f32>> {
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }
    data.into_iter().map(|d| d.embedding).collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingDriver {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let mut req = self.client.post(&url).json(&body);
        if !self.api_key.as_str().is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key.as_str()));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| EmbeddingError::Http(e.to_string()))?;
        let status = resp.status().as_u16();

        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status,
                message: body_text,
            });
        }

        let data: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;

        if data.data.len() != texts.len() {
            return Err(EmbeddingError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.data.len()
            )));
        }
        let embeddings = order_embeddings(data.data);

        debug!(
            "Embedded {} texts (dims={})",
            embeddings.len(),
            embeddings.first().map(|e| e.len()).unwrap_or(0)
        );

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

fn default_base_url(provider: &str) -> String {
    match provider {
        "openai" => OPENAI_BASE_URL.to_string(),
        "together" => TOGETHER_BASE_URL.to_string(),
        "mistral" => MISTRAL_BASE_URL.to_string(),
        "ollama" => OLLAMA_BASE_URL.to_string(),
        "vllm" => VLLM_BASE_URL.to_string(),
        "lmstudio" => LMSTUDIO_BASE_URL.to_string(),
        other => {
            warn!("Unknown embedding provider '{other}', using OpenAI-compatible format");
            format!("https://{other}/v1")
        }
    }
}

/// Create an embedding driver from configuration.
pub fn create_embedding_driver(
    settings: &EmbeddingSettings,
) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
    let api_key = if settings.api_key_env.is_empty() {
        String::new()
    } else {
        std::env::var(&settings.api_key_env).unwrap_or_default()
    };

    let base_url = settings
        .base_url
        .clone()
        .unwrap_or_else(|| default_base_url(&settings.provider));

    let is_local = base_url.contains("localhost")
        || base_url.contains("127.0.0.1")
        || base_url.contains("[::1]");
    if !is_local && api_key.is_empty() {
        return Err(EmbeddingError::MissingApiKey(if settings.api_key_env.is_empty() {
            format!("no api_key_env configured for provider '{}'", settings.provider)
        } else {
            settings.api_key_env.clone()
        }));
    }
    // SECURITY: Warn when embedding requests will be sent to an external API
    if !is_local {
        warn!(
            provider = %settings.provider,
            base_url = %base_url,
            "Embedding requests go to an external API; memory text will leave this machine"
        );
    }

    let config = EmbeddingConfig {
        provider: settings.provider.clone(),
        model: settings.model.clone(),
        api_key,
        base_url,
        dimensions: settings.dimensions,
    };

    let driver = OpenAIEmbeddingDriver::new(config)?;
    Ok(Box::new(driver))
}
