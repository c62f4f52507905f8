//! Configuration types for a MindGraph store and its embedding provider.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default similarity floor for insert-time suggestions.
pub const DEFAULT_SUGGESTION_THRESHOLD: f32 = 0.5;
/// Default cap on insert-time suggestions.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
/// Default number of search results.
pub const DEFAULT_TOP_K: usize = 5;
/// Upper bound accepted for `top_k`.
pub const MAX_TOP_K: usize = 100;

/// Top-level configuration, usually read from `~/.mindgraph/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MindGraphConfig {
    /// SQLite database file. Relative paths resolve against the working directory.
    pub db_path: PathBuf,
    /// Embedding provider settings.
    pub embedding: EmbeddingSettings,
    /// Insert-time suggestion tuning.
    pub suggestions: SuggestionPolicy,
    /// Search defaults.
    pub search: SearchSettings,
}

impl Default for MindGraphConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            embedding: EmbeddingSettings::default(),
            suggestions: SuggestionPolicy::default(),
            search: SearchSettings::default(),
        }
    }
}

/// `~/.mindgraph/mindgraph.db`, or `./mindgraph.db` when there is no home directory.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".mindgraph").join("mindgraph.db"))
        .unwrap_or_else(|| PathBuf::from("mindgraph.db"))
}

/// Which embedding provider to call and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name (openai, ollama, vllm, lmstudio, ...).
    pub provider: String,
    /// Model name.
    pub model: String,
    /// Environment variable holding the API key. Empty for keyless local providers.
    pub api_key_env: String,
    /// Override for the provider base URL.
    pub base_url: Option<String>,
    /// Override for the vector dimension when the model is not in the built-in table.
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            api_key_env: String::new(),
            base_url: None,
            dimensions: None,
        }
    }
}

/// Thresholds for advisory suggestions produced on insert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionPolicy {
    /// Minimum cosine similarity (inclusive).
    pub threshold: f32,
    /// Maximum number of suggestions returned.
    pub limit: usize,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SUGGESTION_THRESHOLD,
            limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

/// Search defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_top_k: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
        }
    }
}
