//! Process-wide configuration.
//!
//! [`AtlasConfig`] is built once at start-up (usually via [`AtlasConfig::from_env`]) and passed
//! by reference into every component constructor. Nothing below the CLI reads the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AtlasError, Result};

/// Default chat-completions endpoint (Groq's OpenAI-compatible API).
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default chat model.
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

/// Desktop browser user agent sent by the fetcher and the search backend.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

/// Top-level configuration for one ATLAS process.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
    /// Text-generation client settings.
    pub llm: LlmConfig,
    /// Embedding backend settings.
    pub embedding: EmbeddingConfig,
    /// Chunking and retrieval settings.
    pub rag: RagConfig,
    /// Web search settings.
    pub search: SearchConfig,
    /// Document fetch settings.
    pub fetch: FetchConfig,
    /// Orchestrator settings.
    pub runner: RunnerConfig,
    /// Artifact and report directories.
    pub paths: PathsConfig,
}

impl AtlasConfig {
    /// Build a configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is not an error.
        let dotenv = dotenvy::dotenv();
        debug!(dotenv_loaded = dotenv.is_ok(), "loading configuration from environment");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup, starting from defaults.
    ///
    /// Recognised keys: `GROQ_API_KEY`, `GROQ_MODEL`, `ATLAS_LLM_BASE_URL`,
    /// `ATLAS_EMBEDDING_PROVIDER`, `ATLAS_EMBEDDING_MODEL`, `ATLAS_EMBEDDING_BASE_URL`,
    /// `ATLAS_EMBEDDING_DIMENSIONS`, `OPENAI_API_KEY`, `ATLAS_DATA_DIR`, `ATLAS_REPORTS_DIR`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("GROQ_API_KEY") {
            config.llm.api_key = key;
        }
        if let Some(model) = lookup("GROQ_MODEL") {
            config.llm.model = model;
        }
        if let Some(base_url) = lookup("ATLAS_LLM_BASE_URL") {
            config.llm.base_url = base_url;
        }
        if let Some(provider) = lookup("ATLAS_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider.parse()?;
        }
        if let Some(model) = lookup("ATLAS_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Some(base_url) = lookup("ATLAS_EMBEDDING_BASE_URL") {
            config.embedding.base_url = base_url;
        }
        if let Some(dimensions) = lookup("ATLAS_EMBEDDING_DIMENSIONS") {
            config.embedding.dimensions = dimensions.parse().map_err(|_| {
                AtlasError::Config(format!(
                    "ATLAS_EMBEDDING_DIMENSIONS must be a positive integer, got '{dimensions}'"
                ))
            })?;
        }
        config.embedding.api_key = lookup("OPENAI_API_KEY");
        if let Some(dir) = lookup("ATLAS_DATA_DIR") {
            config.paths.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("ATLAS_REPORTS_DIR") {
            config.paths.reports_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(AtlasError::Config(
                "GROQ_API_KEY is not set; add it to the environment or a .env file".to_string(),
            ));
        }
        if self.llm.request_timeout_secs == 0 || self.fetch.timeout_secs == 0 {
            return Err(AtlasError::Config("request timeouts must be greater than zero".into()));
        }
        if self.llm.max_attempts == 0 {
            return Err(AtlasError::Config("llm.max_attempts must be at least 1".into()));
        }
        if self.embedding.dimensions == 0 {
            return Err(AtlasError::Config("embedding.dimensions must be greater than zero".into()));
        }
        if self.embedding.provider == EmbeddingBackend::OpenAI && self.embedding.api_key.is_none()
        {
            return Err(AtlasError::Config(
                "OPENAI_API_KEY is required for the openai embedding provider".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(AtlasError::Config("search.max_results must be greater than zero".into()));
        }
        if self.runner.fetch_concurrency == 0 {
            return Err(AtlasError::Config(
                "runner.fetch_concurrency must be greater than zero".into(),
            ));
        }
        self.rag.validate()
    }
}

/// Settings for the chat-completions client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Bearer token for the API. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum completion tokens.
    pub max_tokens: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Total attempts for a rate-limited call (first try included).
    pub max_attempts: u32,
    /// Base delay for exponential backoff, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_LLM_MODEL.to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            temperature: 0.3,
            max_tokens: 2048,
            request_timeout_secs: 60,
            max_attempts: 3,
            retry_backoff_ms: 2000,
        }
    }
}

impl LlmConfig {
    /// The per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Which embedding backend to construct.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Offline feature-hashing embeddings.
    #[default]
    Hashing,
    /// An OpenAI-compatible `/embeddings` endpoint.
    #[serde(rename = "openai")]
    OpenAI,
}

impl FromStr for EmbeddingBackend {
    type Err = AtlasError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hashing" | "hash" | "local" => Ok(Self::Hashing),
            "openai" => Ok(Self::OpenAI),
            other => Err(AtlasError::Config(format!(
                "unknown embedding provider '{other}' (expected 'hashing' or 'openai')"
            ))),
        }
    }
}

/// Settings for the embedding backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend selection.
    pub provider: EmbeddingBackend,
    /// Model name for remote providers.
    pub model: String,
    /// Base URL for remote providers.
    pub base_url: String,
    /// API key for remote providers. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Vector dimensionality.
    pub dimensions: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Hashing,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            dimensions: 384,
            request_timeout_secs: 30,
        }
    }
}

/// Configuration parameters for chunking and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Paragraphs shorter than this many characters are dropped.
    pub min_chunk_chars: usize,
    /// Number of leading characters of a chunk that feed its identity hash.
    pub id_prefix_chars: usize,
    /// Number of evidence records retrieved per sub-question.
    pub top_k: usize,
    /// Minimum similarity score for evidence (none keeps everything).
    pub similarity_threshold: Option<f32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { min_chunk_chars: 200, id_prefix_chars: 200, top_k: 5, similarity_threshold: None }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Config`] if:
    /// - `top_k == 0`
    /// - `min_chunk_chars == 0` or `id_prefix_chars == 0`
    /// - `similarity_threshold` is outside `[-1, 1]`
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(AtlasError::Config("top_k must be greater than zero".to_string()));
        }
        if self.min_chunk_chars == 0 {
            return Err(AtlasError::Config("min_chunk_chars must be greater than zero".into()));
        }
        if self.id_prefix_chars == 0 {
            return Err(AtlasError::Config("id_prefix_chars must be greater than zero".into()));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(AtlasError::Config(format!(
                    "similarity_threshold ({threshold}) must be within [-1, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the minimum paragraph length in characters.
    pub fn min_chunk_chars(mut self, chars: usize) -> Self {
        self.config.min_chunk_chars = chars;
        self
    }

    /// Set how many leading characters feed the chunk identity hash.
    pub fn id_prefix_chars(mut self, chars: usize) -> Self {
        self.config.id_prefix_chars = chars;
        self
    }

    /// Set the number of evidence records to retrieve.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for evidence.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Settings for the web search backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum results kept per sub-question after filtering.
    pub max_results: usize,
    /// Region hint passed to the search backend.
    pub region: String,
    /// Hosts containing any of these substrings are dropped.
    pub blacklist_domains: Vec<String>,
    /// When non-empty, a result must mention one of these (case-insensitive) in its title or
    /// snippet.
    pub required_keywords: Vec<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            region: "wt-wt".to_string(),
            blacklist_domains: vec![
                "duckduckgo.com".to_string(),
                "zhidao.baidu.com".to_string(),
                "biggerpockets.com".to_string(),
            ],
            required_keywords: Vec::new(),
            timeout_secs: 20,
        }
    }
}

/// Settings for document download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// User agent header.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: DEFAULT_USER_AGENT.to_string(), timeout_secs: 20 }
    }
}

impl FetchConfig {
    /// The per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the research orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Whether answers are graded by the critic.
    pub use_critic: bool,
    /// How many documents of one sub-question are fetched and extracted at once.
    pub fetch_concurrency: usize,
    /// Recovered per-item failures tolerated before the run aborts (none = unlimited).
    pub max_item_failures: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { use_critic: true, fetch_concurrency: 1, max_item_failures: None }
    }
}

/// Artifact and report directories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Root for raw and cleaned document artifacts.
    pub data_dir: PathBuf,
    /// Where final reports are written.
    pub reports_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("data"), reports_dir: PathBuf::from("reports_output") }
    }
}

impl PathsConfig {
    /// Directory for raw fetched documents.
    pub fn raw_html_dir(&self) -> PathBuf {
        self.data_dir.join("raw_html")
    }

    /// Directory for extracted text.
    pub fn cleaned_dir(&self) -> PathBuf {
        self.data_dir.join("cleaned")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AtlasConfig::default();
        assert_eq!(config.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.llm.max_attempts, 3);
        assert_eq!(config.rag.min_chunk_chars, 200);
        assert_eq!(config.rag.top_k, 5);
        assert_eq!(config.search.max_results, 5);
        assert!(config.runner.use_critic);
        assert_eq!(config.paths.raw_html_dir(), PathBuf::from("data/raw_html"));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = AtlasConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("GROQ_MODEL", "llama-3.3-70b"),
            ("ATLAS_EMBEDDING_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("ATLAS_DATA_DIR", "/tmp/atlas"),
        ]))
        .unwrap();

        assert_eq!(config.llm.api_key, "gsk-test");
        assert_eq!(config.llm.model, "llama-3.3-70b");
        assert_eq!(config.embedding.provider, EmbeddingBackend::OpenAI);
        assert_eq!(config.paths.cleaned_dir(), PathBuf::from("/tmp/atlas/cleaned"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let config = AtlasConfig::from_lookup(lookup_from(&[])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn unknown_embedding_provider_is_rejected() {
        let result = AtlasConfig::from_lookup(lookup_from(&[("ATLAS_EMBEDDING_PROVIDER", "bert")]));
        assert!(matches!(result, Err(AtlasError::Config(_))));
    }

    #[test]
    fn openai_embeddings_require_a_key() {
        let mut config = AtlasConfig::default();
        config.llm.api_key = "gsk".into();
        config.embedding.provider = EmbeddingBackend::OpenAI;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rag_builder_validates() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().similarity_threshold(1.5).build().is_err());
        let config = RagConfig::builder().top_k(3).min_chunk_chars(50).build().unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.min_chunk_chars, 50);
    }

    #[test]
    fn api_key_is_not_serialized() {
        let mut config = AtlasConfig::default();
        config.llm.api_key = "secret".into();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
