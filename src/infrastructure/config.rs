use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::{QuestionLimits, RetryPolicy};
use crate::domain::DomainError;
use crate::infrastructure::retrieval::HybridWeights;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Loads `config.yaml` and `prompts.yaml`, falling back to defaults for
    /// missing files, then applies environment overrides.
    pub fn load(
        config_path: impl AsRef<Path>,
        prompts_path: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let mut config: Config = read_yaml(config_path.as_ref())?.unwrap_or_default();
        let prompts: PromptsConfig = read_yaml(prompts_path.as_ref())?.unwrap_or_default();

        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config, prompts })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let config_path =
            std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let prompts_path =
            std::env::var("APP_PROMPTS").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.into());
        Self::load(config_path, prompts_path)
    }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<Option<T>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let parsed = serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid config file {}: {e}", path.display()))?;
    Ok(Some(parsed))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
    pub corpus: CorpusConfig,
    pub rag: RagConfig,
    pub retry: RetryConfig,
    pub question: QuestionConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(dir) = std::env::var("CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("CORPUS_PATH") {
            self.corpus.path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |msg: &str| Err(DomainError::validation(msg.to_string()));

        if self.embedding.batch_size == 0 {
            return invalid("embedding.batch_size must be greater than 0");
        }
        if self.embedding.dimension == 0 {
            return invalid("embedding.dimension must be greater than 0");
        }
        if !(-1.0..=1.0).contains(&self.rag.similarity_threshold) {
            return invalid("rag.similarity_threshold must be within [-1, 1]");
        }
        if !(0.0..=1.0).contains(&self.rag.default_confidence) {
            return invalid("rag.default_confidence must be within [0, 1]");
        }
        if self.question.min_length > self.question.max_length {
            return invalid("question.min_length must not exceed question.max_length");
        }
        if self.rag.retrieval == RetrievalMode::Hybrid {
            self.rag.hybrid_weights()?;
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be greater than 0");
        }
        if self.retry.backoff_multiplier < 1.0 {
            return invalid("retry.backoff_multiplier must be at least 1.0");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub timeout_seconds: u64,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            batch_size: 100,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/cache"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/documents.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub max_results: usize,
    pub similarity_threshold: f64,
    pub default_confidence: f64,
    pub max_context_chars: usize,
    pub reconcile_on_startup: bool,
    pub retrieval: RetrievalMode,
    pub semantic_weight: f64,
    pub lexical_weight: f64,
}

impl RagConfig {
    pub fn hybrid_weights(&self) -> Result<HybridWeights, DomainError> {
        HybridWeights::new(self.semantic_weight, self.lexical_weight)
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            similarity_threshold: 0.7,
            default_confidence: 0.3,
            max_context_chars: 16_000,
            reconcile_on_startup: true,
            retrieval: RetrievalMode::Semantic,
            semantic_weight: 0.7,
            lexical_weight: 0.3,
        }
    }
}

/// How cached records are scored against a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Embedding cosine similarity only.
    #[default]
    Semantic,
    /// Weighted blend of cosine similarity and TF-IDF keyword similarity.
    Hybrid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_delay_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuestionConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl QuestionConfig {
    pub fn limits(&self) -> QuestionLimits {
        QuestionLimits {
            min_length: self.min_length,
            max_length: self.max_length,
        }
    }
}

impl Default for QuestionConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub system: String,
    pub context_template: String,
    pub no_context_template: String,
    pub document_separator: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system: "You answer questions using the provided documents. If the documents do not \
                     contain the answer, say so and answer from general knowledge."
                .to_string(),
            context_template: "Documents:\n{context}\n\nQuestion: {question}".to_string(),
            no_context_template: "Question: {question}".to_string(),
            document_separator: "\n\n---\n\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.embedding.batch_size, 100);
        assert_eq!(config.rag.max_results, 5);
        assert_eq!(config.question.min_length, 3);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let yaml = "embedding:\n  model: custom-embed\n  dimension: 8\n\
                    rag:\n  similarity_threshold: 0.5\n  retrieval: hybrid\n\
                    llm:\n  provider: anthropic";
        writeln!(file, "{yaml}").unwrap();

        let config: Config = read_yaml(file.path()).unwrap().unwrap();
        assert_eq!(config.embedding.model, "custom-embed");
        assert_eq!(config.embedding.dimension, 8);
        assert_eq!(config.embedding.batch_size, 100);
        assert_eq!(config.rag.similarity_threshold, 0.5);
        assert_eq!(config.rag.max_results, 5);
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(config.rag.retrieval, RetrievalMode::Hybrid);
        assert_eq!(config.rag.semantic_weight, 0.7);
    }

    #[test]
    fn test_missing_file_yields_none() {
        let parsed: Option<Config> = read_yaml(Path::new("/nonexistent/config.yaml")).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.embedding.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.question.min_length = 10;
        config.question.max_length = 5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hybrid_weights_are_checked_only_in_hybrid_mode() {
        let mut config = Config::default();
        config.rag.semantic_weight = 0.9;
        config.rag.lexical_weight = 0.3;
        config.validate().unwrap();

        config.rag.retrieval = RetrievalMode::Hybrid;
        assert!(config.validate().is_err());

        config.rag.semantic_weight = 0.5;
        config.rag.lexical_weight = 0.5;
        config.validate().unwrap();
        assert_eq!(config.rag.hybrid_weights().unwrap().lexical(), 0.5);
    }
}
