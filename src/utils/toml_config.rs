//! TOML-based configuration for ragcheck
//!
//! Providers, models, the tracking service and every pipeline stage are
//! configured through a single `ragcheck.toml`. Secrets are never stored in
//! the file; they are referenced by environment variable name (`api_key_env`)
//! and resolved at startup, after `.env` has been loaded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::chain::PromptVariant;

/// Root configuration structure loaded from ragcheck.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagcheckConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Named LLM provider configurations
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Default for RagcheckConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            tracking: TrackingConfig::default(),
            providers: default_providers(),
            models: ModelsConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            ingest: IngestConfig::default(),
            retrieval: RetrievalConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============= Tracking Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingBackend {
    /// LangSmith-compatible REST service
    Remote,
    /// Process-local store, nothing leaves the machine
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_backend")]
    pub backend: TrackingBackend,

    /// Used when the endpoint environment variable is unset
    #[serde(default = "default_tracking_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: String,

    /// Environment variable containing the tracking API key
    #[serde(default = "default_tracking_api_key_env")]
    pub api_key_env: String,

    /// Environment variable naming the project that ad-hoc runs are logged to
    #[serde(default = "default_project_env")]
    pub project_env: String,

    #[serde(default = "default_dataset_prefix")]
    pub dataset_prefix: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_tracking_backend() -> TrackingBackend {
    TrackingBackend::Remote
}

fn default_tracking_endpoint() -> String {
    "https://api.smith.langchain.com".to_string()
}

fn default_endpoint_env() -> String {
    "LANGCHAIN_ENDPOINT".to_string()
}

fn default_tracking_api_key_env() -> String {
    "LANGCHAIN_API_KEY".to_string()
}

fn default_project_env() -> String {
    "LANGCHAIN_PROJECT".to_string()
}

fn default_dataset_prefix() -> String {
    "Retrieval QA Questions".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            backend: default_tracking_backend(),
            endpoint: default_tracking_endpoint(),
            endpoint_env: default_endpoint_env(),
            api_key_env: default_tracking_api_key_env(),
            project_env: default_project_env(),
            dataset_prefix: default_dataset_prefix(),
            timeout_secs: default_request_timeout(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    OpenAI {
        /// Environment variable containing API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();
    providers.insert(
        default_provider_name(),
        ProviderConfig::OpenAI {
            api_key_env: default_openai_key_env(),
            api_base: default_openai_base(),
        },
    );
    providers
}

fn default_provider_name() -> String {
    "openai".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    #[serde(default = "default_provider_name")]
    pub provider: String,

    pub model: String,

    #[serde(default)]
    pub temperature: f32,
}

impl ModelConfig {
    fn new(model: &str) -> Self {
        Self {
            provider: default_provider_name(),
            model: model.to_string(),
            temperature: 0.0,
        }
    }
}

/// The two chat models the workflow needs: one answers, one grades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_generator_model")]
    pub generator: ModelConfig,

    #[serde(default = "default_grader_model")]
    pub grader: ModelConfig,
}

fn default_generator_model() -> ModelConfig {
    ModelConfig::new("gpt-3.5-turbo-16k")
}

fn default_grader_model() -> ModelConfig {
    ModelConfig::new("gpt-4")
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            generator: default_generator_model(),
            grader: default_grader_model(),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_provider_name")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts sent per embedding request
    #[serde(default = "default_embedding_batch")]
    pub batch_size: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_embedding_batch() -> usize {
    64
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider_name(),
            model: default_embedding_model(),
            batch_size: default_embedding_batch(),
        }
    }
}

// ============= Ingest Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_root_url")]
    pub root_url: String,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Pause between page fetches
    #[serde(default)]
    pub delay_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Chunk budget in tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_root_url() -> String {
    "https://docs.smith.langchain.com".to_string()
}

fn default_max_depth() -> usize {
    2
}

fn default_max_pages() -> usize {
    200
}

fn default_user_agent() -> String {
    format!("ragcheck/{}", env!("CARGO_PKG_VERSION"))
}

fn default_chunk_size() -> usize {
    2000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root_url: default_root_url(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            delay_ms: 0,
            timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

// ============= Retrieval Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: default_top_k() }
    }
}

// ============= Evaluation Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Prompt variants evaluated by `ragcheck eval` when none are given
    #[serde(default = "default_variants")]
    pub variants: Vec<String>,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_feedback_key")]
    pub feedback_key: String,

    /// JSON file with `{question, answer}` pairs replacing the built-in examples
    pub examples_file: Option<PathBuf>,
}

fn default_variants() -> Vec<String> {
    vec!["baseline".to_string(), "strict".to_string()]
}

fn default_max_concurrency() -> usize {
    4
}

fn default_feedback_key() -> String {
    "correctness".to_string()
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            max_concurrency: default_max_concurrency(),
            feedback_key: default_feedback_key(),
            examples_file: None,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Provider '{0}' referenced by '{1}' does not exist")]
    MissingProvider(String, String),

    #[error("Unknown prompt variant '{0}'")]
    UnknownVariant(String),
}

impl RagcheckConfig {
    /// Load configuration from a TOML file and validate its structure.
    ///
    /// Environment variables are checked separately by [`validate_env`](Self::validate_env)
    /// since offline commands (`config`, `ingest`) do not need every secret.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: RagcheckConfig = toml::from_str(&content)?;

        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(p)) => {
                info!(
                    "No configuration at {}, using built-in defaults",
                    p.display()
                );
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_provider(&self.models.generator.provider, "models.generator")?;
        self.check_provider(&self.models.grader.provider, "models.grader")?;
        self.check_provider(&self.embeddings.provider, "embeddings")?;

        for (section, model) in [
            ("models.generator", &self.models.generator),
            ("models.grader", &self.models.grader),
        ] {
            if model.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{}: model name must not be empty",
                    section
                )));
            }
        }

        if self.embeddings.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embeddings.batch_size must be at least 1".to_string(),
            ));
        }

        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.ingest.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_pages must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.ingest.root_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "ingest.root_url '{}' is not a valid URL: {}",
                self.ingest.root_url, e
            ))
        })?;

        if self.retrieval.k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.k must be at least 1".to_string(),
            ));
        }

        if self.evaluation.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "evaluation.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.evaluation.variants.is_empty() {
            return Err(ConfigError::ValidationError(
                "evaluation.variants must name at least one prompt variant".to_string(),
            ));
        }
        self.prompt_variants()?;

        Ok(())
    }

    /// Check that every environment variable the configured services need is set
    pub fn validate_env(&self) -> Result<(), ConfigError> {
        for name in self.used_providers() {
            if let Some(ProviderConfig::OpenAI { api_key_env, .. }) = self.providers.get(name) {
                self.validate_env_var(api_key_env)?;
            }
        }

        if self.tracking.backend == TrackingBackend::Remote {
            self.validate_env_var(&self.tracking.api_key_env)?;
        }

        Ok(())
    }

    fn check_provider(&self, provider: &str, section: &str) -> Result<(), ConfigError> {
        if !self.providers.contains_key(provider) {
            return Err(ConfigError::MissingProvider(
                provider.to_string(),
                section.to_string(),
            ));
        }
        Ok(())
    }

    fn used_providers(&self) -> Vec<&str> {
        let mut names = vec![
            self.models.generator.provider.as_str(),
            self.models.grader.provider.as_str(),
            self.embeddings.provider.as_str(),
        ];
        names.sort_unstable();
        names.dedup();
        names
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    /// Tracking endpoint, preferring the environment over the file
    pub fn tracking_endpoint(&self) -> String {
        self.resolve_env(&self.tracking.endpoint_env)
            .unwrap_or_else(|| self.tracking.endpoint.clone())
    }

    /// Get the tracking API key from the environment
    pub fn tracking_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.tracking.api_key_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.tracking.api_key_env.clone()))
    }

    /// Project that ad-hoc `ask` runs are logged to, if one is configured
    pub fn tracking_project(&self) -> Option<String> {
        self.resolve_env(&self.tracking.project_env)
    }

    /// Get provider by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Parse the configured evaluation variants
    pub fn prompt_variants(&self) -> Result<Vec<PromptVariant>, ConfigError> {
        self.evaluation
            .variants
            .iter()
            .map(|v| PromptVariant::from_str(v).map_err(|_| ConfigError::UnknownVariant(v.clone())))
            .collect()
    }

    /// Render the configuration back to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationError(format!("Failed to serialize config: {}", e)))
    }
}
