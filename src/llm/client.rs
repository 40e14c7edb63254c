//! LLM Client abstractions and provider management
//!
//! Both chat models the workflow uses (the answer generator and the grader)
//! sit behind [`LLMClient`]:
//! - **OpenAI**: OpenAI API and compatible endpoints, with streaming
//! - **Ollama**: Local inference with streaming

use crate::types::{AppError, ChatMessage, Result};
use crate::utils::toml_config::{ModelConfig, ProviderConfig};
use async_trait::async_trait;
use futures::StreamExt;

/// Stream of text deltas produced by a chat model
pub type TextStream = Box<dyn futures::Stream<Item = Result<String>> + Send + Unpin>;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a single user prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_messages(&[ChatMessage::user(prompt)])
            .await
    }

    /// Generate a completion from an ordered list of messages
    async fn generate_with_messages(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut stream = self.stream_with_messages(messages).await?;
        let mut output = String::new();
        while let Some(delta) = stream.next().await {
            output.push_str(&delta?);
        }
        Ok(output)
    }

    /// Stream a completion for an ordered list of messages
    async fn stream_with_messages(&self, messages: &[ChatMessage]) -> Result<TextStream>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4".to_string(),
    ///     temperature: 0.0,
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        temperature: f32,
    },

    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3.2".to_string(),
    ///     temperature: 0.0,
    /// };
    /// ```
    Ollama {
        base_url: String,
        model: String,
        temperature: f32,
    },
}

impl Provider {
    /// Resolve a model entry against its provider, reading secrets from the environment
    pub fn from_model_config(model: &ModelConfig, provider: &ProviderConfig) -> Result<Self> {
        match provider {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
            } => {
                let api_key = std::env::var(api_key_env).map_err(|_| {
                    AppError::Configuration(format!(
                        "Environment variable '{}' is not set (needed by model '{}')",
                        api_key_env, model.model
                    ))
                })?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.model.clone(),
                    temperature: model.temperature,
                })
            }
            ProviderConfig::Ollama { base_url } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.model.clone(),
                temperature: model.temperature,
            }),
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's Cargo feature is disabled or the
    /// client cannot be constructed.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                temperature,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *temperature,
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                temperature,
            } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone(), *temperature)
                    .await?,
            )),

            #[allow(unreachable_patterns)]
            other => Err(AppError::Configuration(format!(
                "{} support is not compiled in; rebuild with the '{}' feature",
                other.name(),
                other.name().to_lowercase()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Model identifier this provider will be asked for
    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}

/// Configuration-based client factory
///
/// Builds the generator and grader clients from `ragcheck.toml`.
pub struct LLMClientFactory {
    providers: std::collections::HashMap<String, ProviderConfig>,
}

impl LLMClientFactory {
    pub fn new(providers: std::collections::HashMap<String, ProviderConfig>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &crate::utils::toml_config::RagcheckConfig) -> Self {
        Self::new(config.providers.clone())
    }

    /// Resolve a model entry to a provider without connecting
    pub fn provider_for(&self, model: &ModelConfig) -> Result<Provider> {
        let provider_config = self.providers.get(&model.provider).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' referenced by model '{}' not found",
                model.provider, model.model
            ))
        })?;
        Provider::from_model_config(model, provider_config)
    }

    /// Create a client for a model entry
    pub async fn create_client(&self, model: &ModelConfig) -> Result<Box<dyn LLMClient>> {
        self.provider_for(model)?.create_client().await
    }
}
