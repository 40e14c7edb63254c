//! Embedding API clients.
//!
//! Chunks and queries are embedded remotely through an OpenAI-compatible
//! endpoint or a local Ollama server.

use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingsConfig, ProviderConfig, RagcheckConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns texts into vectors, one vector per input text, in input order.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("Embedding API returned no vectors".to_string()))
    }

    fn model_name(&self) -> &str;
}

// ============= OpenAI =============

#[cfg(feature = "openai")]
pub struct OpenAIEmbeddings {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

#[cfg(feature = "openai")]
impl OpenAIEmbeddings {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: async_openai::Client::with_config(config),
            model,
        }
    }
}

#[cfg(feature = "openai")]
#[async_trait]
impl EmbeddingClient for OpenAIEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = async_openai::types::CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::Embedding(format!("OpenAI embeddings error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        if data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Ollama =============

#[cfg(feature = "ollama")]
pub struct OllamaEmbeddings {
    client: ollama_rs::Ollama,
    model: String,
}

#[cfg(feature = "ollama")]
impl OllamaEmbeddings {
    pub fn new(base_url: &str, model: String) -> Self {
        let (host, port) = crate::llm::ollama::parse_host_port(base_url);
        Self {
            client: ollama_rs::Ollama::new(host, port),
            model,
        }
    }
}

#[cfg(feature = "ollama")]
#[async_trait]
impl EmbeddingClient for OllamaEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        use ollama_rs::generation::embeddings::request::{
            EmbeddingsInput, GenerateEmbeddingsRequest,
        };

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = GenerateEmbeddingsRequest::new(
            self.model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| AppError::Embedding(format!("Ollama embeddings error: {}", e)))?;

        Ok(response.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Provider selection =============

/// Build the embedding client named by `[embeddings]`
pub fn create_embedding_client(config: &RagcheckConfig) -> Result<Arc<dyn EmbeddingClient>> {
    let embeddings: &EmbeddingsConfig = &config.embeddings;
    let provider = config.get_provider(&embeddings.provider).ok_or_else(|| {
        AppError::Configuration(format!(
            "Provider '{}' referenced by [embeddings] not found",
            embeddings.provider
        ))
    })?;

    match provider {
        #[cfg(feature = "openai")]
        ProviderConfig::OpenAI {
            api_key_env,
            api_base,
        } => {
            let api_key = config.resolve_env(api_key_env).ok_or_else(|| {
                AppError::Configuration(format!(
                    "Environment variable '{}' is not set (needed for embeddings)",
                    api_key_env
                ))
            })?;
            Ok(Arc::new(OpenAIEmbeddings::new(
                api_key,
                api_base.clone(),
                embeddings.model.clone(),
            )))
        }

        #[cfg(feature = "ollama")]
        ProviderConfig::Ollama { base_url } => Ok(Arc::new(OllamaEmbeddings::new(
            base_url,
            embeddings.model.clone(),
        ))),

        #[allow(unreachable_patterns)]
        _ => Err(AppError::Configuration(format!(
            "Embedding provider '{}' is not compiled in",
            embeddings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_embedding_provider() {
        let mut config = RagcheckConfig::default();
        config.embeddings.provider = "missing".to_string();

        let result = create_embedding_client(&config);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_ollama_embedding_client() {
        let mut config = RagcheckConfig::default();
        config.providers.insert(
            "local".to_string(),
            ProviderConfig::Ollama {
                base_url: "http://localhost:11434".to_string(),
            },
        );
        config.embeddings.provider = "local".to_string();
        config.embeddings.model = "nomic-embed-text".to_string();

        let client = create_embedding_client(&config).unwrap();
        assert_eq!(client.model_name(), "nomic-embed-text");
    }
}
