use crate::llm::client::{LLMClient, TextStream};
use crate::types::{AppError, ChatMessage, MessageRole, Result};
use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage as OllamaMessage, request::ChatMessageRequest},
    models::ModelOptions,
};
use tracing::debug;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    temperature: f32,
}

/// Split `http://host:port` into the parts `Ollama::new` expects
pub(crate) fn parse_host_port(base_url: &str) -> (String, u16) {
    let url_parts: Vec<&str> = base_url.split("://").collect();
    if url_parts.len() == 2 {
        let (scheme, rest) = (url_parts[0], url_parts[1].trim_end_matches('/'));
        let host_port: Vec<&str> = rest.split(':').collect();
        let host = format!("{}://{}", scheme, host_port[0]);
        let port = if host_port.len() == 2 {
            host_port[1].parse().unwrap_or(11434)
        } else {
            11434
        };
        (host, port)
    } else {
        ("http://localhost".to_string(), 11434)
    }
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String, temperature: f32) -> Result<Self> {
        let (host, port) = parse_host_port(&base_url);
        let client = Ollama::new(host, port);

        Ok(Self {
            client,
            model,
            temperature,
        })
    }

    fn build_request(&self, messages: &[ChatMessage]) -> ChatMessageRequest {
        let chat_messages: Vec<OllamaMessage> = messages
            .iter()
            .map(|message| match message.role {
                MessageRole::System => OllamaMessage::system(message.content.clone()),
                MessageRole::User => OllamaMessage::user(message.content.clone()),
            })
            .collect();

        ChatMessageRequest::new(self.model.clone(), chat_messages)
            .options(ModelOptions::default().temperature(self.temperature))
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_messages(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.build_request(messages);
        debug!(model = %self.model, messages = messages.len(), "Ollama chat");

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }

    async fn stream_with_messages(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let request = self.build_request(messages);
        debug!(model = %self.model, messages = messages.len(), "Ollama chat stream");

        let mut stream_response = self
            .client
            .send_chat_messages_stream(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama stream error: {}", e)))?;

        let output_stream = stream! {
            while let Some(chunk_result) = stream_response.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        let content = chunk.message.content;
                        if !content.is_empty() {
                            yield Ok(content);
                        }
                    }
                    Err(_) => {
                        yield Err(AppError::LLM("Stream chunk error".to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::new(Box::pin(output_stream)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_parsing_full() {
        let (host, port) = parse_host_port("http://localhost:11434");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn test_url_parsing_no_port() {
        let (host, port) = parse_host_port("http://localhost/");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn test_url_parsing_custom_port() {
        let (host, port) = parse_host_port("http://192.168.1.100:8080");
        assert_eq!(host, "http://192.168.1.100");
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_url_parsing_garbage_falls_back() {
        let (host, port) = parse_host_port("not a url");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }
}
