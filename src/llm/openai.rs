use crate::llm::client::{LLMClient, TextStream};
use crate::types::{AppError, ChatMessage, MessageRole, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, temperature: f32) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
            temperature,
        }
    }

    fn build_request(&self, messages: &[ChatMessage]) -> Result<CreateChatCompletionRequest> {
        let chat_messages: Vec<ChatCompletionRequestMessage> = messages
            .iter()
            .map(|message| match message.role {
                MessageRole::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(message.content.clone()),
                ),
                MessageRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(message.content.clone()),
                ),
            })
            .collect();

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(chat_messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build request: {}", e)))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_messages(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.build_request(messages)?;
        debug!(model = %self.model, messages = messages.len(), "OpenAI chat completion");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
    }

    async fn stream_with_messages(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let request = self.build_request(messages)?;
        debug!(model = %self.model, messages = messages.len(), "OpenAI chat stream");

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        let result_stream = async_stream::stream! {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(response) => {
                        for choice in response.choices {
                            if let Some(content) = choice.delta.content {
                                yield Ok(content);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(AppError::LLM(format!("Stream error: {}", e)));
                        break;
                    }
                }
            }
        };

        Ok(Box::new(Box::pin(result_stream)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_keeps_order_and_temperature() {
        let client = OpenAIClient::new(
            "test-key".to_string(),
            "http://localhost:1/v1".to_string(),
            "gpt-3.5-turbo-16k".to_string(),
            0.0,
        );

        let request = client
            .build_request(&[
                ChatMessage::system("instructions"),
                ChatMessage::system("context"),
                ChatMessage::user("question"),
            ])
            .unwrap();

        assert_eq!(request.model, "gpt-3.5-turbo-16k");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.messages.len(), 3);
        assert!(matches!(
            request.messages[2],
            ChatCompletionRequestMessage::User(_)
        ));
    }
}
