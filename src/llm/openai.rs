use crate::llm::client::LLMClient;
use crate::types::{AppError, ChatMessage, MessageRole, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, timeout: Duration) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(AppError::Internal("Missing generation model name".into()));
        }

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base.trim_end_matches('/'));

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
            model,
            temperature: None,
        })
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

fn to_request_message(message: &ChatMessage) -> ChatCompletionRequestMessage {
    let content = message.content.clone();
    match message.role {
        MessageRole::System => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(content))
        }
        MessageRole::User => {
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(content))
        }
        MessageRole::Assistant => ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessage::from(content),
        ),
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages.iter().map(to_request_message).collect::<Vec<_>>());
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }

        let request = args
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::UpstreamGeneration(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::UpstreamGeneration("No response from OpenAI".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
