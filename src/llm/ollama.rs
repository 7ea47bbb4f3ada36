use crate::llm::client::LLMClient;
use crate::types::{AppError, ChatMessage, MessageRole, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage as OllamaMessage, request::ChatMessageRequest},
    models::ModelOptions,
};

pub struct OllamaClient {
    client: Ollama,
    model: String,
    temperature: Option<f32>,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let url = reqwest::Url::parse(&base_url)
            .map_err(|e| AppError::Internal(format!("Invalid Ollama URL '{}': {}", base_url, e)))?;

        Ok(Self {
            client: Ollama::from_url(url),
            model,
            temperature: None,
        })
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

fn to_ollama_message(message: &ChatMessage) -> OllamaMessage {
    let content = message.content.clone();
    match message.role {
        MessageRole::System => OllamaMessage::system(content),
        MessageRole::User => OllamaMessage::user(content),
        MessageRole::Assistant => OllamaMessage::assistant(content),
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String> {
        let chat_messages: Vec<OllamaMessage> = messages.iter().map(to_ollama_message).collect();

        let mut request = ChatMessageRequest::new(self.model.clone(), chat_messages);
        if let Some(temperature) = self.temperature {
            request = request.options(ModelOptions::default().temperature(temperature));
        }

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::UpstreamGeneration(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_https_url_with_port() {
        let client =
            OllamaClient::new("https://gpu-box:8443".to_string(), "llama3.2".to_string()).unwrap();
        assert_eq!(client.model_name(), "llama3.2");
    }

    #[test]
    fn test_url_parsing_rejects_garbage() {
        assert!(OllamaClient::new("not a url".to_string(), "llama3.2".to_string()).is_err());
    }
}
