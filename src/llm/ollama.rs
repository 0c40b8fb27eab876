use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};

const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_base_url(&base_url);
        let client = Ollama::new(host, port);

        Ok(Self { client, model })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

/// Split `scheme://host:port` into the `(scheme://host, port)` pair Ollama expects.
fn split_base_url(base_url: &str) -> (String, u16) {
    let (scheme, rest) = match base_url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", base_url),
    };
    let authority = rest.split('/').next().unwrap_or(rest);

    match authority.rsplit_once(':') {
        Some((host, port)) => (
            format!("{}://{}", scheme, host),
            port.parse().unwrap_or(DEFAULT_OLLAMA_PORT),
        ),
        None if authority.is_empty() => (
            format!("{}://localhost", scheme),
            DEFAULT_OLLAMA_PORT,
        ),
        None => (format!("{}://{}", scheme, authority), DEFAULT_OLLAMA_PORT),
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_base_url_with_port() {
        assert_eq!(
            split_base_url("http://localhost:11434"),
            ("http://localhost".to_string(), 11434)
        );
        assert_eq!(
            split_base_url("https://ollama.internal:8080/"),
            ("https://ollama.internal".to_string(), 8080)
        );
    }

    #[test]
    fn test_split_base_url_defaults() {
        assert_eq!(
            split_base_url("gpu-box"),
            ("http://gpu-box".to_string(), DEFAULT_OLLAMA_PORT)
        );
        assert_eq!(
            split_base_url("http://"),
            ("http://localhost".to_string(), DEFAULT_OLLAMA_PORT)
        );
    }
}
