use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::decoder::decode_stream;
use super::errors::{LlmError, LlmResult};
use super::LanguageModel;

/// Connection and sampling settings for the chat endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Base URL; requests go to `{base_url}/chat`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/api".to_string(),
            model: "qwen3:30b-a3b".to_string(),
            temperature: 0.5,
            max_tokens: 2048,
            system_prompt: "You are an expert in your given field.".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Streaming chat client for Ollama-style endpoints
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
}

impl OllamaClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: true,
        };

        debug!(url = %self.chat_url(), model = %self.config.model, "Sending prompt to model");

        let response = self.client.post(self.chat_url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = decode_stream(response.bytes_stream())
            .await
            .map_err(|e| LlmError::Stream(e.to_string()))?;

        info!(chars = text.len(), "Model generated a response");
        Ok(text)
    }
}
