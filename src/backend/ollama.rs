// file: src/backend/ollama.rs
// description: Ollama chat API client for non-streaming completions
// reference: https://github.com/ollama/ollama/blob/main/docs/api.md

use super::{ChatMessage, CompletionBackend};
use crate::config::BackendConfig;
use crate::error::{BooklistError, Result};
use crate::models::RawCompletion;
use crate::prompt::Prompt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BooklistError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.endpoint)
    }

    fn request_body<'a>(&'a self, prompt: &'a Prompt) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model,
            messages: prompt.messages(),
            stream: false,
            options: self
                .temperature
                .map(|temperature| OllamaOptions { temperature }),
        }
    }
}

impl CompletionBackend for OllamaBackend {
    async fn complete(&self, prompt: &Prompt) -> Result<RawCompletion> {
        let url = self.chat_url();

        debug!("Requesting completion from Ollama at {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| BooklistError::Backend(format!("Failed to reach Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BooklistError::Backend(format!(
                "Ollama request failed with status {}: {}",
                status, error_text
            )));
        }

        let chat: OllamaChatResponse = response.json().await.map_err(|e| {
            BooklistError::Backend(format!("Failed to parse Ollama response: {}", e))
        })?;

        debug!("Received {} chars from Ollama", chat.message.content.len());

        Ok(RawCompletion::new(chat.message.content, self.model.clone()))
    }
}
