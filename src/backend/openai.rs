// file: src/backend/openai.rs
// description: OpenAI-compatible chat completions client (Groq and friends)
// reference: https://console.groq.com/docs/api-reference#chat-create

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
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            BooklistError::Config("api_key is required for the openai provider".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BooklistError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &Prompt) -> Result<RawCompletion> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: prompt.messages(),
            temperature: self.temperature,
        };

        debug!(
            "Requesting chat completion from {} (model {})",
            self.endpoint, self.model
        );

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                BooklistError::Backend(format!("Failed to send chat completion request: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BooklistError::Backend(format!(
                "Chat completion request failed with status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            BooklistError::Backend(format!("Failed to parse chat completion response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                BooklistError::Backend("No completion content returned".to_string())
            })?;

        Ok(RawCompletion::new(content, self.model.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_server::respond_once;
    use crate::config::{Config, Provider};

    fn config() -> BackendConfig {
        let mut config = Config::default_config().backend;
        config.provider = Provider::OpenAi;
        config.endpoint = "https://api.groq.com/openai/v1/".to_string();
        config.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_requires_api_key() {
        let mut config = config();
        config.api_key = None;
        assert!(matches!(
            OpenAiBackend::new(&config),
            Err(BooklistError::Config(_))
        ));
    }

    #[test]
    fn test_completions_url() {
        let backend = OpenAiBackend::new(&config()).unwrap();
        assert_eq!(
            backend.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"<books></books>"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("<books></books>")
        );
    }

    #[tokio::test]
    async fn test_error_status_is_backend_error() {
        let mut config = config();
        config.endpoint = respond_once("429 Too Many Requests", r#"{"error":{"message":"rate limited"}}"#).await;
        let prompt = Prompt {
            system: "sys".to_string(),
            user: "usr".to_string(),
        };

        match OpenAiBackend::new(&config).unwrap().complete(&prompt).await {
            Err(BooklistError::Backend(message)) => {
                assert!(message.contains("429"));
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected a backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_backend_error() {
        let mut config = config();
        config.endpoint = respond_once("200 OK", r#"{"id":"x","choices":[]}"#).await;
        let prompt = Prompt {
            system: "sys".to_string(),
            user: "usr".to_string(),
        };

        let result = OpenAiBackend::new(&config).unwrap().complete(&prompt).await;
        assert!(matches!(result, Err(BooklistError::Backend(_))));
    }
}
