// file: src/backend/mod.rs
// description: completion backend capability and provider selection
// reference: internal module structure

pub mod canned;
pub mod ollama;
pub mod openai;

pub use canned::CannedBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::config::{BackendConfig, Provider};
use crate::error::Result;
use crate::models::RawCompletion;
use crate::prompt::Prompt;
use serde::Serialize;
use std::future::Future;

/// Anything that turns a prompt into completion text.
pub trait CompletionBackend {
    fn complete(&self, prompt: &Prompt) -> impl Future<Output = Result<RawCompletion>> + Send;
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl Prompt {
    pub(crate) fn messages(&self) -> Vec<ChatMessage<'_>> {
        vec![
            ChatMessage {
                role: "system",
                content: &self.system,
            },
            ChatMessage {
                role: "user",
                content: &self.user,
            },
        ]
    }
}

/// Backend chosen at runtime from configuration.
pub enum Backend {
    Ollama(OllamaBackend),
    OpenAi(OpenAiBackend),
}

impl Backend {
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        match config.provider {
            Provider::Ollama => Ok(Self::Ollama(OllamaBackend::new(config)?)),
            Provider::OpenAi => Ok(Self::OpenAi(OpenAiBackend::new(config)?)),
        }
    }
}

impl CompletionBackend for Backend {
    async fn complete(&self, prompt: &Prompt) -> Result<RawCompletion> {
        match self {
            Self::Ollama(backend) => backend.complete(prompt).await,
            Self::OpenAi(backend) => backend.complete(prompt).await,
        }
    }
}
