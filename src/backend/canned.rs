// file: src/backend/canned.rs
// description: fixed-response backend for tests and offline runs

use super::CompletionBackend;
use crate::error::{BooklistError, Result};
use crate::models::RawCompletion;
use crate::prompt::Prompt;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Returns the same reply for every prompt and remembers the prompts it saw.
#[derive(Debug)]
pub struct CannedBackend {
    reply: Reply,
    model: String,
    seen: Mutex<Vec<Prompt>>,
}

impl CannedBackend {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_reply(Reply::Text(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Failure(message.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            model: "canned".to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

impl CompletionBackend for CannedBackend {
    async fn complete(&self, prompt: &Prompt) -> Result<RawCompletion> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(prompt.clone());
        }

        match &self.reply {
            Reply::Text(text) => Ok(RawCompletion::new(text.clone(), self.model.clone())),
            Reply::Failure(message) => Err(BooklistError::Backend(message.clone())),
        }
    }
}
