// file: src/models/completion.rs
// description: raw model completion and extracted fragment models
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::ops::Range;

/// Text exactly as the backend returned it.
#[derive(Debug, Clone, Serialize)]
pub struct RawCompletion {
    pub text: String,
    pub model: String,
    pub content_hash: String,
    pub received_at: DateTime<Utc>,
}

impl RawCompletion {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        let text = text.into();
        let content_hash = Self::compute_hash(&text);

        Self {
            text,
            model: model.into(),
            content_hash,
            received_at: Utc::now(),
        }
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn short_hash(&self) -> &str {
        &self.content_hash[..12]
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Substring of a completion believed to hold the XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFragment {
    pub text: String,
    /// Lowercased name of the root element that was matched or synthesized.
    pub root_tag: String,
    /// Byte span inside the fence-unwrapped completion text.
    pub span: Range<usize>,
    pub closed: bool,
    pub from_code_fence: bool,
    pub synthetic_root: bool,
}
