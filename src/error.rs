// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BooklistError>;

#[derive(Error, Debug)]
pub enum BooklistError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BooklistError {
    /// Short, stable name of the error kind for log lines and exit reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Backend(_) => "BackendError",
            Self::Extraction(_) => "ExtractionError",
            Self::Validation(_) => "ValidationError",
            Self::Io(_) => "IoError",
            Self::Serialization(_) => "SerializationError",
        }
    }
}

/// Non-fatal problems met while walking the parsed tree. These never abort a
/// run; they travel next to the records that did parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartialParseError {
    #[error("skipped <{tag}> element #{position}: {reason}")]
    SkippedRecord {
        tag: String,
        position: usize,
        reason: String,
    },

    #[error("recovered unclosed <{field}> in record #{position}")]
    UnclosedField { field: String, position: usize },

    #[error("recovered <{tag}> element #{position} nested inside an unclosed record")]
    NestedRecord { tag: String, position: usize },
}

impl PartialParseError {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::SkippedRecord { .. })
    }
}
