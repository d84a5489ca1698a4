// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{BooklistError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub prompt: PromptConfig,
    pub schema: SchemaConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptConfig {
    pub topic: String,
    pub count: Option<usize>,
}

/// Tag vocabulary shared by the prompt and the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaConfig {
    pub root_tag: String,
    #[serde(default)]
    pub root_aliases: Vec<String>,
    pub record_tag: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub pretty: bool,
    pub json: bool,
}

impl Config {
    /// Layers built-in defaults, an optional TOML file and `BOOKLIST__*`
    /// environment variables, in that order.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but leaves the backend section unchecked for commands
    /// that never contact a model.
    pub fn load_offline(path: Option<&Path>) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate_offline()?;
        Ok(config)
    }

    fn read(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| BooklistError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("BOOKLIST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| BooklistError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| BooklistError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            backend: BackendConfig {
                provider: Provider::Ollama,
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
                timeout_secs: 120,
                api_key: None,
                temperature: None,
            },
            prompt: PromptConfig {
                topic: "a list of buddhist books".to_string(),
                count: None,
            },
            schema: SchemaConfig::default(),
            output: OutputConfig {
                pretty: true,
                json: false,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_backend()?;
        self.validate_offline()
    }

    pub fn validate_backend(&self) -> Result<()> {
        Validator::validate_url(&self.backend.endpoint)
            .map_err(|e| BooklistError::Config(e.to_string()))?;

        if self.backend.model.trim().is_empty() {
            return Err(BooklistError::Config("model must not be empty".to_string()));
        }

        if self.backend.timeout_secs == 0 {
            return Err(BooklistError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.backend.provider == Provider::OpenAi && self.backend.api_key.is_none() {
            return Err(BooklistError::Config(
                "api_key is required for the openai provider".to_string(),
            ));
        }

        Ok(())
    }

    /// Prompt and schema checks, all that prompt building and parsing need.
    pub fn validate_offline(&self) -> Result<()> {
        if let Some(count) = self.prompt.count {
            Validator::validate_count(count).map_err(|e| BooklistError::Config(e.to_string()))?;
        }

        self.schema.validate()
    }
}

impl SchemaConfig {
    pub fn validate(&self) -> Result<()> {
        let tags = std::iter::once(&self.root_tag)
            .chain(&self.root_aliases)
            .chain(std::iter::once(&self.record_tag))
            .chain(&self.fields);

        for tag in tags {
            Validator::validate_tag_name(tag).map_err(|e| BooklistError::Config(e.to_string()))?;
        }

        if self.fields.is_empty() {
            return Err(BooklistError::Config(
                "schema needs at least one field".to_string(),
            ));
        }

        Ok(())
    }

    /// Root tag followed by its aliases, lowercased.
    pub fn root_candidates(&self) -> Vec<String> {
        std::iter::once(&self.root_tag)
            .chain(&self.root_aliases)
            .map(|tag| tag.to_ascii_lowercase())
            .collect()
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            root_tag: "booklist".to_string(),
            root_aliases: vec!["books".to_string()],
            record_tag: "book".to_string(),
            fields: ["title", "author", "publication_year", "genre", "isbn"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
