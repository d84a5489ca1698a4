// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod backend;
pub mod config;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod utils;

pub use backend::{Backend, CannedBackend, CompletionBackend, OllamaBackend, OpenAiBackend};
pub use config::{BackendConfig, Config, OutputConfig, PromptConfig, Provider, SchemaConfig};
pub use error::{BooklistError, PartialParseError, Result};
pub use exporter::{ExportedBooklist, JsonExporter};
pub use extractor::{BookExtractor, BookParser, Cleaner, FragmentLocator, ParseOutcome};
pub use models::{BookList, BookRecord, ExtractedFragment, RawCompletion};
pub use pipeline::{BooklistPipeline, PipelineReport, RunStats, StageProgress, process_completion};
pub use prompt::{Prompt, PromptBuilder};
pub use utils::Validator;
