// file: src/pipeline/orchestrator.rs
// description: runs prompt building, completion and extraction in order
// reference: single linear pipeline with per-stage logging

use crate::backend::{Backend, CompletionBackend};
use crate::config::Config;
use crate::error::{BooklistError, Result};
use crate::extractor::{BookExtractor, ParseOutcome};
use crate::models::RawCompletion;
use crate::pipeline::progress::{RunStats, StageProgress};
use crate::prompt::{Prompt, PromptBuilder};
use crate::utils::Validator;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub topic: String,
    pub prompt: Prompt,
    pub completion: RawCompletion,
    pub outcome: ParseOutcome,
    pub stats: RunStats,
}

pub struct BooklistPipeline<B> {
    backend: B,
    builder: PromptBuilder,
    extractor: BookExtractor,
    show_progress: bool,
}

impl BooklistPipeline<Backend> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = Backend::from_config(&config.backend)?;
        let builder = PromptBuilder::new(config.schema.clone(), config.prompt.topic.clone())
            .with_count(config.prompt.count);
        let extractor = BookExtractor::new(&config.schema)?;

        Ok(Self::new(backend, builder, extractor))
    }
}

impl<B: CompletionBackend> BooklistPipeline<B> {
    pub fn new(backend: B, builder: PromptBuilder, extractor: BookExtractor) -> Self {
        Self {
            backend,
            builder,
            extractor,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, visible: bool) -> Self {
        self.show_progress = visible;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prompt(&self) -> Prompt {
        self.builder.build()
    }

    pub async fn run(&self) -> Result<PipelineReport> {
        let progress = StageProgress::new(self.show_progress);

        progress.stage(1, "Building prompt");
        let prompt = self.builder.build();
        info!("Requesting book list for topic: {}", self.builder.topic());
        debug!("System prompt:\n{}", prompt.system);

        progress.stage(2, "Waiting for model");
        let started = Instant::now();
        let completion = self.backend.complete(&prompt).await?;
        let backend_ms = started.elapsed().as_millis() as u64;

        info!(
            "Received {} chars from {} in {} ms (sha256 {})",
            completion.len(),
            completion.model,
            backend_ms,
            completion.short_hash()
        );

        progress.stage(3, "Extracting books");
        let (outcome, mut stats) = self.process(&completion)?;
        stats.backend_ms = backend_ms;
        progress.finish();

        Ok(PipelineReport {
            topic: self.builder.topic().to_string(),
            prompt,
            completion,
            outcome,
            stats,
        })
    }

    /// Extraction only, for a completion obtained elsewhere.
    pub fn process(&self, completion: &RawCompletion) -> Result<(ParseOutcome, RunStats)> {
        process_completion(&self.extractor, completion)
    }
}

/// Locates, cleans and parses one completion, timing the work. Needs no
/// backend, so saved responses can be replayed offline.
pub fn process_completion(
    extractor: &BookExtractor,
    completion: &RawCompletion,
) -> Result<(ParseOutcome, RunStats)> {
    let started = Instant::now();

    Validator::validate_content_not_empty(&completion.text)
        .map_err(|_| BooklistError::Extraction("model output is empty".to_string()))?;

    let fragment = extractor.locate(&completion.text)?;
    let outcome = extractor.parse_fragment(&fragment);

    let stats = RunStats {
        raw_chars: completion.len(),
        fragment_chars: fragment.text.len(),
        books_parsed: outcome.books.len(),
        records_skipped: outcome.skipped(),
        issues: outcome.issues.len(),
        backend_ms: 0,
        parse_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        "Markup is {:.0}% of the output, {:.1}% of records recognized",
        stats.fragment_ratio() * 100.0,
        stats.success_rate()
    );

    Ok((outcome, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CannedBackend;
    use crate::config::SchemaConfig;
    use pretty_assertions::assert_eq;

    fn pipeline(backend: CannedBackend) -> BooklistPipeline<CannedBackend> {
        let schema = SchemaConfig::default();
        BooklistPipeline::new(
            backend,
            PromptBuilder::new(schema.clone(), "a list of buddhist books").with_count(Some(2)),
            BookExtractor::new(&schema).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let reply = "Here is the list:\n```xml\n<booklist>\n<book><title>Zen Mind, Beginner's Mind</title><author>Shunryu Suzuki</author></book>\n<book><title>Being Peace</title><author>Thich Nhat Hanh</author></book>\n</booklist>\n```";
        let pipeline = pipeline(CannedBackend::new(reply));

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.topic, "a list of buddhist books");
        assert_eq!(report.outcome.books.len(), 2);
        assert_eq!(report.outcome.books[1].author(), Some("Thich Nhat Hanh"));
        assert_eq!(report.stats.books_parsed, 2);
        assert_eq!(report.stats.raw_chars, reply.len());
        assert!(report.stats.fragment_chars < reply.len());

        let sent = pipeline.backend().prompts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].system.contains("exactly 2 books"));
        assert_eq!(sent[0], report.prompt);
    }

    #[tokio::test]
    async fn test_backend_failure_aborts() {
        let pipeline = pipeline(CannedBackend::failing("connection refused"));

        let result = pipeline.run().await;
        assert!(matches!(result, Err(BooklistError::Backend(_))));
    }

    #[tokio::test]
    async fn test_no_xml_aborts() {
        let pipeline = pipeline(CannedBackend::new("As an AI model I recommend reading more."));

        let result = pipeline.run().await;
        assert!(matches!(result, Err(BooklistError::Extraction(_))));
    }

    #[test]
    fn test_process_saved_completion() {
        let pipeline = pipeline(CannedBackend::new(""));
        let completion = RawCompletion::new(
            "<booklist><book><title>Dune</title></book><book>??</book><book></book></booklist>",
            "saved",
        );

        let (outcome, stats) = pipeline.process(&completion).unwrap();

        assert_eq!(outcome.books.len(), 2);
        assert!(outcome.books[1].is_empty());
        assert_eq!(stats.records_skipped, 1);
        assert_eq!(stats.issues, 1);
        assert_eq!(stats.backend_ms, 0);
        assert!((stats.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_process_empty_completion() {
        let pipeline = pipeline(CannedBackend::new(""));
        let completion = RawCompletion::new("  \n ", "saved");

        let result = pipeline.process(&completion);
        assert!(matches!(result, Err(BooklistError::Extraction(_))));
    }

    #[test]
    fn test_process_without_backend() {
        let extractor = BookExtractor::new(&SchemaConfig::default()).unwrap();
        let completion = RawCompletion::new("<books><book><title>Emma</title></book></books>", "saved");

        let (outcome, stats) = process_completion(&extractor, &completion).unwrap();

        assert_eq!(outcome.books[0].title(), Some("Emma"));
        assert_eq!(stats.books_parsed, 1);
    }

    #[test]
    fn test_from_config() {
        let pipeline = BooklistPipeline::from_config(&Config::default_config()).unwrap();
        assert!(pipeline.prompt().user.contains("buddhist"));
        assert!(matches!(pipeline.backend(), Backend::Ollama(_)));
    }
}
