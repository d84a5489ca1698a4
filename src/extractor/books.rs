// file: src/extractor/books.rs
// description: extraction, cleaning and parsing of book lists from model output
// reference: locate -> clean -> parse

use super::cleaner::Cleaner;
use super::fragment::FragmentLocator;
use super::parser::{BookParser, ParseOutcome};
use crate::config::SchemaConfig;
use crate::error::Result;
use crate::models::ExtractedFragment;
use crate::utils::Validator;
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 400;

pub struct BookExtractor {
    locator: FragmentLocator,
    cleaner: Cleaner,
    parser: BookParser,
}

impl BookExtractor {
    pub fn new(schema: &SchemaConfig) -> Result<Self> {
        Ok(Self {
            locator: FragmentLocator::new(schema)?,
            cleaner: Cleaner::new(schema)?,
            parser: BookParser::new(schema),
        })
    }

    pub fn with_cleaner(mut self, cleaner: Cleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Runs the whole step on raw model output. Fails only when no XML-like
    /// region exists; malformed records come back as issues.
    pub fn extract(&self, raw: &str) -> Result<ParseOutcome> {
        info!("Extracting book list from {} chars of model output", raw.len());
        debug!("Raw output: {}", Validator::truncate_text(raw, PREVIEW_CHARS));

        let fragment = self.locate(raw)?;
        Ok(self.parse_fragment(&fragment))
    }

    pub fn locate(&self, raw: &str) -> Result<ExtractedFragment> {
        let fragment = self.locator.locate(raw)?;

        debug!(
            "Fragment <{}> at {}..{} (closed: {}, fenced: {}, synthetic root: {})",
            fragment.root_tag,
            fragment.span.start,
            fragment.span.end,
            fragment.closed,
            fragment.from_code_fence,
            fragment.synthetic_root
        );

        Ok(fragment)
    }

    pub fn parse_fragment(&self, fragment: &ExtractedFragment) -> ParseOutcome {
        let cleaned = self.cleaner.clean(fragment);

        if !cleaned.applied.is_empty() {
            info!("Applied repairs: {}", cleaned.applied.join(", "));
        }
        debug!(
            "Cleaned fragment: {}",
            Validator::truncate_text(&cleaned.text, PREVIEW_CHARS)
        );

        let outcome = self.parser.parse(&cleaned.text);

        for issue in &outcome.issues {
            warn!("Partial parse: {}", issue);
        }
        for (index, book) in outcome.books.iter().enumerate() {
            debug!("Book {}: {}", index + 1, book);
        }

        info!(
            "Parsed {} book records ({} skipped)",
            outcome.books.len(),
            outcome.skipped()
        );

        outcome
    }
}
