// file: src/exporter/json.rs
// description: json export of parsed book lists with run metadata

use crate::error::Result;
use crate::models::BookRecord;
use crate::pipeline::{PipelineReport, RunStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExportedBooklist<'a> {
    pub run_id: String,
    pub exported_at: String,
    pub received_at: DateTime<Utc>,
    pub model: &'a str,
    pub topic: &'a str,
    pub content_hash: &'a str,
    pub total_books: usize,
    pub books: &'a [BookRecord],
    pub issues: Vec<String>,
    pub stats: &'a RunStats,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn export(&self, report: &PipelineReport, pretty: bool) -> Result<PathBuf> {
        let now = Utc::now();
        let run_id = Uuid::new_v4().simple().to_string();

        let document = ExportedBooklist {
            run_id: run_id.clone(),
            exported_at: now.to_rfc3339(),
            received_at: report.completion.received_at,
            model: &report.completion.model,
            topic: &report.topic,
            content_hash: &report.completion.content_hash,
            total_books: report.outcome.books.len(),
            books: &report.outcome.books,
            issues: report.outcome.issues.iter().map(|i| i.to_string()).collect(),
            stats: &report.stats,
        };

        let body = if pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };

        let file_name = format!(
            "booklist-{}-{}.json",
            now.format("%Y%m%dT%H%M%S"),
            &run_id[..8]
        );
        let path = self.output_dir.join(file_name);
        fs::write(&path, body)?;

        info!(
            "Exported {} books to {}",
            document.total_books,
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PartialParseError;
    use crate::extractor::ParseOutcome;
    use crate::models::RawCompletion;
    use crate::prompt::Prompt;
    use tempfile::tempdir;

    fn report() -> PipelineReport {
        PipelineReport {
            topic: "a list of buddhist books".to_string(),
            prompt: Prompt {
                system: "sys".to_string(),
                user: "usr".to_string(),
            },
            completion: RawCompletion::new("<booklist>...</booklist>", "llama3.2"),
            outcome: ParseOutcome {
                books: vec![[("title", "Dune"), ("author", "Herbert")].into_iter().collect()],
                issues: vec![PartialParseError::SkippedRecord {
                    tag: "book".to_string(),
                    position: 2,
                    reason: "text without field elements".to_string(),
                }],
            },
            stats: RunStats::new(),
        }
    }

    #[test]
    fn test_exporter_creation() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path().join("nested"));
        assert!(exporter.is_ok());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_export_writes_document() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();

        let path = exporter.export(&report(), true).unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("booklist-"));
        assert!(file_name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["total_books"], 1);
        assert_eq!(written["model"], "llama3.2");
        assert_eq!(written["books"][0]["title"], "Dune");
        assert_eq!(written["issues"][0], "skipped <book> element #2: text without field elements");
        assert_eq!(written["content_hash"].as_str().unwrap().len(), 64);
    }
}
