// file: src/extractor/cleaner.rs
// description: best-effort repairs for common model markup artifacts
// reference: ordered, named text repairs

use super::patterns::{
    inline_field, reserved_tag_replacement, BACKTICK, CDATA, COMMENT, HTML_RESERVED_TAG,
    INTER_TAG_WHITESPACE, OPEN_TAG_WITH_TEXT, PROCESSING_INSTRUCTION, SELF_CLOSING,
    TRUNCATED_TAIL,
};
use crate::config::SchemaConfig;
use crate::error::{BooklistError, Result};
use crate::models::ExtractedFragment;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// A single named fix. Returning `Cow::Borrowed` means nothing changed.
pub trait Repair: Send + Sync {
    fn name(&self) -> &str;
    fn apply<'a>(&self, text: &'a str, fragment: &ExtractedFragment) -> Cow<'a, str>;
}

/// Regex replacement using `regex` replacement syntax (`${1}`).
pub struct PatternRepair {
    name: String,
    pattern: Regex,
    replacement: String,
}

impl PatternRepair {
    pub fn new(name: impl Into<String>, pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern,
            replacement: replacement.into(),
        }
    }
}

impl Repair for PatternRepair {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply<'a>(&self, text: &'a str, _: &ExtractedFragment) -> Cow<'a, str> {
        self.pattern.replace_all(text, self.replacement.as_str())
    }
}

/// Turns CDATA sections into escaped text; the html tree builder would
/// otherwise read them as comments.
struct CdataRepair;

impl Repair for CdataRepair {
    fn name(&self) -> &str {
        "cdata"
    }

    fn apply<'a>(&self, text: &'a str, _: &ExtractedFragment) -> Cow<'a, str> {
        CDATA.replace_all(text, |caps: &Captures| {
            caps[1]
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
        })
    }
}

/// Drops a tag cut off mid-way at the end and closes an unclosed root.
struct TruncatedTailRepair;

impl Repair for TruncatedTailRepair {
    fn name(&self) -> &str {
        "truncated_tail"
    }

    fn apply<'a>(&self, text: &'a str, fragment: &ExtractedFragment) -> Cow<'a, str> {
        let trimmed = TRUNCATED_TAIL.replace(text, "");
        if fragment.closed {
            return trimmed;
        }
        Cow::Owned(format!("{}</{}>", trimmed.trim_end(), fragment.root_tag))
    }
}

/// Closes a leaf field whose text runs straight into the next tag, as in
/// `<title>Dune<author>`.
struct UnterminatedFieldRepair {
    fields: Vec<String>,
}

impl UnterminatedFieldRepair {
    fn is_closed_by(rest: &str, field: &str) -> bool {
        let Some(after) = rest.strip_prefix("</") else {
            return false;
        };
        let matches_name = after
            .get(..field.len())
            .is_some_and(|name| name.eq_ignore_ascii_case(field));
        matches_name
            && after[field.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c.is_whitespace())
    }
}

impl Repair for UnterminatedFieldRepair {
    fn name(&self) -> &str {
        "unterminated_field"
    }

    fn apply<'a>(&self, text: &'a str, _: &ExtractedFragment) -> Cow<'a, str> {
        let mut inserts = Vec::new();

        for caps in OPEN_TAG_WITH_TEXT.captures_iter(text) {
            let (Some(whole), Some(tag), Some(value)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            let field = tag.as_str().to_ascii_lowercase();
            if !self.fields.contains(&field) || value.as_str().trim().is_empty() {
                continue;
            }

            if !Self::is_closed_by(&text[whole.end()..], &field) {
                let at = value.start() + value.as_str().trim_end().len();
                inserts.push((at, field));
            }
        }

        if inserts.is_empty() {
            return Cow::Borrowed(text);
        }

        let mut repaired = String::with_capacity(text.len() + inserts.len() * 16);
        let mut cursor = 0;
        for (at, field) in inserts {
            repaired.push_str(&text[cursor..at]);
            repaired.push_str(&format!("</{}>", field));
            cursor = at;
        }
        repaired.push_str(&text[cursor..]);

        Cow::Owned(repaired)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedFragment {
    pub text: String,
    pub applied: Vec<String>,
}

/// Ordered list of repairs run over an extracted fragment. Not meant to fix
/// arbitrary markup; new artifacts get new repairs.
pub struct Cleaner {
    repairs: Vec<Box<dyn Repair>>,
}

impl Cleaner {
    pub fn new(schema: &SchemaConfig) -> Result<Self> {
        let fields: Vec<String> = schema
            .fields
            .iter()
            .map(|field| field.to_ascii_lowercase())
            .collect();

        let mut repairs: Vec<Box<dyn Repair>> = vec![
            Box::new(PatternRepair::new("stray_backticks", BACKTICK.clone(), "")),
            Box::new(PatternRepair::new(
                "processing_instruction",
                PROCESSING_INSTRUCTION.clone(),
                "",
            )),
            Box::new(PatternRepair::new("comment", COMMENT.clone(), "")),
            Box::new(CdataRepair),
        ];

        for field in &fields {
            let pattern = inline_field(field)
                .map_err(|e| BooklistError::Config(format!("Invalid field pattern: {}", e)))?;
            repairs.push(Box::new(PatternRepair::new(
                format!("inline_{}", field),
                pattern,
                format!("<{field}>${{1}}${{2}}</{field}>"),
            )));
        }

        repairs.push(Box::new(PatternRepair::new(
            "self_closing",
            SELF_CLOSING.clone(),
            "<${1}${2}></${1}>",
        )));
        repairs.push(Box::new(TruncatedTailRepair));
        repairs.push(Box::new(UnterminatedFieldRepair { fields }));
        repairs.push(Box::new(PatternRepair::new(
            "inter_tag_whitespace",
            INTER_TAG_WHITESPACE.clone(),
            "><",
        )));
        // Last, so earlier repairs see the names the model wrote
        repairs.push(Box::new(PatternRepair::new(
            "html_reserved_tags",
            HTML_RESERVED_TAG.clone(),
            reserved_tag_replacement(),
        )));

        Ok(Self { repairs })
    }

    /// Appends a regex repair that runs after the built-in ones.
    pub fn with_repair(
        mut self,
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| BooklistError::Config(format!("Invalid repair pattern: {}", e)))?;
        self.repairs
            .push(Box::new(PatternRepair::new(name, pattern, replacement)));
        Ok(self)
    }

    pub fn repair_names(&self) -> Vec<&str> {
        self.repairs.iter().map(|repair| repair.name()).collect()
    }

    pub fn clean(&self, fragment: &ExtractedFragment) -> CleanedFragment {
        let mut text = fragment.text.clone();
        let mut applied = Vec::new();

        for repair in &self.repairs {
            let repaired = match repair.apply(&text, fragment) {
                Cow::Owned(repaired) if repaired != text => Some(repaired),
                _ => None,
            };
            if let Some(repaired) = repaired {
                applied.push(repair.name().to_string());
                text = repaired;
            }
        }

        CleanedFragment {
            text: text.trim().to_string(),
            applied,
        }
    }
}
