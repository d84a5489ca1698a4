// file: src/extractor/fragment.rs
// description: locates the xml document inside noisy model output
// reference: tag scanning with depth counting

use super::fences::FenceStripper;
use super::patterns::{open_or_close_tag, opening_tag};
use crate::config::SchemaConfig;
use crate::error::{BooklistError, Result};
use crate::models::ExtractedFragment;
use regex::Regex;
use tracing::{debug, warn};

pub struct FragmentLocator {
    fences: FenceStripper,
    root_open: Regex,
    root_tags: Vec<(String, Regex)>,
    record_tag: String,
    record_tags: Regex,
    primary_root: String,
}

impl FragmentLocator {
    pub fn new(schema: &SchemaConfig) -> Result<Self> {
        let roots = schema.root_candidates();
        let record_tag = schema.record_tag.to_ascii_lowercase();

        let mut markup_names = roots.clone();
        markup_names.push(record_tag.clone());

        let root_tags = roots
            .iter()
            .map(|name| -> Result<(String, Regex)> {
                Ok((name.clone(), open_or_close_tag(name).map_err(pattern_error)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fences: FenceStripper::new(opening_tag(&markup_names).map_err(pattern_error)?),
            root_open: opening_tag(&roots).map_err(pattern_error)?,
            root_tags,
            record_tags: open_or_close_tag(&record_tag).map_err(pattern_error)?,
            record_tag,
            primary_root: schema.root_tag.to_ascii_lowercase(),
        })
    }

    pub fn locate(&self, raw: &str) -> Result<ExtractedFragment> {
        let unfenced = self.fences.unwrap(raw);
        let text = unfenced.text.as_ref();

        if unfenced.from_code_fence {
            debug!("Using fenced code block ({} chars)", text.len());
        }

        let located = self
            .locate_root(text)
            .or_else(|| self.locate_records(text))
            .ok_or_else(|| BooklistError::Extraction("no XML-like content detected".to_string()))?;

        Ok(ExtractedFragment {
            from_code_fence: unfenced.from_code_fence,
            ..located
        })
    }

    fn locate_root(&self, text: &str) -> Option<ExtractedFragment> {
        let opening = self
            .root_open
            .find_iter(text)
            .find(|tag| !is_self_closing(tag.as_str()))?;
        let root_tag = tag_name(opening.as_str());
        let (_, tags) = self.root_tags.iter().find(|(name, _)| *name == root_tag)?;

        let start = opening.start();
        let mut depth = 0usize;
        let mut last_close = None;
        let mut end = None;

        for caps in tags.captures_iter(&text[start..]) {
            let Some(tag) = caps.get(0) else { continue };
            if is_self_closing(tag.as_str()) {
                continue;
            }
            let closing = caps.get(1).is_some_and(|slash| !slash.as_str().is_empty());

            if closing {
                last_close = Some(start + tag.end());
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(start + tag.end());
                    break;
                }
            } else {
                depth += 1;
            }
        }

        let (end, closed) = match end.or(last_close) {
            Some(end) => (end, true),
            None => {
                warn!("Root <{}> is never closed, reading to end of output", root_tag);
                (text.len(), false)
            }
        };

        Some(ExtractedFragment {
            text: text[start..end].to_string(),
            root_tag,
            span: start..end,
            closed,
            from_code_fence: false,
            synthetic_root: false,
        })
    }

    fn locate_records(&self, text: &str) -> Option<ExtractedFragment> {
        // (start, end, opens, closes); `<book title="Dune"/>` does both
        let mut tags = self.record_tags.captures_iter(text).filter_map(|caps| {
            let tag = caps.get(0)?;
            let closing = caps.get(1).is_some_and(|slash| !slash.as_str().is_empty());
            let empty = is_self_closing(tag.as_str());
            Some((tag.start(), tag.end(), !closing, closing || empty))
        });

        let (start, first_end, _, first_closes) = tags.find(|(_, _, opens, _)| *opens)?;
        let last_close = tags
            .filter(|(_, _, _, closes)| *closes)
            .map(|(_, end, _, _)| end)
            .last()
            .or(first_closes.then_some(first_end));

        warn!(
            "No <{}> root found, wrapping bare <{}> elements",
            self.primary_root, self.record_tag
        );

        let root = &self.primary_root;
        let (end, text, closed) = match last_close {
            Some(end) => (end, format!("<{root}>{}</{root}>", &text[start..end]), true),
            None => (text.len(), format!("<{root}>{}", &text[start..]), false),
        };

        Some(ExtractedFragment {
            text,
            root_tag: root.clone(),
            span: start..end,
            closed,
            from_code_fence: false,
            synthetic_root: true,
        })
    }
}

fn tag_name(opening: &str) -> String {
    opening
        .trim_start_matches('<')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// `<booklist />` and friends carry no content.
fn is_self_closing(tag: &str) -> bool {
    tag.trim_end_matches('>').trim_end().ends_with('/')
}

fn pattern_error(e: regex::Error) -> BooklistError {
    BooklistError::Config(format!("Invalid tag pattern: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn locator() -> FragmentLocator {
        FragmentLocator::new(&SchemaConfig::default()).unwrap()
    }

    #[test]
    fn test_strips_surrounding_prose() {
        let raw = "Here is your list:\n<booklist><book><title>Dune</title></book></booklist>\nHope it helps!";
        let fragment = locator().locate(raw).unwrap();

        assert_eq!(
            fragment.text,
            "<booklist><book><title>Dune</title></book></booklist>"
        );
        assert_eq!(fragment.root_tag, "booklist");
        assert_eq!(fragment.span, 19..72);
        assert!(fragment.closed);
        assert!(!fragment.synthetic_root);
    }

    #[test]
    fn test_alias_root_and_case() {
        let raw = "<Books><book><title>Dune</title></book></BOOKS> trailing";
        let fragment = locator().locate(raw).unwrap();

        assert_eq!(fragment.root_tag, "books");
        assert_eq!(fragment.text, "<Books><book><title>Dune</title></book></BOOKS>");
    }

    #[test]
    fn test_matching_close_by_depth() {
        let raw = "<booklist><booklist></booklist></booklist> and </booklist> again";
        let fragment = locator().locate(raw).unwrap();

        assert_eq!(fragment.text, "<booklist><booklist></booklist></booklist>");
    }

    #[test]
    fn test_unclosed_root_reads_to_end() {
        let raw = "<booklist><book><title>Dune</title></book><book><title>Emm";
        let fragment = locator().locate(raw).unwrap();

        assert!(!fragment.closed);
        assert_eq!(fragment.text, raw);
        assert_eq!(fragment.span.end, raw.len());
    }

    #[test]
    fn test_fenced_content() {
        let raw = "```xml\n<booklist><book><title>Dune</title></book></booklist>\n```";
        let fragment = locator().locate(raw).unwrap();

        assert!(fragment.from_code_fence);
        assert_eq!(
            fragment.text,
            "<booklist><book><title>Dune</title></book></booklist>"
        );
    }

    #[test]
    fn test_bare_records_get_synthetic_root() {
        let raw = "Books:\n<book><title>Dune</title></book>\n<book><title>Emma</title></book>\nDone.";
        let fragment = locator().locate(raw).unwrap();

        assert!(fragment.synthetic_root);
        assert!(fragment.closed);
        assert_eq!(
            fragment.text,
            "<booklist><book><title>Dune</title></book>\n<book><title>Emma</title></book></booklist>"
        );
    }

    #[test]
    fn test_bare_attribute_records() {
        let raw = r#"<book title="Dune"/> <book title="Emma"/>"#;
        let fragment = locator().locate(raw).unwrap();

        assert!(fragment.synthetic_root);
        assert_eq!(
            fragment.text,
            r#"<booklist><book title="Dune"/> <book title="Emma"/></booklist>"#
        );
    }

    #[test]
    fn test_no_tags_is_extraction_error() {
        let result = locator().locate("I'm sorry, I can't help with that.");
        assert!(matches!(result, Err(BooklistError::Extraction(_))));
    }

    #[test]
    fn test_unrelated_tags_are_extraction_error() {
        let result = locator().locate("<p>Some <b>html</b></p>");
        assert!(matches!(result, Err(BooklistError::Extraction(_))));
    }

    #[test]
    fn test_self_closing_root_mention_skipped() {
        let raw = "An empty list looks like <booklist />.\n<booklist><book><title>Dune</title></book><booklist /></booklist>";
        let fragment = locator().locate(raw).unwrap();

        assert_eq!(
            fragment.text,
            "<booklist><book><title>Dune</title></book><booklist /></booklist>"
        );
        assert!(fragment.closed);
    }

    #[test]
    fn test_self_closing() {
        assert!(is_self_closing("<booklist />"));
        assert!(is_self_closing(r#"<book title="Dune"/>"#));
        assert!(!is_self_closing("<booklist>"));
        assert!(!is_self_closing("</booklist>"));
    }

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name("<BookList version=\"1\">"), "booklist");
        assert_eq!(tag_name("<books>"), "books");
    }
}
