// file: src/extractor/fences.rs
// description: markdown code fence unwrapping with pulldown-cmark
// reference: https://docs.rs/pulldown-cmark

use super::patterns::CODE_FENCE;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use regex::Regex;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unfenced<'a> {
    pub text: Cow<'a, str>,
    pub from_code_fence: bool,
}

/// Picks the fenced code block that carries markup, or drops stray fence
/// markers when no block qualifies.
pub struct FenceStripper {
    markup: Regex,
}

impl FenceStripper {
    /// `markup` decides whether a fenced block holds the document.
    pub fn new(markup: Regex) -> Self {
        Self { markup }
    }

    pub fn unwrap<'a>(&self, text: &'a str) -> Unfenced<'a> {
        if !text.contains("```") && !text.contains("~~~") {
            return Unfenced {
                text: Cow::Borrowed(text),
                from_code_fence: false,
            };
        }

        if let Some(block) = self
            .fenced_blocks(text)
            .into_iter()
            .find(|block| self.markup.is_match(block))
        {
            return Unfenced {
                text: Cow::Owned(block),
                from_code_fence: true,
            };
        }

        Unfenced {
            text: CODE_FENCE.replace_all(text, ""),
            from_code_fence: false,
        }
    }

    fn fenced_blocks(&self, text: &str) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut current: Option<String> = None;

        for event in Parser::new(text) {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                    current = Some(String::new());
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                }
                Event::Text(chunk) => {
                    if let Some(ref mut block) = current {
                        block.push_str(&chunk);
                    }
                }
                _ => {}
            }
        }

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::patterns::opening_tag;

    fn stripper() -> FenceStripper {
        FenceStripper::new(opening_tag(&["booklist".to_string(), "book".to_string()]).unwrap())
    }

    #[test]
    fn test_plain_text_untouched() {
        let text = "Here: <booklist></booklist>";
        let unfenced = stripper().unwrap(text);

        assert_eq!(unfenced.text, text);
        assert!(!unfenced.from_code_fence);
    }

    #[test]
    fn test_picks_block_with_markup() {
        let text = "Sure!\n\n```bash\necho hi\n```\n\n```xml\n<booklist>\n</booklist>\n```\n\nEnjoy.";
        let unfenced = stripper().unwrap(text);

        assert_eq!(unfenced.text, "<booklist>\n</booklist>\n");
        assert!(unfenced.from_code_fence);
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let text = "```xml\n<booklist><book><title>Dune</title>";
        let unfenced = stripper().unwrap(text);

        assert!(unfenced.from_code_fence);
        assert!(unfenced.text.starts_with("<booklist>"));
    }

    #[test]
    fn test_stray_markers_removed() {
        let text = "<booklist>```</booklist>";
        let unfenced = stripper().unwrap(text);

        assert_eq!(unfenced.text, "<booklist></booklist>");
        assert!(!unfenced.from_code_fence);
    }
}
