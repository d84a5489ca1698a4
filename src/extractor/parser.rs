// file: src/extractor/parser.rs
// description: lenient book record parsing on top of the html5 tree builder
// reference: https://docs.rs/scraper

use super::patterns::{normalize_whitespace, restore_tag_name};
use crate::config::SchemaConfig;
use crate::error::PartialParseError;
use crate::models::{BookList, BookRecord};
use scraper::{ElementRef, Html};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub books: BookList,
    pub issues: Vec<PartialParseError>,
}

impl ParseOutcome {
    pub fn skipped(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_skip()).count()
    }

    pub fn is_partial(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Walks the tree an html5 parser builds from the fragment. Unclosed tags,
/// stray entities and unknown markup never fail the parse; the worst case is
/// a record that is reported and skipped.
pub struct BookParser {
    root_tags: Vec<String>,
    record_tag: String,
    fields: Vec<String>,
}

impl BookParser {
    pub fn new(schema: &SchemaConfig) -> Self {
        Self {
            root_tags: schema.root_candidates(),
            record_tag: schema.record_tag.to_ascii_lowercase(),
            fields: schema
                .fields
                .iter()
                .map(|field| field.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn parse(&self, fragment: &str) -> ParseOutcome {
        let html = Html::parse_fragment(fragment);
        let top = html.root_element();

        let container = top
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| self.root_tags.iter().any(|tag| tag == name_of(element)))
            .unwrap_or(top);

        let records: Vec<ElementRef> = container
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| self.is_record(element) && !self.has_record_ancestor(element))
            .collect();

        debug!(
            "Found {} top-level <{}> elements under <{}>",
            records.len(),
            self.record_tag,
            name_of(&container)
        );

        let mut outcome = ParseOutcome::default();
        let mut position = 0;
        for record in records {
            self.read_record(record, &mut position, &mut outcome);
        }

        outcome
    }

    fn is_record(&self, element: &ElementRef) -> bool {
        name_of(element) == self.record_tag
    }

    /// Schema fields and records; anything else nested in a field is markup
    /// inside its value.
    fn is_known(&self, element: &ElementRef) -> bool {
        self.is_record(element) || self.fields.iter().any(|field| field == name_of(element))
    }

    fn has_record_ancestor(&self, element: &ElementRef) -> bool {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| self.is_record(&ancestor))
    }

    fn read_record(&self, element: ElementRef, position: &mut usize, outcome: &mut ParseOutcome) {
        *position += 1;
        let current = *position;

        let mut record = BookRecord::new();
        let mut nested = Vec::new();
        self.collect_fields(element, current, &mut record, &mut nested, outcome);

        if record.is_empty() {
            // <book title="Dune" author="Herbert"/>
            for (name, value) in element.value().attrs() {
                let value = normalize_whitespace(value);
                if !value.is_empty() {
                    record.insert(name, value);
                }
            }
        }

        if record.is_empty() && !direct_text(element).is_empty() {
            outcome.issues.push(PartialParseError::SkippedRecord {
                tag: self.record_tag.clone(),
                position: current,
                reason: "text without field elements".to_string(),
            });
        } else {
            if record.is_empty() {
                debug!("Record #{} has no field values", current);
            }
            outcome.books.push(record);
        }

        for child in nested {
            outcome.issues.push(PartialParseError::NestedRecord {
                tag: self.record_tag.clone(),
                position: *position + 1,
            });
            self.read_record(child, position, outcome);
        }
    }

    fn collect_fields<'a>(
        &self,
        element: ElementRef<'a>,
        position: usize,
        record: &mut BookRecord,
        nested: &mut Vec<ElementRef<'a>>,
        outcome: &mut ParseOutcome,
    ) {
        for child in element.children().filter_map(ElementRef::wrap) {
            if self.is_record(&child) {
                nested.push(child);
                continue;
            }

            let name = name_of(&child);
            let text = direct_text(child);
            let has_elements = child.children().any(|node| node.value().is_element());
            let swallowed_fields = child
                .children()
                .filter_map(ElementRef::wrap)
                .any(|grandchild| self.is_known(&grandchild));

            if !text.is_empty() && swallowed_fields {
                // The field swallowed its following siblings.
                if !record.insert(name, text) {
                    debug!("Duplicate <{}> in record #{}, keeping the first", name, position);
                }
                outcome.issues.push(PartialParseError::UnclosedField {
                    field: name.to_string(),
                    position,
                });
                self.collect_fields(child, position, record, nested, outcome);
            } else if !text.is_empty() {
                let value = if has_elements {
                    normalize_whitespace(&child.text().collect::<String>())
                } else {
                    text
                };
                if !record.insert(name, value) {
                    debug!("Duplicate <{}> in record #{}, keeping the first", name, position);
                }
            } else if has_elements {
                let mut parts = Vec::new();
                for grandchild in child.children().filter_map(ElementRef::wrap) {
                    if self.is_record(&grandchild) {
                        nested.push(grandchild);
                    } else {
                        let part = normalize_whitespace(&grandchild.text().collect::<String>());
                        if !part.is_empty() {
                            parts.push(part);
                        }
                    }
                }
                if !parts.is_empty() {
                    record.insert(name, parts.join(", "));
                }
            } else {
                debug!("Empty <{}> in record #{}", name, position);
            }
        }
    }
}

/// Element name with reserved html names restored.
fn name_of<'a>(element: &ElementRef<'a>) -> &'a str {
    restore_tag_name(element.value().name())
}

/// Text nodes directly under `element`, whitespace-normalized.
fn direct_text(element: ElementRef) -> String {
    let text: String = element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| text.to_string()))
        .collect();
    normalize_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser() -> BookParser {
        BookParser::new(&SchemaConfig::default())
    }

    fn record(fields: &[(&str, &str)]) -> BookRecord {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_well_formed_document() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title><author>Frank Herbert</author><publication_year>1965</publication_year></book><book><title>Emma</title><author>Jane Austen</author></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![
                record(&[
                    ("title", "Dune"),
                    ("author", "Frank Herbert"),
                    ("publication_year", "1965")
                ]),
                record(&[("title", "Emma"), ("author", "Jane Austen")]),
            ]
        );
        assert!(!outcome.is_partial());
    }

    #[test]
    fn test_entities_and_whitespace() {
        let outcome = parser().parse(
            "<booklist><book><title>  Zen &amp; the Art\n of   Archery </title><author>Eugen Herrigel & friends</author></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![record(&[
                ("title", "Zen & the Art of Archery"),
                ("author", "Eugen Herrigel & friends")
            ])]
        );
    }

    #[test]
    fn test_unclosed_field_recovered() {
        let outcome = parser().parse(
            "<booklist><book><genre>Buddhism<author>Shunryu Suzuki</author></book><book><title>Emma</title></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![
                record(&[("genre", "Buddhism"), ("author", "Shunryu Suzuki")]),
                record(&[("title", "Emma")]),
            ]
        );
        assert_eq!(
            outcome.issues,
            vec![PartialParseError::UnclosedField {
                field: "genre".to_string(),
                position: 1
            }]
        );
    }

    #[test]
    fn test_unclosed_record_is_hoisted() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title><book><title>Emma</title></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![record(&[("title", "Dune")]), record(&[("title", "Emma")])]
        );
        assert_eq!(
            outcome.issues,
            vec![PartialParseError::NestedRecord {
                tag: "book".to_string(),
                position: 2
            }]
        );
    }

    #[test]
    fn test_text_only_record_is_skipped() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title></book><book>The Heart Sutra by unknown</book></booklist>",
        );

        assert_eq!(outcome.books, vec![record(&[("title", "Dune")])]);
        assert_eq!(outcome.skipped(), 1);
        assert_eq!(
            outcome.issues[0],
            PartialParseError::SkippedRecord {
                tag: "book".to_string(),
                position: 2,
                reason: "text without field elements".to_string()
            }
        );
    }

    #[test]
    fn test_empty_records_are_kept() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title></book><book></book><book><title></title></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![record(&[("title", "Dune")]), BookRecord::new(), BookRecord::new()]
        );
        assert!(!outcome.is_partial());
    }

    #[test]
    fn test_attribute_records() {
        let outcome = parser().parse(
            r#"<booklist><book title="Dune" author="Herbert"></book><book title=" Emma " author="Austen"></book></booklist>"#,
        );

        assert_eq!(
            outcome.books,
            vec![
                record(&[("title", "Dune"), ("author", "Herbert")]),
                record(&[("title", "Emma"), ("author", "Austen")]),
            ]
        );
    }

    #[test]
    fn test_child_fields_win_over_attributes() {
        let outcome =
            parser().parse(r#"<booklist><book id="7"><title>Dune</title></book></booklist>"#);
        assert_eq!(outcome.books, vec![record(&[("title", "Dune")])]);
    }

    #[test]
    fn test_inline_markup_stays_in_value() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title><description>A <i>classic</i> novel</description></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![record(&[
                ("title", "Dune"),
                ("description", "A classic novel")
            ])]
        );
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_reserved_names_restored() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title><link_>https://x.org/dune</link_><image_>cover.jpg</image_><source_>Goodreads</source_></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![record(&[
                ("title", "Dune"),
                ("link", "https://x.org/dune"),
                ("image", "cover.jpg"),
                ("source", "Goodreads")
            ])]
        );
    }

    #[test]
    fn test_container_field_joined() {
        let outcome = parser().parse(
            "<booklist><book><title>Good Omens</title><authors><author>Terry Pratchett</author><author>Neil Gaiman</author></authors></book></booklist>",
        );

        assert_eq!(
            outcome.books,
            vec![record(&[
                ("title", "Good Omens"),
                ("authors", "Terry Pratchett, Neil Gaiman")
            ])]
        );
    }

    #[test]
    fn test_duplicate_field_keeps_first() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title><title>Dune Messiah</title></book></booklist>",
        );
        assert_eq!(outcome.books, vec![record(&[("title", "Dune")])]);
    }

    #[test]
    fn test_uppercase_tags() {
        let outcome = parser().parse("<BookList><Book><Title>Dune</Title></Book></BookList>");
        assert_eq!(outcome.books, vec![record(&[("title", "Dune")])]);
    }

    #[test]
    fn test_records_outside_root_ignored() {
        let outcome = parser().parse(
            "<booklist><book><title>Dune</title></book></booklist><book><title>Stray</title></book>",
        );
        assert_eq!(outcome.books, vec![record(&[("title", "Dune")])]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let fragment = "<booklist><book><title>Dune</title><author>Herbert</author></book><book>junk</book></booklist>";
        assert_eq!(parser().parse(fragment), parser().parse(fragment));
    }
}
