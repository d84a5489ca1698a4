// file: src/extractor/patterns.rs
// description: compiled regex patterns for fragment location and cleanup
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Markdown fence markers, with or without a language tag
    pub static ref CODE_FENCE: Regex = Regex::new(
        r"```[A-Za-z0-9_-]*"
    ).expect("CODE_FENCE regex is valid");

    pub static ref BACKTICK: Regex = Regex::new(
        r"`+"
    ).expect("BACKTICK regex is valid");

    // Markup the html tree builder would turn into bogus comments
    pub static ref PROCESSING_INSTRUCTION: Regex = Regex::new(
        r"(?s)<\?.*?\?>"
    ).expect("PROCESSING_INSTRUCTION regex is valid");

    pub static ref COMMENT: Regex = Regex::new(
        r"(?s)<!--.*?-->"
    ).expect("COMMENT regex is valid");

    pub static ref CDATA: Regex = Regex::new(
        r"(?s)<!\[CDATA\[(.*?)\]\]>"
    ).expect("CDATA regex is valid");

    pub static ref SELF_CLOSING: Regex = Regex::new(
        r"<([A-Za-z_][A-Za-z0-9_.-]*)((?:\s[^<>]*?)?)\s*/>"
    ).expect("SELF_CLOSING regex is valid");

    // An opening tag followed by its text run, up to the next thing that
    // looks like markup; a bare '<' in text does not end the run
    pub static ref OPEN_TAG_WITH_TEXT: Regex = Regex::new(
        r"<([A-Za-z_][A-Za-z0-9_.-]*)(?:\s[^<>]*)?>((?:[^<]|<[^A-Za-z_/!?<])*)"
    ).expect("OPEN_TAG_WITH_TEXT regex is valid");

    pub static ref TRUNCATED_TAIL: Regex = Regex::new(
        r"<[^<>]*$"
    ).expect("TRUNCATED_TAIL regex is valid");

    pub static ref INTER_TAG_WHITESPACE: Regex = Regex::new(
        r">\s+<"
    ).expect("INTER_TAG_WHITESPACE regex is valid");

    pub static ref WHITESPACE_RUN: Regex = Regex::new(
        r"\s+"
    ).expect("WHITESPACE_RUN regex is valid");
}

/// Element names the html5 tree builder handles specially: void elements,
/// raw text elements, table and form structure, document structure and
/// foreign content. Text inside them is dropped or moved, so they are
/// renamed with a trailing `_` before parsing. `title` stays as is; its
/// text survives and unterminated titles are closed by the cleaner.
pub const HTML_RESERVED_TAGS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "image", "img",
    "input", "keygen", "link", "meta", "param", "source", "track", "wbr",
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "textarea", "xmp",
    "body", "caption", "colgroup", "form", "frameset", "head", "html", "math", "optgroup",
    "option", "select", "svg", "table", "tbody", "td", "template", "tfoot", "th", "thead", "tr",
];

const RESERVED_SUFFIX: char = '_';

lazy_static! {
    // Opening or closing tag of a reserved name; groups: slash, name, delimiter
    pub static ref HTML_RESERVED_TAG: Regex = Regex::new(&format!(
        r"(?i)<(/?)({})([\s/>])",
        HTML_RESERVED_TAGS.join("|")
    )).expect("HTML_RESERVED_TAG regex is valid");
}

/// Replacement for `HTML_RESERVED_TAG` that appends the suffix.
pub fn reserved_tag_replacement() -> String {
    format!("<${{1}}${{2}}{}${{3}}", RESERVED_SUFFIX)
}

/// Undoes the reserved-name renaming on a parsed element name.
pub fn restore_tag_name(name: &str) -> &str {
    match name.strip_suffix(RESERVED_SUFFIX) {
        Some(stem) if HTML_RESERVED_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(stem)) => stem,
        _ => name,
    }
}

/// Matches an opening tag of any of `names`, attributes allowed.
pub fn opening_tag(names: &[String]) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)<(?:{})(?:\s[^<>]*)?>", alternation(names)))
}

/// Matches opening and closing tags of `name`; group 1 is the slash.
pub fn open_or_close_tag(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)<(/?)\s*{}(?:\s[^<>]*)?>",
        regex::escape(name)
    ))
}

/// Matches a field whose value was glued into its opening tag, such as
/// `<genre|Fiction>`, `<title: Dune>` or `<authorJane Doe>`. A bare value
/// must start with an uppercase letter or digit so `<authors>` is left alone.
pub fn inline_field(field: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"<(?i:{})(?:\s*[|:]\s*([^<>]+?)|\s*([A-Z0-9][^<>=/"]*?))\s*>"#,
        regex::escape(field)
    ))
}

/// Collapses whitespace runs and trims.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

fn alternation(names: &[String]) -> String {
    names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|")
}
