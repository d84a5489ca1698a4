// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{BooklistError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").expect("TAG_NAME regex is valid");
}

pub struct Validator;

impl Validator {
    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(BooklistError::Validation("Content is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(BooklistError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_tag_name(tag: &str) -> Result<()> {
        if !TAG_NAME.is_match(tag) {
            return Err(BooklistError::Validation(format!(
                "Invalid element name: {:?}",
                tag
            )));
        }
        Ok(())
    }

    pub fn validate_count(count: usize) -> Result<()> {
        if count == 0 {
            return Err(BooklistError::Validation(
                "Book count must be greater than 0".to_string(),
            ));
        }

        if count > 100 {
            return Err(BooklistError::Validation(
                "Book count too large (max 100)".to_string(),
            ));
        }

        Ok(())
    }

    /// Shortens text for log previews without splitting a UTF-8 character.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        }
    }
}
