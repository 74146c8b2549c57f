// file: src/utils/validation.rs
// description: configuration and input validation helpers
// reference: input validation patterns

use crate::config::SQLITE_MAX_BIND_PARAMS;
use crate::database::schema::NOVEL_COLUMNS;
use crate::error::{PipelineError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SQL_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex");
}

pub struct Validator;

impl Validator {
    /// A chunk is written as one multi-row statement, so it must fit in
    /// SQLite's bind parameter budget.
    pub fn validate_chunk_size(size: usize) -> Result<()> {
        if size == 0 {
            return Err(PipelineError::Validation(
                "Chunk size must be greater than 0".to_string(),
            ));
        }

        let max = Self::max_chunk_size();
        if size > max {
            return Err(PipelineError::Validation(format!(
                "Chunk size too large (max {})",
                max
            )));
        }

        Ok(())
    }

    pub fn max_chunk_size() -> usize {
        SQLITE_MAX_BIND_PARAMS / NOVEL_COLUMNS.len()
    }

    /// Table names are spliced into SQL text and cannot be bound.
    pub fn validate_table_name(name: &str) -> Result<()> {
        if !SQL_IDENTIFIER.is_match(name) {
            return Err(PipelineError::Validation(format!(
                "Invalid table name: {:?}",
                name
            )));
        }

        if name.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(PipelineError::Validation(format!(
                "Table name uses a reserved prefix: {}",
                name
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Shortens `text` to at most `max_chars` characters, never splitting one.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        }
    }
}
