// file: src/parser/text.rs
// description: markup stripping and whitespace normalization for record text
// reference: internal text cleaning rules

use crate::parser::patterns::{CONTROL_WHITESPACE, LINE_BREAK_TAG, MARKUP_TAG, WHITESPACE_RUN};

/// Strips markup and collapses whitespace. Idempotent: cleaning cleaned text
/// returns it unchanged.
pub fn clean_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let text = LINE_BREAK_TAG.replace_all(text, " ");
    let text = MARKUP_TAG.replace_all(&text, "");
    let text = CONTROL_WHITESPACE.replace_all(&text, " ");
    let text = WHITESPACE_RUN.replace_all(&text, " ");

    text.trim().to_string()
}

/// Replaces each run of tab, carriage return and newline with one space and
/// leaves everything else as it came.
pub fn collapse_control_whitespace(text: &str) -> String {
    CONTROL_WHITESPACE.replace_all(text, " ").into_owned()
}
