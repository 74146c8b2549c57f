// file: src/parser/patterns.rs
// description: compiled regex patterns for markup and whitespace cleaning
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref LINE_BREAK_TAG: Regex = Regex::new(
        r"(?i)<br\s*/?>"
    ).expect("LINE_BREAK_TAG regex is valid");

    pub static ref MARKUP_TAG: Regex = Regex::new(
        r"<[^>]*>"
    ).expect("MARKUP_TAG regex is valid");

    pub static ref CONTROL_WHITESPACE: Regex = Regex::new(
        r"[\t\r\n]+"
    ).expect("CONTROL_WHITESPACE regex is valid");

    pub static ref WHITESPACE_RUN: Regex = Regex::new(
        r"\s+"
    ).expect("WHITESPACE_RUN regex is valid");

    // Thousands separators in numeric strings such as "1,204"
    pub static ref DIGIT_GROUPING: Regex = Regex::new(
        r"^[+-]?\d{1,3}(,\d{3})+$"
    ).expect("DIGIT_GROUPING regex is valid");
}
