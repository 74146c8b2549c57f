// file: src/parser/mod.rs
// description: record normalization module exports
// reference: internal module structure

pub mod fields;
pub mod normalizer;
pub mod patterns;
pub mod text;

pub use fields::{Coercion, FIELD_MAP, FieldMapping};
pub use normalizer::{RecordNormalizer, RecordRejected};
pub use text::{clean_text, collapse_control_whitespace};
