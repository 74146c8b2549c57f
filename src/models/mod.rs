// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod change;
pub mod novel;

pub use change::{ChangeLogEntry, ChangeSet, Decision, FieldChange};
pub use novel::{Column, FieldValue, NovelRecord};

/// A loosely typed record as produced by the crawler or read from a snapshot.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;
