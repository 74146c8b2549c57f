// file: src/models/change.rs
// description: diff decisions, field change sets and change log entries
// reference: serde models for the change log format

use crate::models::novel::NovelRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: String,
    pub after: String,
}

/// Changed fields keyed by column name.
pub type ChangeSet = BTreeMap<String, FieldChange>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Changes")]
    pub changes: ChangeSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Insert(NovelRecord),
    Update {
        row: NovelRecord,
        changes: ChangeSet,
    },
    Unchanged,
}

impl Decision {
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::Insert(_) => "insert",
            Decision::Update { .. } => "update",
            Decision::Unchanged => "unchanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_log_entry_json_shape() {
        let mut changes = ChangeSet::new();
        changes.insert(
            "views".to_string(),
            FieldChange {
                before: "10".to_string(),
                after: "15".to_string(),
            },
        );
        let entry = ChangeLogEntry { id: 1, changes };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ID": 1, "Changes": {"views": {"before": "10", "after": "15"}}})
        );
    }
}
