// file: src/pipeline/diff.rs
// description: classifies normalized records against the stored baseline
// reference: insert/update-with-change-log reconciliation

use crate::database::Baseline;
use crate::models::{
    ChangeLogEntry, ChangeSet, Column, Decision, FieldChange, FieldValue, NovelRecord,
};
use crate::parser::clean_text;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use tracing::debug;

/// Everything one run will write, decided before storage is touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub inserts: Vec<NovelRecord>,
    pub updates: Vec<NovelRecord>,
    pub change_log: Vec<ChangeLogEntry>,
    pub unchanged: usize,
    /// Records dropped because a later record in the batch had the same id.
    pub superseded: usize,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

pub struct DiffEngine {
    now: DateTime<FixedOffset>,
}

impl DiffEngine {
    /// `now` becomes the crawltime of every row this engine emits.
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    pub fn classify(&self, existing: Option<&NovelRecord>, candidate: &NovelRecord) -> Decision {
        let Some(existing) = existing else {
            let mut row = candidate.clone();
            row.crawltime = Some(self.now);
            return Decision::Insert(row);
        };

        let mut changes = ChangeSet::new();
        let mut row = existing.clone();

        for column in Column::ALL {
            let before = existing.get(column);
            let after = candidate.get(column);

            if let Some(change) = compare(column, &before, &after) {
                changes.insert(column.as_str().to_string(), change);
                row.set(column, after);
            }
        }

        if changes.is_empty() {
            return Decision::Unchanged;
        }

        row.crawltime = Some(self.now);
        row.apply_required_defaults();

        Decision::Update { row, changes }
    }

    /// Classifies a whole batch. Later records win over earlier ones with the
    /// same id, but every update's change set still lands in the log.
    pub fn plan(&self, baseline: &Baseline, candidates: &[NovelRecord]) -> ReconcilePlan {
        let mut order: Vec<i64> = Vec::with_capacity(candidates.len());
        let mut decisions: HashMap<i64, Decision> = HashMap::with_capacity(candidates.len());
        let mut plan = ReconcilePlan::default();

        for candidate in candidates {
            let decision = self.classify(baseline.get(&candidate.id), candidate);

            if let Decision::Update { changes, .. } = &decision {
                plan.change_log.push(ChangeLogEntry {
                    id: candidate.id,
                    changes: changes.clone(),
                });
            }

            if decisions.insert(candidate.id, decision).is_some() {
                debug!("Record {} superseded by a later duplicate", candidate.id);
                plan.superseded += 1;
            } else {
                order.push(candidate.id);
            }
        }

        for id in order {
            match decisions.remove(&id) {
                Some(Decision::Insert(row)) => plan.inserts.push(row),
                Some(Decision::Update { row, .. }) => plan.updates.push(row),
                Some(Decision::Unchanged) | None => plan.unchanged += 1,
            }
        }

        plan
    }
}

fn compare(column: Column, before: &FieldValue, after: &FieldValue) -> Option<FieldChange> {
    match (before, after) {
        (FieldValue::Date(old), FieldValue::Date(new)) => {
            let old_day = old.map(|dt| dt.naive_local().date());
            let new_day = new.map(|dt| dt.naive_local().date());
            (old_day != new_day).then(|| FieldChange {
                before: before.render(),
                after: after.render(),
            })
        }
        (FieldValue::Text(old), FieldValue::Text(new)) => {
            let old_clean = clean_text(old.as_deref());
            let new_clean = clean_text(new.as_deref());

            let changed = if column == Column::Info {
                old_clean != new_clean
            } else if new.is_none() && old.as_deref() == column.required_default() {
                // a placeholder written by an earlier update stands for null
                false
            } else {
                before.render() != after.render()
            };

            changed.then_some(FieldChange {
                before: old_clean,
                after: new_clean,
            })
        }
        _ => (before.render() != after.render()).then(|| FieldChange {
            before: before.render(),
            after: after.render(),
        }),
    }
}
