// file: src/models/novel.rs
// description: canonical novel record and typed column access
// reference: internal data structures

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

pub const DEFAULT_TITLE: &str = "Unknown Title";
pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_PLATFORM: &str = "Unknown";

/// One row of the novel table after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NovelRecord {
    pub id: i64,
    pub platform: Option<String>,
    pub title: Option<String>,
    pub info: Option<String>,
    pub author: Option<String>,
    pub location: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Option<String>,
    pub chapter: i64,
    pub views: i64,
    pub newstatus: bool,
    pub finishstatus: bool,
    pub agegrade: bool,
    pub registdate: Option<DateTime<FixedOffset>>,
    pub updatedate: Option<DateTime<FixedOffset>>,
    pub crawltime: Option<DateTime<FixedOffset>>,
}

/// Columns that take part in change detection. `id` and `crawltime` are not
/// among them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Platform,
    Title,
    Info,
    Author,
    Location,
    Thumbnail,
    Tags,
    Chapter,
    Views,
    NewStatus,
    FinishStatus,
    AgeGrade,
    RegistDate,
    UpdateDate,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::Platform,
        Column::Title,
        Column::Info,
        Column::Author,
        Column::Location,
        Column::Thumbnail,
        Column::Tags,
        Column::Chapter,
        Column::Views,
        Column::NewStatus,
        Column::FinishStatus,
        Column::AgeGrade,
        Column::RegistDate,
        Column::UpdateDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Platform => "platform",
            Column::Title => "title",
            Column::Info => "info",
            Column::Author => "author",
            Column::Location => "location",
            Column::Thumbnail => "thumbnail",
            Column::Tags => "tags",
            Column::Chapter => "chapter",
            Column::Views => "views",
            Column::NewStatus => "newstatus",
            Column::FinishStatus => "finishstatus",
            Column::AgeGrade => "agegrade",
            Column::RegistDate => "registdate",
            Column::UpdateDate => "updatedate",
        }
    }

    /// Placeholder an updated row gets when the column would otherwise be null.
    pub fn required_default(&self) -> Option<&'static str> {
        match self {
            Column::Title => Some(DEFAULT_TITLE),
            Column::Author => Some(DEFAULT_AUTHOR),
            Column::Platform => Some(DEFAULT_PLATFORM),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed column value, as read from or written into a [`NovelRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Int(i64),
    Bool(bool),
    Date(Option<DateTime<FixedOffset>>),
}

impl FieldValue {
    /// String form used for equality checks and the change log.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(value) => value.clone().unwrap_or_default(),
            FieldValue::Int(value) => value.to_string(),
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Date(value) => value
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }
}

impl NovelRecord {
    /// An otherwise empty record carrying only its identifier.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            platform: None,
            title: None,
            info: None,
            author: None,
            location: None,
            thumbnail: None,
            tags: None,
            chapter: 0,
            views: 0,
            newstatus: false,
            finishstatus: false,
            agegrade: false,
            registdate: None,
            updatedate: None,
            crawltime: None,
        }
    }

    pub fn get(&self, column: Column) -> FieldValue {
        match column {
            Column::Platform => FieldValue::Text(self.platform.clone()),
            Column::Title => FieldValue::Text(self.title.clone()),
            Column::Info => FieldValue::Text(self.info.clone()),
            Column::Author => FieldValue::Text(self.author.clone()),
            Column::Location => FieldValue::Text(self.location.clone()),
            Column::Thumbnail => FieldValue::Text(self.thumbnail.clone()),
            Column::Tags => FieldValue::Text(self.tags.clone()),
            Column::Chapter => FieldValue::Int(self.chapter),
            Column::Views => FieldValue::Int(self.views),
            Column::NewStatus => FieldValue::Bool(self.newstatus),
            Column::FinishStatus => FieldValue::Bool(self.finishstatus),
            Column::AgeGrade => FieldValue::Bool(self.agegrade),
            Column::RegistDate => FieldValue::Date(self.registdate),
            Column::UpdateDate => FieldValue::Date(self.updatedate),
        }
    }

    /// Writes `value` into `column`. A value of the wrong kind for the column
    /// is ignored; callers only ever move values between records of this type.
    pub fn set(&mut self, column: Column, value: FieldValue) {
        match (column, value) {
            (Column::Platform, FieldValue::Text(v)) => self.platform = v,
            (Column::Title, FieldValue::Text(v)) => self.title = v,
            (Column::Info, FieldValue::Text(v)) => self.info = v,
            (Column::Author, FieldValue::Text(v)) => self.author = v,
            (Column::Location, FieldValue::Text(v)) => self.location = v,
            (Column::Thumbnail, FieldValue::Text(v)) => self.thumbnail = v,
            (Column::Tags, FieldValue::Text(v)) => self.tags = v,
            (Column::Chapter, FieldValue::Int(v)) => self.chapter = v,
            (Column::Views, FieldValue::Int(v)) => self.views = v,
            (Column::NewStatus, FieldValue::Bool(v)) => self.newstatus = v,
            (Column::FinishStatus, FieldValue::Bool(v)) => self.finishstatus = v,
            (Column::AgeGrade, FieldValue::Bool(v)) => self.agegrade = v,
            (Column::RegistDate, FieldValue::Date(v)) => self.registdate = v,
            (Column::UpdateDate, FieldValue::Date(v)) => self.updatedate = v,
            (column, value) => {
                tracing::debug!("Ignoring {:?} for column {}", value, column);
            }
        }
    }

    /// Fills the text columns an existing row must never lose.
    pub fn apply_required_defaults(&mut self) {
        for column in Column::ALL {
            if let Some(default) = column.required_default()
                && self.get(column) == FieldValue::Text(None)
            {
                self.set(column, FieldValue::Text(Some(default.to_string())));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_round_trip_every_column() {
        let mut source = NovelRecord::new(7);
        source.title = Some("Title".to_string());
        source.views = 42;
        source.agegrade = true;

        let mut target = NovelRecord::new(7);
        for column in Column::ALL {
            target.set(column, source.get(column));
        }

        assert_eq!(source, target);
    }

    #[test]
    fn test_mismatched_value_is_ignored() {
        let mut record = NovelRecord::new(1);
        record.set(Column::Views, FieldValue::Text(Some("12".to_string())));
        assert_eq!(record.views, 0);
    }

    #[test]
    fn test_required_defaults_only_fill_nulls() {
        let mut record = NovelRecord::new(1);
        record.title = Some("Kept".to_string());
        record.apply_required_defaults();

        assert_eq!(record.title.as_deref(), Some("Kept"));
        assert_eq!(record.author.as_deref(), Some(DEFAULT_AUTHOR));
        assert_eq!(record.platform.as_deref(), Some(DEFAULT_PLATFORM));
    }

    #[test]
    fn test_render() {
        assert_eq!(FieldValue::Text(None).render(), "");
        assert_eq!(FieldValue::Int(15).render(), "15");
        assert_eq!(FieldValue::Bool(false).render(), "false");
        let dt = DateTime::parse_from_rfc3339("2024-03-01T08:30:00+09:00").unwrap();
        assert_eq!(FieldValue::Date(Some(dt)).render(), "2024-03-01 08:30:00");
    }
}
