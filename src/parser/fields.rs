// file: src/parser/fields.rs
// description: static mapping from listing snapshot keys to table columns
// reference: internal data structures

use crate::models::Column;

/// Key carrying the record identifier in raw records.
pub const ID_KEY: &str = "id";

/// How a raw value is coerced before it lands in its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Verbatim text with control whitespace collapsed.
    Text,
    /// Markup stripped and whitespace collapsed.
    CleanText,
    /// Non-negative integer, zero on failure.
    Count,
    /// Truthiness, false on null.
    Flag,
    /// ISO-8601 timestamp; sentinel to null, garbage to the run time.
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub source: &'static str,
    pub column: Column,
    pub coercion: Coercion,
}

const fn map(source: &'static str, column: Column, coercion: Coercion) -> FieldMapping {
    FieldMapping {
        source,
        column,
        coercion,
    }
}

pub const FIELD_MAP: [FieldMapping; 14] = [
    map("platform", Column::Platform, Coercion::Text),
    map("title", Column::Title, Coercion::Text),
    map("info", Column::Info, Coercion::CleanText),
    map("author", Column::Author, Coercion::Text),
    map("href", Column::Location, Coercion::Text),
    map("thumbnail", Column::Thumbnail, Coercion::Text),
    map("tag", Column::Tags, Coercion::Text),
    map("the_number_of_serials", Column::Chapter, Coercion::Count),
    map("view", Column::Views, Coercion::Count),
    map("newstatus", Column::NewStatus, Coercion::Flag),
    map("finishstatus", Column::FinishStatus, Coercion::Flag),
    map("agegrade", Column::AgeGrade, Coercion::Flag),
    map("registdate", Column::RegistDate, Coercion::Timestamp),
    map("updatedate", Column::UpdateDate, Coercion::Timestamp),
];

/// Raw date strings meaning "no date".
pub const ABSENT_DATE_SENTINELS: [&str; 2] = ["-", ""];
