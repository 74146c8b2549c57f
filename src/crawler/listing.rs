// file: src/crawler/listing.rs
// description: listing api response shape and item to raw record mapping
// reference: serde_json value mapping for listing api items

use crate::models::RawRecord;
use serde::Deserialize;
use serde_json::Value;

pub const NOVEL_PAGE_BASE: &str = "https://novel.munpia.com";

#[derive(Debug, Deserialize)]
pub struct ListingResponse {
    pub content: ListingContent,
}

#[derive(Debug, Deserialize)]
pub struct ListingContent {
    #[serde(default)]
    pub list: Vec<Value>,
}

/// (raw record key, listing item key)
const ITEM_FIELDS: [(&str, &str); 12] = [
    ("title", "title"),
    ("info", "story"),
    ("author", "author"),
    ("thumbnail", "cover"),
    ("tag", "genreText"),
    ("the_number_of_serials", "sumEntry"),
    ("view", "nvSumHit"),
    ("newstatus", "isNew"),
    ("finishstatus", "isFinish"),
    ("agegrade", "isAdult"),
    ("registdate", "registDate"),
    ("updatedate", "updateDate"),
];

/// Maps one listing item onto the raw record layout the normalizer reads.
/// Items that are not JSON objects yield nothing.
pub fn map_listing_item(item: &Value, platform: &str) -> Option<RawRecord> {
    let item = item.as_object()?;
    let mut record = RawRecord::new();

    let id = item.get("nvSrl").cloned().unwrap_or(Value::Null);
    let href = match &id {
        Value::String(s) if !s.trim().is_empty() => {
            Value::String(format!("{}/{}", NOVEL_PAGE_BASE, s.trim()))
        }
        Value::Number(n) => Value::String(format!("{}/{}", NOVEL_PAGE_BASE, n)),
        _ => Value::Null,
    };

    record.insert("platform".to_string(), Value::String(platform.to_string()));
    record.insert("id".to_string(), id);
    record.insert("href".to_string(), href);

    for (key, source) in ITEM_FIELDS {
        let value = item.get(source).cloned().unwrap_or(Value::Null);
        record.insert(key.to_string(), value);
    }

    record.insert(
        "sort_option".to_string(),
        item.get("nvNgCode").cloned().unwrap_or(Value::Null),
    );

    Some(record)
}
