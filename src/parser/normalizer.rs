// file: src/parser/normalizer.rs
// description: coerces raw listing records into canonical novel records
// reference: internal field mapping table

use crate::models::{FieldValue, NovelRecord, RawRecord};
use crate::parser::fields::{ABSENT_DATE_SENTINELS, Coercion, FIELD_MAP, ID_KEY};
use crate::parser::patterns::DIGIT_GROUPING;
use crate::parser::text::{clean_text, collapse_control_whitespace};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const FALSY_STRINGS: [&str; 8] = ["", "0", "false", "n", "no", "off", "none", "null"];

/// Why a raw record could not take part in reconciliation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordRejected {
    #[error("record has no identifier")]
    MissingId,

    #[error("record identifier is not an integer: {0}")]
    InvalidId(String),
}

pub struct RecordNormalizer {
    source_offset: FixedOffset,
}

impl RecordNormalizer {
    pub fn new(source_utc_offset_hours: i32) -> Self {
        let source_offset =
            FixedOffset::east_opt(source_utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { source_offset }
    }

    pub fn source_offset(&self) -> FixedOffset {
        self.source_offset
    }

    /// `now` stands in for unparsable dates; it is the run timestamp, so
    /// every record of one run falls back to the same instant.
    pub fn normalize(
        &self,
        raw: &RawRecord,
        now: DateTime<FixedOffset>,
    ) -> Result<NovelRecord, RecordRejected> {
        let id = parse_id(raw.get(ID_KEY))?;
        let mut record = NovelRecord::new(id);

        for mapping in FIELD_MAP.iter() {
            let value = raw.get(mapping.source);
            let coerced = match mapping.coercion {
                Coercion::Text => {
                    FieldValue::Text(coerce_text(value).map(|t| collapse_control_whitespace(&t)))
                }
                Coercion::CleanText => {
                    FieldValue::Text(coerce_text(value).map(|t| clean_text(Some(&t))))
                }
                Coercion::Count => FieldValue::Int(coerce_count(value)),
                Coercion::Flag => FieldValue::Bool(coerce_flag(value)),
                Coercion::Timestamp => FieldValue::Date(self.coerce_timestamp(value, now)),
            };
            record.set(mapping.column, coerced);
        }

        Ok(record)
    }

    fn coerce_timestamp(
        &self,
        value: Option<&Value>,
        now: DateTime<FixedOffset>,
    ) -> Option<DateTime<FixedOffset>> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => {
                let s = s.trim();
                if ABSENT_DATE_SENTINELS.contains(&s) {
                    return None;
                }
                Some(self.parse_timestamp(s).unwrap_or(now))
            }
            // Integers are taken as unix seconds.
            Some(Value::Number(n)) => Some(
                n.as_i64()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map(|dt| dt.with_timezone(&self.source_offset))
                    .unwrap_or(now),
            ),
            Some(_) => Some(now),
        }
    }

    fn parse_timestamp(&self, s: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt);
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return self.source_offset.from_local_datetime(&naive).single();
            }
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| {
                self.source_offset
                    .from_local_datetime(&date.and_time(NaiveTime::MIN))
                    .single()
            })
    }
}

fn parse_id(value: Option<&Value>) -> Result<i64, RecordRejected> {
    match value {
        None | Some(Value::Null) => Err(RecordRejected::MissingId),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| RecordRejected::InvalidId(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| RecordRejected::InvalidId(s.clone())),
        Some(other) => Err(RecordRejected::InvalidId(other.to_string())),
    }
}

fn coerce_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // tag lists and the like are stored serialized
        other => Some(other.to_string()),
    }
}

fn coerce_count(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Some(Value::String(s)) => parse_count(s),
        _ => None,
    };

    parsed.unwrap_or(0).max(0)
}

fn parse_count(s: &str) -> Option<i64> {
    let s = s.trim();
    if DIGIT_GROUPING.is_match(s) {
        s.replace(',', "").parse().ok()
    } else {
        s.parse().ok()
    }
}

fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            let lowered = s.trim().to_ascii_lowercase();
            !FALSY_STRINGS.contains(&lowered.as_str())
        }
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-02-01T10:00:00+09:00").unwrap()
    }

    #[test]
    fn test_full_listing_record() {
        let normalizer = RecordNormalizer::new(9);
        let record = normalizer
            .normalize(
                &raw(json!({
                    "platform": "Munpia",
                    "id": 401234,
                    "title": "검\t\t의 노래",
                    "info": "<p>첫 줄<br/>둘째 줄</p>",
                    "author": "작가",
                    "href": "https://novel.munpia.com/401234",
                    "thumbnail": "https://cdn.example/cover.jpg",
                    "tag": "무협",
                    "the_number_of_serials": "1,204",
                    "view": 56789,
                    "newstatus": true,
                    "finishstatus": "N",
                    "agegrade": 0,
                    "registdate": "2023-05-01 09:15:00",
                    "updatedate": "-",
                    "sort_option": "A1"
                })),
                now(),
            )
            .unwrap();

        assert_eq!(record.id, 401234);
        assert_eq!(record.title.as_deref(), Some("검 의 노래"));
        assert_eq!(record.info.as_deref(), Some("첫 줄 둘째 줄"));
        assert_eq!(record.location.as_deref(), Some("https://novel.munpia.com/401234"));
        assert_eq!(record.chapter, 1204);
        assert_eq!(record.views, 56789);
        assert!(record.newstatus);
        assert!(!record.finishstatus);
        assert!(!record.agegrade);
        assert_eq!(
            record.registdate,
            Some(DateTime::parse_from_rfc3339("2023-05-01T09:15:00+09:00").unwrap())
        );
        assert_eq!(record.updatedate, None);
        assert_eq!(record.crawltime, None);
    }

    #[test]
    fn test_missing_id_rejected() {
        let normalizer = RecordNormalizer::new(9);
        let result = normalizer.normalize(&raw(json!({"title": "x"})), now());
        assert_eq!(result, Err(RecordRejected::MissingId));

        let result = normalizer.normalize(&raw(json!({"id": null})), now());
        assert_eq!(result, Err(RecordRejected::MissingId));
    }

    #[test]
    fn test_string_id_accepted_garbage_rejected() {
        let normalizer = RecordNormalizer::new(9);
        assert_eq!(
            normalizer.normalize(&raw(json!({"id": " 42 "})), now()).unwrap().id,
            42
        );
        assert!(matches!(
            normalizer.normalize(&raw(json!({"id": "abc"})), now()),
            Err(RecordRejected::InvalidId(_))
        ));
    }

    #[test]
    fn test_invalid_numbers_become_zero() {
        let normalizer = RecordNormalizer::new(9);
        let record = normalizer
            .normalize(
                &raw(json!({"id": 1, "the_number_of_serials": "many", "view": -5})),
                now(),
            )
            .unwrap();
        assert_eq!(record.chapter, 0);
        assert_eq!(record.views, 0);
    }

    #[test]
    fn test_unparsable_date_falls_back_to_now() {
        let normalizer = RecordNormalizer::new(9);
        let record = normalizer
            .normalize(
                &raw(json!({"id": 1, "registdate": "yesterday", "updatedate": "2024-06-30"})),
                now(),
            )
            .unwrap();
        assert_eq!(record.registdate, Some(now()));
        assert_eq!(
            record.updatedate,
            Some(DateTime::parse_from_rfc3339("2024-06-30T00:00:00+09:00").unwrap())
        );
    }

    #[test]
    fn test_rfc3339_keeps_its_offset() {
        let normalizer = RecordNormalizer::new(9);
        let record = normalizer
            .normalize(&raw(json!({"id": 1, "updatedate": "2024-06-30T23:10:00Z"})), now())
            .unwrap();
        assert_eq!(record.updatedate.unwrap().offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_flag_truthiness() {
        assert!(coerce_flag(Some(&json!("Y"))));
        assert!(coerce_flag(Some(&json!(1))));
        assert!(!coerce_flag(Some(&json!("false"))));
        assert!(!coerce_flag(Some(&json!(""))));
        assert!(!coerce_flag(None));
    }

    #[test]
    fn test_tag_list_serialized() {
        let normalizer = RecordNormalizer::new(9);
        let record = normalizer
            .normalize(&raw(json!({"id": 1, "tag": ["판타지", "회귀"]})), now())
            .unwrap();
        assert_eq!(record.tags.as_deref(), Some(r#"["판타지","회귀"]"#));
    }
}
