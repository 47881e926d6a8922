//! Deduplication, ordering and serialization shared by every record shape.

use crate::domain::model::Record;
use crate::domain::ports::RecordShape;
use crate::utils::error::{CleanError, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::HashSet;

const PREVIEW_CHARS: usize = 120;

/// One position of a sort key.
#[derive(Debug, Clone)]
pub enum KeyPart {
    Text(String),
    Number(Number),
    Bool(bool),
}

impl KeyPart {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(KeyPart::Text(s.clone())),
            Value::Number(n) => Some(KeyPart::Number(n.clone())),
            Value::Bool(b) => Some(KeyPart::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            KeyPart::Text(_) => "string",
            KeyPart::Number(_) => "number",
            KeyPart::Bool(_) => "boolean",
        }
    }

    /// Booleans and numbers order together (false = 0, true = 1); text orders after them.
    fn rank(&self) -> u8 {
        match self {
            KeyPart::Bool(_) | KeyPart::Number(_) => 0,
            KeyPart::Text(_) => 1,
        }
    }

    /// Whether the two parts have a meaningful order between them.
    pub fn comparable(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }

    fn to_number(&self) -> Option<Number> {
        match self {
            KeyPart::Number(n) => Some(n.clone()),
            KeyPart::Bool(b) => Some(Number::from(u8::from(*b))),
            KeyPart::Text(_) => None,
        }
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    x.total_cmp(&y)
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            _ => match (self.to_number(), other.to_number()) {
                (Some(a), Some(b)) => compare_numbers(&a, &b),
                // 文字與數字之間的順序只讓 Ord 完整，sort_records 會在相同前綴時拒絕
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

/// A deduplicated record in canonical form, with its canonical key.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueRecord {
    pub key: String,
    pub record: Record,
}

fn preview(key: &str) -> String {
    if key.chars().count() <= PREVIEW_CHARS {
        key.to_string()
    } else {
        let head: String = key.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", head)
    }
}

/// Keeps the first occurrence of every structurally distinct record, in input order.
pub fn dedup_structural(records: Vec<Record>) -> Vec<UniqueRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter_map(|record| {
            let record = record.canonicalized();
            let key = record.value().to_string();
            seen.insert(key.clone()).then_some(UniqueRecord { key, record })
        })
        .collect()
}

struct Keyed {
    fields: Vec<&'static str>,
    parts: Vec<KeyPart>,
    unique: UniqueRecord,
}

/// Sorts by the shape's key, breaking ties by canonical key so the result
/// does not depend on input order.
///
/// Key values of different kinds are only an error where the ordering
/// actually depends on them: two records agree on every preceding key part
/// and differ in kind at the next one.
pub fn sort_records<R: RecordShape + ?Sized>(records: Vec<UniqueRecord>, shape: &R) -> Result<Vec<Record>> {
    let mut keyed: Vec<Keyed> = Vec::with_capacity(records.len());

    for unique in records {
        let mut fields = Vec::new();
        let mut parts = Vec::new();
        for (field, value) in shape.sort_key(&unique.record) {
            let value = value.ok_or_else(|| CleanError::KeySortError {
                field: field.to_string(),
                record: preview(&unique.key),
                reason: "is missing".to_string(),
            })?;
            let part = KeyPart::from_value(value).ok_or_else(|| CleanError::KeySortError {
                field: field.to_string(),
                record: preview(&unique.key),
                reason: format!("is not sortable ({})", value),
            })?;
            fields.push(field);
            parts.push(part);
        }
        keyed.push(Keyed { fields, parts, unique });
    }

    keyed.sort_by(|a, b| {
        a.parts
            .cmp(&b.parts)
            .then_with(|| a.unique.key.cmp(&b.unique.key))
    });

    // 相同前綴的記錄排在一起，型別不同的分界必定出現在相鄰兩筆之間
    for pair in keyed.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let differing = prev
            .parts
            .iter()
            .zip(&next.parts)
            .position(|(a, b)| a != b);
        if let Some(position) = differing {
            let (a, b) = (&prev.parts[position], &next.parts[position]);
            if !a.comparable(b) {
                return Err(CleanError::KeySortError {
                    field: next.fields[position].to_string(),
                    record: preview(&next.unique.key),
                    reason: format!(
                        "is a {} but a record with the same preceding key has a {}",
                        b.kind(),
                        a.kind()
                    ),
                });
            }
        }
    }

    Ok(keyed.into_iter().map(|keyed| keyed.unique.record).collect())
}

/// JSON array with `indent` spaces per level, UTF-8.
pub fn to_pretty_json(records: &[Record], indent: usize) -> Result<Vec<u8>> {
    let indent = " ".repeat(indent);
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records.serialize(&mut serializer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    struct ByCode;

    impl RecordShape for ByCode {
        fn label(&self) -> &'static str {
            "courses"
        }

        fn extract(&self, _source: &Path, _document: Value) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        fn sort_key<'a>(&self, record: &'a Record) -> Vec<(&'static str, Option<&'a Value>)> {
            vec![("code", record.field("code")), ("termInd", record.field("termInd"))]
        }

        fn output_stem(&self, _input: &Path) -> Result<String> {
            Ok("test".to_string())
        }
    }

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().map(Record::new).collect()
    }

    fn unique(values: Vec<Value>) -> Vec<UniqueRecord> {
        dedup_structural(records(values))
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let input = records(vec![
            json!({"code": "MAC", "termInd": 2}),
            json!({"code": "COP", "termInd": 1}),
            json!({"termInd": 2, "code": "MAC"}),
            json!({"code": "COP", "termInd": 1}),
        ]);

        let unique = dedup_structural(input);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].record.field("code"), Some(&json!("MAC")));
        assert_eq!(unique[1].record.field("code"), Some(&json!("COP")));
        assert_eq!(unique[1].key, r#"{"code":"COP","termInd":1}"#);
    }

    #[test]
    fn test_dedup_keeps_different_term_ind() {
        let input = records(vec![
            json!({"code": "COP", "termInd": 1}),
            json!({"code": "COP", "termInd": 2}),
        ]);
        assert_eq!(dedup_structural(input).len(), 2);
    }

    #[test]
    fn test_sort_orders_by_key_then_canonical() {
        let input = unique(vec![
            json!({"code": "MAC", "termInd": 1}),
            json!({"code": "COP", "termInd": 10, "seats": 5}),
            json!({"code": "COP", "termInd": 2}),
            json!({"code": "COP", "termInd": 10, "seats": 3}),
        ]);

        let sorted = sort_records(input, &ByCode).unwrap();
        let keys: Vec<String> = sorted.iter().map(|r| r.canonical_key()).collect();
        assert_eq!(
            keys,
            vec![
                r#"{"code":"COP","termInd":2}"#,
                r#"{"code":"COP","seats":3,"termInd":10}"#,
                r#"{"code":"COP","seats":5,"termInd":10}"#,
                r#"{"code":"MAC","termInd":1}"#,
            ]
        );
    }

    #[test]
    fn test_sort_is_independent_of_input_order() {
        let forward = unique(vec![
            json!({"code": "COP", "termInd": 1, "x": "b"}),
            json!({"code": "COP", "termInd": 1, "x": "a"}),
            json!({"code": "ABC", "termInd": 3}),
        ]);
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(
            sort_records(forward, &ByCode).unwrap(),
            sort_records(backward, &ByCode).unwrap()
        );
    }

    #[test]
    fn test_sort_missing_field_is_an_error() {
        let input = unique(vec![json!({"code": "COP", "termInd": 1}), json!({"termInd": 2})]);

        match sort_records(input, &ByCode) {
            Err(CleanError::KeySortError { field, reason, .. }) => {
                assert_eq!(field, "code");
                assert_eq!(reason, "is missing");
            }
            other => panic!("expected KeySortError, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_kinds_behind_a_distinct_prefix_sort() {
        let input = unique(vec![
            json!({"code": "MAC", "termInd": "1"}),
            json!({"code": "COP", "termInd": 1}),
        ]);

        let sorted = sort_records(input, &ByCode).unwrap();
        assert_eq!(sorted[0].field("termInd"), Some(&json!(1)));
        assert_eq!(sorted[1].field("termInd"), Some(&json!("1")));
    }

    #[test]
    fn test_mixed_kinds_under_equal_prefix_is_an_error() {
        let input = unique(vec![
            json!({"code": "COP", "termInd": 1}),
            json!({"code": "MAC", "termInd": 2}),
            json!({"code": "COP", "termInd": "1"}),
        ]);

        match sort_records(input, &ByCode) {
            Err(CleanError::KeySortError { field, .. }) => assert_eq!(field, "termInd"),
            other => panic!("expected KeySortError, got {:?}", other),
        }
    }

    #[test]
    fn test_booleans_order_with_numbers() {
        let input = unique(vec![
            json!({"code": "COP", "termInd": 2}),
            json!({"code": "COP", "termInd": true}),
            json!({"code": "COP", "termInd": 0}),
        ]);

        let sorted = sort_records(input, &ByCode).unwrap();
        let terms: Vec<&Value> = sorted.iter().filter_map(|r| r.field("termInd")).collect();
        assert_eq!(terms, vec![&json!(0), &json!(true), &json!(2)]);
        assert!(KeyPart::Bool(false) < KeyPart::Number(Number::from(1)));
    }

    #[test]
    fn test_sort_rejects_null_key() {
        let input = unique(vec![json!({"code": null, "termInd": 1})]);
        assert!(matches!(
            sort_records(input, &ByCode),
            Err(CleanError::KeySortError { .. })
        ));
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert!(KeyPart::Number(Number::from(2)) < KeyPart::Number(Number::from(10)));
        assert!(KeyPart::Number(Number::from(-1)) < KeyPart::Number(Number::from(3u64)));
        let half = Number::from_f64(0.5).unwrap();
        assert!(KeyPart::Number(half) < KeyPart::Number(Number::from(1)));
    }

    #[test]
    fn test_pretty_json_uses_four_space_indent() {
        let output = to_pretty_json(&records(vec![json!({"code": "COP"})]), 4).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "[\n    {\n        \"code\": \"COP\"\n    }\n]"
        );

        assert_eq!(to_pretty_json(&[], 4).unwrap(), b"[]");
    }
}
