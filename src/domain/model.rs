use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 一筆 JSON 記錄（課程物件或系所名稱字串），原樣保留所有欄位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Value);

impl Record {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Same record with every object's keys sorted, recursively.
    pub fn canonicalized(self) -> Self {
        Self(canonicalize(self.0))
    }

    /// Compact JSON of the canonical form. Equal keys mean structurally equal records.
    pub fn canonical_key(&self) -> String {
        canonicalize(self.0.clone()).to_string()
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// serde_json 的 Map 可能是 IndexMap（preserve_order），所以明確排序
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// transform 階段的產物
#[derive(Debug, Clone)]
pub struct NormalizeResult {
    pub records: Vec<Record>,
    pub input_count: usize,
}

impl NormalizeResult {
    pub fn unique_count(&self) -> usize {
        self.records.len()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.input_count.saturating_sub(self.records.len())
    }
}

/// Filters for the portal's course-search endpoint. Unset fields fall back
/// to the defaults the portal's own search form sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseQuery {
    pub term: Option<String>,
    pub category: Option<String>,
    pub course_code: Option<String>,
    pub course_title: Option<String>,
    pub class_num: Option<String>,
    pub dept: Option<String>,
    pub instructor: Option<String>,
    pub credits: Option<String>,
    /// Meeting days as portal letters: M, T, W, R, F, S.
    pub days: Option<Vec<String>>,
    pub fits_schedule: Option<bool>,
    pub no_open_seats: Option<bool>,
    /// Raw parameter overrides, applied last.
    pub extra: Option<BTreeMap<String, String>>,
}

const SEARCH_DEFAULTS: &[(&str, &str)] = &[
    ("ai", "false"),
    ("auf", "false"),
    ("category", "CWSP"),
    ("class-num", ""),
    ("course-code", ""),
    ("course-title", ""),
    ("cred-srch", ""),
    ("credits", ""),
    ("day-f", ""),
    ("day-m", ""),
    ("day-r", ""),
    ("day-s", ""),
    ("day-t", ""),
    ("day-w", ""),
    ("dept", ""),
    ("eep", ""),
    ("fitsSchedule", "false"),
    ("ge", ""),
    ("ge-b", ""),
    ("ge-c", ""),
    ("ge-d", ""),
    ("ge-h", ""),
    ("ge-m", ""),
    ("ge-n", ""),
    ("ge-p", ""),
    ("ge-s", ""),
    ("instructor", ""),
    ("last-control-number", "0"),
    ("level-max", ""),
    ("level-min", ""),
    ("no-open-seats", "false"),
    ("online-a", ""),
    ("online-c", ""),
    ("online-h", ""),
    ("online-p", ""),
    ("period-b", ""),
    ("period-e", ""),
    ("prog-level", ""),
    ("qst-1", ""),
    ("qst-2", ""),
    ("qst-3", ""),
    ("quest", "false"),
    ("term", ""),
    ("wr-2000", ""),
    ("wr-4000", ""),
    ("wr-6000", ""),
    ("writing", "false"),
    ("var-cred", ""),
    ("hons", "false"),
];

impl CourseQuery {
    pub fn term_label(&self) -> &str {
        self.term.as_deref().unwrap_or("all")
    }

    /// 組出完整查詢參數，順序與入口網站表單一致
    pub fn to_params(&self, last_control_number: u64) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = SEARCH_DEFAULTS
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let mut set = |key: &str, value: String| {
            if let Some(slot) = params.iter_mut().find(|(k, _)| k == key) {
                slot.1 = value;
            } else {
                params.push((key.to_string(), value));
            }
        };

        let optional = [
            ("term", &self.term),
            ("category", &self.category),
            ("course-code", &self.course_code),
            ("course-title", &self.course_title),
            ("class-num", &self.class_num),
            ("dept", &self.dept),
            ("instructor", &self.instructor),
            ("credits", &self.credits),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                set(key, value.clone());
            }
        }

        if let Some(days) = &self.days {
            for day in days {
                let key = format!("day-{}", day.to_lowercase());
                set(&key, day.to_uppercase());
            }
        }
        if let Some(fits) = self.fits_schedule {
            set("fitsSchedule", fits.to_string());
        }
        if let Some(no_open) = self.no_open_seats {
            set("no-open-seats", no_open.to_string());
        }
        if let Some(extra) = &self.extra {
            for (key, value) in extra {
                set(key, value.clone());
            }
        }

        set("last-control-number", last_control_number.to_string());
        params
    }
}
