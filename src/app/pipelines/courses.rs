use crate::core::{Record, RecordShape};
use crate::utils::error::{CleanError, Result};
use serde_json::Value;
use std::path::Path;

pub const COURSES_FIELD: &str = "COURSES";
pub const COURSE_SORT_FIELDS: [&str; 3] = ["code", "name", "termInd"];

/// 學期記錄陣列 → 所有 `COURSES` 攤平後依 (code, name, termInd) 排序
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseShape;

impl RecordShape for CourseShape {
    fn label(&self) -> &'static str {
        "courses"
    }

    fn extract(&self, source: &Path, document: Value) -> Result<Vec<Record>> {
        let malformed = |message: String| CleanError::MalformedInputError {
            path: source.to_path_buf(),
            message,
        };

        let Value::Array(terms) = document else {
            return Err(malformed(
                "expected a JSON array of term records".to_string(),
            ));
        };

        let mut records = Vec::new();
        for (index, term) in terms.into_iter().enumerate() {
            let Value::Object(mut term) = term else {
                return Err(malformed(format!("term record {} is not an object", index)));
            };

            match term.remove(COURSES_FIELD) {
                // 沒有 COURSES 視為該學期沒有課程
                None => tracing::debug!("Term record {} has no {}", index, COURSES_FIELD),
                Some(Value::Array(courses)) => {
                    records.extend(courses.into_iter().map(Record::new));
                }
                Some(_) => {
                    return Err(malformed(format!(
                        "{} of term record {} is not an array",
                        COURSES_FIELD, index
                    )));
                }
            }
        }

        Ok(records)
    }

    fn sort_key<'a>(&self, record: &'a Record) -> Vec<(&'static str, Option<&'a Value>)> {
        COURSE_SORT_FIELDS
            .iter()
            .map(|field| (*field, record.field(field)))
            .collect()
    }

    fn output_stem(&self, input: &Path) -> Result<String> {
        input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| CleanError::InvalidConfigValueError {
                field: "input".to_string(),
                value: input.display().to_string(),
                reason: "Path has no file name".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(document: Value) -> Result<Vec<Record>> {
        CourseShape.extract(Path::new("terms.json"), document)
    }

    #[test]
    fn test_extract_flattens_all_terms() {
        let document = json!([
            {"COURSES": [{"code": "COP"}, {"code": "MAC"}], "LASTCONTROLNUMBER": 2},
            {"COURSES": [{"code": "COP"}]}
        ]);

        let records = extract(document).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].field("code"), Some(&json!("COP")));
    }

    #[test]
    fn test_missing_courses_contributes_nothing() {
        let document = json!([{"RETRIEVEDROWS": 0}, {"COURSES": [{"code": "COP"}]}]);
        assert_eq!(extract(document).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_documents() {
        for document in [
            json!({"COURSES": []}),
            json!(["not a term"]),
            json!([{"COURSES": null}]),
            json!([{"COURSES": {"code": "COP"}}]),
        ] {
            assert!(matches!(
                extract(document),
                Err(CleanError::MalformedInputError { .. })
            ));
        }
    }

    #[test]
    fn test_sort_key_fields() {
        let record = Record::new(json!({"code": "COP", "termInd": 1}));
        let key = CourseShape.sort_key(&record);
        assert_eq!(key[0], ("code", Some(&json!("COP"))));
        assert_eq!(key[1], ("name", None));
        assert_eq!(key[2], ("termInd", Some(&json!(1))));
    }

    #[test]
    fn test_output_stem() {
        let stem = CourseShape
            .output_stem(Path::new("../courses/UF_Jun-30-2023_23_fall.json"))
            .unwrap();
        assert_eq!(stem, "UF_Jun-30-2023_23_fall");
    }
}
