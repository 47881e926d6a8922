use crate::config::DEFAULT_DEPARTMENTS_NAME;
use crate::core::{Record, RecordShape};
use crate::utils::error::{CleanError, Result};
use serde_json::Value;
use std::path::Path;

pub const SECTIONS_FIELD: &str = "sections";
pub const DEPT_NAME_FIELD: &str = "deptName";

/// Course records → unique `sections[*].deptName` strings, sorted.
#[derive(Debug, Clone)]
pub struct DepartmentShape {
    output_name: String,
}

impl DepartmentShape {
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
        }
    }
}

impl Default for DepartmentShape {
    fn default() -> Self {
        Self::new(DEFAULT_DEPARTMENTS_NAME)
    }
}

impl RecordShape for DepartmentShape {
    fn label(&self) -> &'static str {
        "departments"
    }

    fn extract(&self, source: &Path, document: Value) -> Result<Vec<Record>> {
        let malformed = |message: String| CleanError::MalformedInputError {
            path: source.to_path_buf(),
            message,
        };

        let Value::Array(courses) = document else {
            return Err(malformed("expected a JSON array of course records".to_string()));
        };

        let mut names = Vec::new();
        for (index, course) in courses.into_iter().enumerate() {
            let Value::Object(course) = course else {
                return Err(malformed(format!("course {} is not an object", index)));
            };
            let sections = match course.get(SECTIONS_FIELD) {
                None => continue,
                Some(Value::Array(sections)) => sections,
                Some(_) => {
                    return Err(malformed(format!(
                        "{} of course {} is not an array",
                        SECTIONS_FIELD, index
                    )));
                }
            };

            for section in sections {
                match section.get(DEPT_NAME_FIELD) {
                    Some(Value::String(name)) => {
                        names.push(Record::new(Value::String(name.clone())));
                    }
                    other => {
                        let reason = match other {
                            None => "is missing".to_string(),
                            Some(value) => format!("is not a string ({})", value),
                        };
                        return Err(CleanError::KeySortError {
                            field: DEPT_NAME_FIELD.to_string(),
                            record: format!("course {} section", index),
                            reason,
                        });
                    }
                }
            }
        }

        Ok(names)
    }

    fn sort_key<'a>(&self, record: &'a Record) -> Vec<(&'static str, Option<&'a Value>)> {
        vec![(DEPT_NAME_FIELD, Some(record.value()))]
    }

    fn output_stem(&self, _input: &Path) -> Result<String> {
        Ok(self.output_name.clone())
    }

    fn log_unique(&self, records: &[Record]) {
        for record in records {
            match record.value() {
                Value::String(name) => tracing::debug!("{}", name),
                other => tracing::debug!("{}", other),
            }
        }
    }
}
