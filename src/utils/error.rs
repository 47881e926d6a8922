use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Input file not found: {}", .path.display())]
    NotFoundError { path: PathBuf },

    #[error("Malformed input in {}: {message}", .path.display())]
    MalformedInputError { path: PathBuf, message: String },

    #[error("Cannot sort record {record}: field '{field}' {reason}")]
    KeySortError {
        field: String,
        record: String,
        reason: String,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Portal fetch failed: {message}")]
    FetchError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl From<reqwest::Error> for CleanError {
    fn from(err: reqwest::Error) -> Self {
        CleanError::FetchError {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Output,
    Network,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl CleanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CleanError::NotFoundError { .. } | CleanError::MalformedInputError { .. } => {
                ErrorCategory::Input
            }
            CleanError::KeySortError { .. } | CleanError::SerializationError(_) => {
                ErrorCategory::Data
            }
            CleanError::WriteError { .. } => ErrorCategory::Output,
            CleanError::FetchError { .. } => ErrorCategory::Network,
            CleanError::ConfigError { .. }
            | CleanError::MissingConfigError { .. }
            | CleanError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CleanError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路問題通常重試即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Data | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Output | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 依嚴重程度決定的行程結束碼，永遠非零
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CleanError::NotFoundError { .. } => "Check the input path; it is resolved relative to the working directory",
            CleanError::MalformedInputError { .. } => {
                "The input must be a JSON array of term records (or course records for departments)"
            }
            CleanError::KeySortError { .. } => {
                "Every course needs code, name and termInd of a consistent type; fix the scraped data"
            }
            CleanError::WriteError { .. } => "Make sure the output directory exists or can be created and is writable",
            CleanError::FetchError { .. } => {
                "Confirm the second-factor prompt in time, check credentials, then run again"
            }
            CleanError::IoError(_) => "Check file permissions and available disk space",
            CleanError::SerializationError(_) => "The records could not be serialized back to JSON",
            CleanError::ConfigError { .. }
            | CleanError::MissingConfigError { .. }
            | CleanError::InvalidConfigValueError { .. } => {
                "Review the command-line flags and the TOML configuration file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CleanError::NotFoundError { path } => {
                format!("Could not find input file {}", path.display())
            }
            CleanError::MalformedInputError { path, message } => {
                format!("{} is not valid course data: {}", path.display(), message)
            }
            CleanError::KeySortError { field, reason, .. } => {
                format!("A record could not be sorted because '{}' {}", field, reason)
            }
            CleanError::WriteError { path, .. } => {
                format!("Could not write output file {}", path.display())
            }
            CleanError::FetchError { message } => format!("Fetching from the portal failed: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CleanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_non_zero() {
        let errors = vec![
            CleanError::NotFoundError {
                path: PathBuf::from("missing.json"),
            },
            CleanError::KeySortError {
                field: "code".to_string(),
                record: "{}".to_string(),
                reason: "is missing".to_string(),
            },
            CleanError::WriteError {
                path: PathBuf::from("out.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            },
            CleanError::FetchError {
                message: "timeout".to_string(),
            },
        ];

        let codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        assert_eq!(codes, vec![1, 1, 3, 2]);
    }

    #[test]
    fn test_error_messages() {
        let err = CleanError::KeySortError {
            field: "termInd".to_string(),
            record: r#"{"code":"COP"}"#.to_string(),
            reason: "is missing".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(
            err.to_string(),
            r#"Cannot sort record {"code":"COP"}: field 'termInd' is missing"#
        );
        assert!(err.user_friendly_message().contains("termInd"));
    }
}
