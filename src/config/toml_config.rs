use crate::config::{JobConfig, DEFAULT_DEPARTMENTS_NAME, DEFAULT_INDENT, DEFAULT_OUTPUT_DIR, DEFAULT_SUFFIX};
use crate::domain::model::CourseQuery;
use crate::utils::error::{CleanError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LOGIN_PATH: &str = "/shib/login";
const DEFAULT_CONFIRMATION_PATH: &str = "/myschedule/";
const DEFAULT_SEARCH_PATH: &str = "/api/myschedule/course-search";
const DEFAULT_CONFIRMATION_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: Option<InputConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    pub portal: Option<PortalConfig>,
    pub query: Option<CourseQuery>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    pub suffix: Option<String>,
    pub indent: Option<usize>,
    pub departments_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub login_path: Option<String>,
    pub confirmation_path: Option<String>,
    pub search_path: Option<String>,
    pub confirmation_timeout_seconds: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
    pub max_pages: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl PortalConfig {
    pub fn login_path(&self) -> &str {
        self.login_path.as_deref().unwrap_or(DEFAULT_LOGIN_PATH)
    }

    pub fn confirmation_path(&self) -> &str {
        self.confirmation_path
            .as_deref()
            .unwrap_or(DEFAULT_CONFIRMATION_PATH)
    }

    pub fn search_path(&self) -> &str {
        self.search_path.as_deref().unwrap_or(DEFAULT_SEARCH_PATH)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(
            self.confirmation_timeout_seconds
                .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECONDS),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        )
    }

    pub fn max_pages(&self) -> u64 {
        self.max_pages.unwrap_or(1)
    }
}

impl Validate for PortalConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("portal.base_url", &self.base_url)?;
        validation::validate_resolved_secret("portal.username", &self.username)?;
        validation::validate_resolved_secret("portal.password", &self.password)?;
        validation::validate_positive_number(
            "portal.confirmation_timeout_seconds",
            self.confirmation_timeout().as_secs(),
            1,
        )?;
        validation::validate_positive_number("portal.max_pages", self.max_pages(), 1)?;
        Ok(())
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CleanError::ConfigError {
                message: format!("config file {} not found", path.display()),
            },
            _ => CleanError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CleanError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PORTAL_PASSWORD})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CleanError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_ref().map(|input| input.path.as_path())
    }

    pub fn output_dir(&self) -> &Path {
        self.output
            .dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR))
    }

    pub fn output_suffix(&self) -> &str {
        self.output.suffix.as_deref().unwrap_or(DEFAULT_SUFFIX)
    }

    pub fn indent(&self) -> usize {
        self.output.indent.unwrap_or(DEFAULT_INDENT)
    }

    pub fn departments_name(&self) -> &str {
        self.output
            .departments_name
            .as_deref()
            .unwrap_or(DEFAULT_DEPARTMENTS_NAME)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn portal(&self) -> Result<&PortalConfig> {
        validation::validate_required_field("portal", &self.portal)
    }

    /// 以檔案設定組出工作設定；`input` 優先於 `[input].path`
    pub fn job_config(&self, input: Option<PathBuf>) -> Result<JobConfig> {
        let input_path = match input {
            Some(path) => path,
            None => validation::validate_required_field("input.path", &self.input)?
                .path
                .clone(),
        };

        Ok(JobConfig {
            input_path,
            output_dir: self.output_dir().to_path_buf(),
            output_suffix: self.output_suffix().to_string(),
            indent: self.indent(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("output.dir", self.output_dir())?;
        validation::validate_range("output.indent", self.indent(), 0, 16)?;
        validation::validate_non_empty_string("output.departments_name", self.departments_name())?;
        if let Some(portal) = &self.portal {
            portal.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[input]
path = "../courses/UF_Jun-30-2023_23_fall.json"

[output]
dir = "./out"
indent = 2

[portal]
base_url = "https://one.uf.edu"
username = "student"
password = "secret"
max_pages = 3

[query]
term = "2238"
course_code = "COP"
days = ["M", "W"]

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.input_path(),
            Some(Path::new("../courses/UF_Jun-30-2023_23_fall.json"))
        );
        assert_eq!(config.output_dir(), Path::new("./out"));
        assert_eq!(config.output_suffix(), "_clean");
        assert_eq!(config.indent(), 2);
        assert!(config.monitoring_enabled());

        let portal = config.portal().unwrap();
        assert_eq!(portal.login_path(), "/shib/login");
        assert_eq!(portal.max_pages(), 3);
        assert_eq!(portal.confirmation_timeout(), Duration::from_secs(60));
        assert_eq!(config.query.as_ref().unwrap().term.as_deref(), Some("2238"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.output_dir(), Path::new("../courses"));
        assert_eq!(config.indent(), 4);
        assert_eq!(config.departments_name(), "depts");
        assert!(matches!(
            config.portal(),
            Err(CleanError::MissingConfigError { .. })
        ));
        assert!(matches!(
            config.job_config(None),
            Err(CleanError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COURSE_CLEAN_TEST_PASSWORD", "from-env");

        let toml_content = r#"
[portal]
base_url = "https://one.uf.edu"
username = "student"
password = "${COURSE_CLEAN_TEST_PASSWORD}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.portal().unwrap().password, "from-env");

        std::env::remove_var("COURSE_CLEAN_TEST_PASSWORD");
    }

    #[test]
    fn test_unresolved_credentials_fail_validation() {
        let toml_content = r#"
[portal]
base_url = "https://one.uf.edu"
username = "student"
password = "${COURSE_CLEAN_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_job_config_prefers_explicit_input() {
        let toml_content = r#"
[input]
path = "from_file.json"
[output]
suffix = "_dedup"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        let job = config.job_config(Some(PathBuf::from("explicit.json"))).unwrap();
        assert_eq!(job.input_path, PathBuf::from("explicit.json"));
        assert_eq!(job.output_suffix, "_dedup");

        let job = config.job_config(None).unwrap();
        assert_eq!(job.input_path, PathBuf::from("from_file.json"));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[output]\ndir = \"/tmp/courses\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_dir(), Path::new("/tmp/courses"));
    }

    #[test]
    fn test_missing_config_file() {
        assert!(matches!(
            TomlConfig::from_file("/definitely/not/here.toml"),
            Err(CleanError::ConfigError { .. })
        ));
    }
}
