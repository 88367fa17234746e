use crate::adapters::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::core::ConfigProvider;
use crate::utils::error::{AnalyzerError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATA_DIR: &str = "./hts-data";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AnalyzerError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AnalyzerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Builds a configuration from `GEMINI_*` and `HTS_DATA_DIR` when no file is given.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            classifier: ClassifierConfig {
                endpoint: var("GEMINI_ENDPOINT").unwrap_or_else(default_endpoint),
                model: var("GEMINI_MODEL").unwrap_or_else(default_model),
                api_key: var("GEMINI_API_KEY"),
                timeout_seconds: var("GEMINI_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()),
            },
            storage: StorageConfig {
                data_dir: var("HTS_DATA_DIR").unwrap_or_else(default_data_dir),
            },
            logging: None,
        }
    }

    /// Replaces `${VAR}` placeholders with environment values; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AnalyzerError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("classifier.endpoint", &self.classifier.endpoint)?;
        validate_non_empty_string("classifier.model", &self.classifier.model)?;

        let api_key = validate_required_field("classifier.api_key", &self.classifier.api_key)?;
        if api_key.starts_with("${") {
            return Err(AnalyzerError::MissingConfigError {
                field: "classifier.api_key".to_string(),
            });
        }
        validate_non_empty_string("classifier.api_key", api_key)?;

        if let Some(timeout) = self.classifier.timeout_seconds {
            validate_range("classifier.timeout_seconds", timeout, 1, 600)?;
        }

        validate_path("storage.data_dir", &self.storage.data_dir)?;
        Ok(())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn classifier_endpoint(&self) -> &str {
        &self.classifier.endpoint
    }

    fn model(&self) -> &str {
        &self.classifier.model
    }

    fn api_key(&self) -> &str {
        self.classifier.api_key.as_deref().unwrap_or_default()
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.classifier.timeout_seconds
    }

    fn data_dir(&self) -> &str {
        &self.storage.data_dir
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[classifier]
endpoint = "https://generativelanguage.googleapis.com"
model = "gemini-2.5-pro"
api_key = "abc123"
timeout_seconds = 60

[storage]
data_dir = "/var/lib/hts"

[logging]
level = "debug"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.model(), "gemini-2.5-pro");
        assert_eq!(config.api_key(), "abc123");
        assert_eq!(config.timeout_seconds(), Some(60));
        assert_eq!(config.data_dir(), "/var/lib/hts");
        assert_eq!(config.log_level(), Some("debug"));
        assert!(!config.json_logging());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = TomlConfig::from_toml_str("[classifier]\napi_key = \"k\"\n").unwrap();

        assert_eq!(config.classifier_endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.data_dir(), DEFAULT_DATA_DIR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HTS_TEST_GEMINI_KEY", "from-env");

        let toml_content = r#"
[classifier]
api_key = "${HTS_TEST_GEMINI_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), "from-env");

        std::env::remove_var("HTS_TEST_GEMINI_KEY");
    }

    #[test]
    fn test_unresolved_api_key_fails_validation() {
        let toml_content = r#"
[classifier]
api_key = "${HTS_TEST_SURELY_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(AnalyzerError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[classifier]
endpoint = "invalid-url"
api_key = "k"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let missing_key = TomlConfig::from_toml_str("[classifier]\n").unwrap();
        assert!(missing_key.validate().is_err());

        let bad_timeout =
            TomlConfig::from_toml_str("[classifier]\napi_key = \"k\"\ntimeout_seconds = 0\n")
                .unwrap();
        assert!(bad_timeout.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[classifier]\napi_key = \"file-key\"\n\n[storage]\ndata_dir = \"./d\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.api_key(), "file-key");
        assert_eq!(config.data_dir(), "./d");
    }
}
