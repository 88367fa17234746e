use thiserror::Error;

/// Message shown when the classification backend fails for any reason.
pub const CLASSIFICATION_FAILURE_MESSAGE: &str =
    "Failed to analyze the HTS code. Please check your API key and try again.";

/// Message shown when a heading scan fails.
pub const HEADING_SCAN_FAILURE_MESSAGE: &str = "Failed to scan document headings.";

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No reference material loaded: add a document or at least one manual entry")]
    NotReady,

    #[error("No reference document loaded")]
    NoDocument,

    #[error("Invalid HTS code input: {raw:?}")]
    InvalidCode { raw: String },

    #[error("Manual entry not found: {id}")]
    UnknownEntry { id: String },

    #[error("{message}")]
    Classification { message: String },

    #[error("{message}")]
    HeadingExtraction { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Validation error in '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Backend returned an error ({status:?}): {message}")]
    BackendError {
        status: Option<u16>,
        message: String,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Reference,
    Input,
    Backend,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AnalyzerError {
    pub fn classification() -> Self {
        AnalyzerError::Classification {
            message: CLASSIFICATION_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn heading_extraction() -> Self {
        AnalyzerError::HeadingExtraction {
            message: HEADING_SCAN_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn persistence(cause: impl std::fmt::Display) -> Self {
        AnalyzerError::Persistence {
            message: cause.to_string(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AnalyzerError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalyzerError::NotReady
            | AnalyzerError::NoDocument
            | AnalyzerError::UnknownEntry { .. } => ErrorCategory::Reference,
            AnalyzerError::InvalidCode { .. } | AnalyzerError::ValidationError { .. } => {
                ErrorCategory::Input
            }
            AnalyzerError::Classification { .. }
            | AnalyzerError::HeadingExtraction { .. }
            | AnalyzerError::BackendError { .. }
            | AnalyzerError::ApiError(_) => ErrorCategory::Backend,
            AnalyzerError::Persistence { .. }
            | AnalyzerError::IoError(_)
            | AnalyzerError::SerializationError(_) => ErrorCategory::Storage,
            AnalyzerError::ConfigError { .. }
            | AnalyzerError::InvalidConfigValueError { .. }
            | AnalyzerError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // the session keeps running on last-known-good state
            ErrorCategory::Storage => ErrorSeverity::Low,
            ErrorCategory::Backend => ErrorSeverity::Medium,
            ErrorCategory::Reference | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Text safe to show an end user. Backend causes never leak through here.
    pub fn user_friendly_message(&self) -> String {
        match self {
            AnalyzerError::NotReady => {
                "Analysis is disabled until reference data is loaded by an administrator."
                    .to_string()
            }
            AnalyzerError::NoDocument => "No reference document is loaded to scan.".to_string(),
            AnalyzerError::InvalidCode { .. } => {
                "Please enter an HTS code using digits and dots only (e.g. 7604.10.10)."
                    .to_string()
            }
            AnalyzerError::UnknownEntry { id } => format!("Manual entry '{}' does not exist.", id),
            AnalyzerError::Classification { message }
            | AnalyzerError::HeadingExtraction { message } => message.clone(),
            AnalyzerError::BackendError { .. } | AnalyzerError::ApiError(_) => {
                CLASSIFICATION_FAILURE_MESSAGE.to_string()
            }
            AnalyzerError::Persistence { .. }
            | AnalyzerError::IoError(_)
            | AnalyzerError::SerializationError(_) => {
                "Changes are active for this session but could not be saved.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Reference => {
                "Load a reference document or add a manual entry, then try again."
            }
            ErrorCategory::Input => "Correct the input and resubmit.",
            ErrorCategory::Backend => "Verify the API key and network connectivity, then retry.",
            ErrorCategory::Storage => {
                "Check that the data directory is writable, then run `status --resync`."
            }
            ErrorCategory::Configuration => "Review the configuration file and CLI flags.",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
