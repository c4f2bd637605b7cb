use crate::contract::exit::ExitStatus;
use crate::contract::lifecycle::ProcessState;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Persistent data directory {} is not ready: {reason}", path.display())]
    EnvironmentUnready { path: PathBuf, reason: String },

    #[error("Required dependency '{name}' is not available in this build")]
    MissingDependency { name: String },

    #[error("Required environment variable {field} is not set")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Bot API rejected {method}: {description}")]
    BotApiError { method: String, description: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {message}")]
    SpreadsheetError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid lifecycle transition from {from} to {to}")]
    LifecycleError { from: ProcessState, to: ProcessState },
}

/// Broad failure classes; each maps to its own exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Environment,
    Dependency,
    Configuration,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::EnvironmentUnready { .. } => ErrorCategory::Environment,
            AppError::MissingDependency { .. } => ErrorCategory::Dependency,
            AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::ConfigError { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Application,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Environment | ErrorCategory::Dependency => ErrorSeverity::Critical,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Application => match self {
                AppError::ApiError(_) | AppError::BotApiError { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
        }
    }

    /// Precondition failures are never retried in-process.
    pub fn is_precondition_failure(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Application)
    }

    pub fn exit_status(&self) -> ExitStatus {
        match self.category() {
            ErrorCategory::Environment => ExitStatus::EnvironmentUnready,
            ErrorCategory::Dependency => ExitStatus::MissingDependency,
            ErrorCategory::Configuration => ExitStatus::Misconfigured,
            ErrorCategory::Application => ExitStatus::ApplicationFailure,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AppError::EnvironmentUnready { path, .. } => format!(
                "Create {} during provisioning (e.g. `mkdir -p` in the image build) and make it writable, then relaunch",
                path.display()
            ),
            AppError::MissingDependency { name } => format!(
                "Rebuild the image with the '{}' capability enabled; it cannot be installed at runtime",
                name
            ),
            AppError::MissingConfigError { field } => {
                format!("Set {} in the container environment and relaunch", field)
            }
            AppError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of {} and relaunch", field)
            }
            AppError::ConfigError { .. } => "Check the configuration file syntax".to_string(),
            AppError::ApiError(_) | AppError::BotApiError { .. } => {
                "Check network connectivity and the bot token".to_string()
            }
            AppError::CsvError(_) | AppError::SpreadsheetError { .. } => {
                "Check that the uploaded file is a valid spreadsheet".to_string()
            }
            AppError::IoError(_) => "Check free space and permissions of the data directory".to_string(),
            AppError::SerializationError(_) => "The state file may be corrupt; inspect it".to_string(),
            AppError::LifecycleError { .. } => "This is a bug; please report it".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Environment => format!("environment not ready: {}", self),
            ErrorCategory::Dependency => format!("missing dependency: {}", self),
            ErrorCategory::Configuration => format!("misconfigured environment: {}", self),
            ErrorCategory::Application => format!("application failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
