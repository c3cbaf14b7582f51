use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MealError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Secret store error: {0}")]
    SecretStoreError(#[from] keyring::Error),

    #[error("City not found: {name}")]
    CityNotFound { name: String },

    #[error("No schedule matched {kind} '{name}'")]
    ScheduleNotFound { kind: String, name: String },

    #[error("Login failed with status {status}")]
    LoginFailed { status: StatusCode },

    #[error("Operation not supported: {operation}")]
    UnsupportedError { operation: String },

    #[error("{stage} gave up after {attempts} attempt(s)")]
    RetryExhausted { stage: String, attempts: u32 },

    #[error("Cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Auth,
    Catalog,
    Workflow,
    Config,
    SecretStore,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MealError {
    /// Exhausted-search conditions; the reservation loop treats these as
    /// retryable while plain lookups surface them directly.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MealError::CityNotFound { .. } | MealError::ScheduleNotFound { .. }
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MealError::ApiError(_) => ErrorCategory::Network,
            MealError::LoginFailed { .. } => ErrorCategory::Auth,
            MealError::CityNotFound { .. } | MealError::ScheduleNotFound { .. } => {
                ErrorCategory::Catalog
            }
            MealError::UnsupportedError { .. }
            | MealError::RetryExhausted { .. }
            | MealError::Cancelled { .. } => ErrorCategory::Workflow,
            MealError::ConfigError { .. }
            | MealError::MissingConfigError { .. }
            | MealError::InvalidConfigValueError { .. } => ErrorCategory::Config,
            MealError::SecretStoreError(_) => ErrorCategory::SecretStore,
            MealError::IoError(_) | MealError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MealError::LoginFailed { .. }
            | MealError::RetryExhausted { .. }
            | MealError::Cancelled { .. } => ErrorSeverity::Medium,
            MealError::CityNotFound { .. }
            | MealError::ScheduleNotFound { .. }
            | MealError::UnsupportedError { .. }
            | MealError::ConfigError { .. }
            | MealError::MissingConfigError { .. }
            | MealError::InvalidConfigValueError { .. }
            | MealError::SerializationError(_) => ErrorSeverity::High,
            MealError::ApiError(_) | MealError::IoError(_) | MealError::SecretStoreError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MealError::ApiError(e) if e.is_connect() => {
                "Could not reach the MealPal service. Check your network connection.".to_string()
            }
            MealError::ApiError(e) if e.is_status() => match e.status() {
                Some(status) => format!("The MealPal service answered with status {}", status),
                None => self.to_string(),
            },
            MealError::CityNotFound { name } => {
                format!("City '{}' is not in the MealPal catalog.", name)
            }
            MealError::ScheduleNotFound { kind, name } => {
                format!("Nothing on today's menu matched {} '{}'.", kind, name)
            }
            MealError::UnsupportedError { operation } => {
                format!("'{}' is not supported yet.", operation)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MealError::ApiError(_) => {
                "Check your network connection and try again in a moment.".to_string()
            }
            MealError::LoginFailed { .. } => {
                "Check the account email in the config file and re-run `mealrs save-pass`."
                    .to_string()
            }
            MealError::CityNotFound { .. } => {
                "City names are matched exactly, including case.".to_string()
            }
            MealError::ScheduleNotFound { .. } => {
                "Names are matched exactly against today's menu; check the spelling and the city."
                    .to_string()
            }
            MealError::UnsupportedError { .. } => {
                "Cancel the existing reservation through the MealPal website first.".to_string()
            }
            MealError::RetryExhausted { .. } => {
                "Raise --max-attempts / --deadline-secs, or drop them to retry without bound."
                    .to_string()
            }
            MealError::Cancelled { .. } => "The run was cancelled on request.".to_string(),
            MealError::ConfigError { .. }
            | MealError::MissingConfigError { .. }
            | MealError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and re-run.".to_string()
            }
            MealError::SecretStoreError(_) => {
                "The OS keychain rejected the request; re-run `mealrs save-pass` or disable use_secret_store.".to_string()
            }
            _ => "Re-run with --verbose for details.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MealError>;
