//! Error types for Timebox Track

use thiserror::Error;

use crate::application::errors::ValidationErrors;

/// Result type alias using Timebox Track's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Timebox Track error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Timebox '{0}' not found. Run `timebox timeboxes list` to see all timeboxes.")]
    TimeboxNotFound(String),

    #[error("Project '{0}' not found. Run `timebox projects list` to see all projects.")]
    ProjectNotFound(String),

    #[error("Phase '{0}' not found.")]
    PhaseNotFound(String),

    #[error("Payment order '{0}' not found. Run `timebox payments list` to see your orders.")]
    PaymentOrderNotFound(String),

    #[error("Content node '{0}' not found in project tree.")]
    ContentNotFound(String),

    #[error("Postulation '{0}' not found.")]
    PostulationNotFound(String),

    // Network errors (E100-E149)
    #[error("Network error: {0}. Check your connection and `api.base_url`.")]
    NetworkError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    // Auth errors (E150-E199)
    #[error("Session expired or unauthorized. Log in again with `timebox login`.")]
    Unauthorized,

    #[error("Not logged in. Run `timebox login` first.")]
    NotAuthenticated,

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("Cannot move {entity} from '{from}' to '{to}'")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    // Generic errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::TimeboxNotFound(_) => "E001",
            Self::ProjectNotFound(_) => "E002",
            Self::PhaseNotFound(_) => "E003",
            Self::PaymentOrderNotFound(_) => "E004",
            Self::ContentNotFound(_) => "E005",
            Self::PostulationNotFound(_) => "E006",
            Self::NetworkError(_) => "E100",
            Self::Api { .. } => "E101",
            Self::InvalidResponse(_) => "E102",
            Self::Unauthorized => "E150",
            Self::NotAuthenticated => "E151",
            Self::ConfigError(_) => "E600",
            Self::Validation(_) => "E800",
            Self::InvalidInput(_) => "E801",
            Self::BusinessRule(_) => "E802",
            Self::InvalidTransition { .. } => "E803",
            Self::Serialization(_) => "E900",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::TimeboxNotFound(_) => Some("timebox timeboxes list".to_string()),
            Self::ProjectNotFound(_) => Some("timebox projects list".to_string()),
            Self::PaymentOrderNotFound(_) => Some("timebox payments list".to_string()),
            Self::NetworkError(_) => Some("timebox config get api.base_url".to_string()),
            Self::Unauthorized | Self::NotAuthenticated => Some("timebox login".to_string()),
            Self::ConfigError(_) => Some("timebox config list".to_string()),
            _ => None,
        }
    }

    /// Build an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error was raised before any request reached the backend
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidInput(_)
                | Self::BusinessRule(_)
                | Self::InvalidTransition { .. }
                | Self::NotAuthenticated
        )
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
