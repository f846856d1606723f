use thiserror::Error;
use serde::Serialize;

/// Placeholder rendered for inputs the user can simply correct (empty result field)
pub const PLACEHOLDER_EMPTY: &str = "";
/// Placeholder rendered when currency rates cannot be obtained at all
pub const PLACEHOLDER_UNAVAILABLE: &str = "—";
/// Placeholder rendered for anything unexpected
pub const PLACEHOLDER_ERROR: &str = "Error";

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Exchange rates unavailable: {0}")]
    UnavailableRates(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Unknown Error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Errors caused by the request itself rather than by the environment
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_) | AppError::InvalidUnit(_) | AppError::UnknownCategory(_)
        )
    }

    /// Text shown in place of a result when a conversion fails
    pub fn placeholder(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidUnit(_) | AppError::UnknownCategory(_) => {
                PLACEHOLDER_EMPTY
            }
            AppError::UnavailableRates(_) => PLACEHOLDER_UNAVAILABLE,
            _ => PLACEHOLDER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("Serialization error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
