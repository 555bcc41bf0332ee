use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// Rejected before any request was sent (missing id, missing name, ...)
    #[error("{0}")]
    Validation(String),

    /// The Task API answered with a failure; the message is its `detail`
    #[error("{0}")]
    Remote(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ShellError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            ShellError::Validation(_) => "VALIDATION_ERROR",
            ShellError::Remote(_) => "REMOTE_ERROR",
            ShellError::Http(_) => "HTTP_ERROR",
            ShellError::InvalidConfig(_) => "INVALID_CONFIG",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }

    /// Client-side errors never reach the network
    pub fn is_validation(&self) -> bool {
        matches!(self, ShellError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
