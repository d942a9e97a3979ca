//! Unified error handling for Rule Track

use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// The management server answered with a non-success status.
    #[error("{endpoint} failed: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error(
        "Invalid track type '{value}'. Valid values: none, log, \
         detailed-log (detail, detailed, \"detailed log\"), \
         extended-log (extended, extend, \"extended log\")"
    )]
    InvalidTrackType { value: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Server-provided message for API rejections, full display text otherwise.
    pub fn server_message(&self) -> String {
        match self {
            AppError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
