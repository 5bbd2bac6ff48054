use thiserror::Error;

/// Errors surfaced by the chat client and tool surfaces.
///
/// Soft conditions (malformed context JSON, blank message text) never show up
/// here; they are reported as [`crate::ToolWarning`]s alongside a result.
#[derive(Error, Debug)]
pub enum OmniError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Invalid Parameters: {0}")]
    InvalidParams(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error("Stream Error: {0}")]
    StreamError(String),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
}

/// Result type for omni chat operations
pub type OmniResult<T> = Result<T, OmniError>;
