/*
[INPUT]:  Error sources (HTTP status, transport, URL, configuration)
[OUTPUT]: Structured error types and the operator-facing message formatter
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or changing operator messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the console adapter
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status} {status_text}")]
    Status { status: u16, status_text: String },

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    Parse(String),

    /// Request exceeded the transport timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection was dropped while the request was in flight
    #[error("Request aborted: {0}")]
    Aborted(String),

    /// Transport failure with no better classification
    #[error("Request failed: {0}")]
    Unknown(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Create a status error using the canonical reason phrase
    pub fn from_status(status: StatusCode) -> Self {
        ConsoleError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Message shown in the console's shared message area.
    ///
    /// Every endpoint goes through this formatter so the wording stays the
    /// same across tail, run and execute calls.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Status {
                status,
                status_text,
            } => format!("{status} {status_text}."),
            ConsoleError::Parse(_) => "Parsing JSON request failed.".to_string(),
            ConsoleError::Timeout => "Request timed out.".to_string(),
            ConsoleError::Aborted(_) => "Request was aborted by the server.".to_string(),
            _ => "Unknown error.".to_string(),
        }
    }

    /// Status code, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if error indicates the session expired
    pub fn is_auth_error(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Check if the error is transient
    pub fn is_retryable(&self) -> bool {
        match self {
            ConsoleError::Timeout | ConsoleError::Aborted(_) | ConsoleError::Unknown(_) => true,
            ConsoleError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ConsoleError::Timeout
        } else if let Some(status) = err.status() {
            ConsoleError::from_status(status)
        } else if err.is_decode() {
            ConsoleError::Parse(err.to_string())
        } else if err.is_body() {
            ConsoleError::Aborted(err.to_string())
        } else {
            ConsoleError::Unknown(err.to_string())
        }
    }
}

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
