//! Error types module
//!
//! All client-side failures are unified under the `ClientError` enum: pre-flight
//! validation, transport failures, configuration problems, and video processing
//! outcomes. Variants carry owned strings rather than foreign error types so the
//! enum stays `Clone`; a single CSRF fetch result is handed to every caller that
//! awaited it.

use crate::constants::GENERIC_ERROR_MESSAGE;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues and rejected requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "HTTP_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the operation later can succeed
    fn is_recoverable(&self) -> bool;

    /// Human-readable message suitable for display
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Image too large: {size} bytes")]
    ImageTooLarge { size: u64 },

    #[error("Video too large: {size} bytes")]
    VideoTooLarge { size: u64 },

    #[error("API request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Video processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Video processing timed out after {attempts} status checks")]
    ProcessingTimedOut { attempts: u32 },

    #[error("Video status check failed: {0}")]
    StatusCheckFailed(String),
}

#[derive(serde::Deserialize)]
struct ServerErrorBody {
    message: Option<String>,
}

impl ClientError {
    /// Build an HTTP error from a non-success response, keeping the server's
    /// `message` field when the body carries one.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ServerErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        ClientError::Http { status, message }
    }

    /// HTTP status of the failing response, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether this error was raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidInput(_)
                | ClientError::UnsupportedMediaType(_)
                | ClientError::ImageTooLarge { .. }
                | ClientError::VideoTooLarge { .. }
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::InvalidInput(format!("Validation error: {}", err))
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("Invalid URL: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn client_error_static_metadata(err: &ClientError) -> (&'static str, bool, LogLevel) {
    match err {
        ClientError::InvalidInput(_) => ("INVALID_INPUT", false, LogLevel::Debug),
        ClientError::UnsupportedMediaType(_) => {
            ("UNSUPPORTED_MEDIA_TYPE", false, LogLevel::Debug)
        }
        ClientError::ImageTooLarge { .. } => ("IMAGE_TOO_LARGE", false, LogLevel::Debug),
        ClientError::VideoTooLarge { .. } => ("VIDEO_TOO_LARGE", false, LogLevel::Debug),
        ClientError::Http { status, .. } if *status >= 500 => {
            ("SERVER_ERROR", true, LogLevel::Error)
        }
        ClientError::Http { status: 401, .. } => ("UNAUTHORIZED", false, LogLevel::Warn),
        ClientError::Http { status: 403, .. } => ("FORBIDDEN", false, LogLevel::Warn),
        ClientError::Http { .. } => ("HTTP_ERROR", false, LogLevel::Warn),
        ClientError::Network(_) => ("NETWORK_ERROR", true, LogLevel::Error),
        ClientError::Decode(_) => ("DECODE_ERROR", false, LogLevel::Error),
        ClientError::Config(_) => ("CONFIG_ERROR", false, LogLevel::Error),
        ClientError::ProcessingFailed(_) => ("PROCESSING_FAILED", false, LogLevel::Warn),
        ClientError::ProcessingTimedOut { .. } => ("PROCESSING_TIMED_OUT", true, LogLevel::Warn),
        ClientError::StatusCheckFailed(_) => ("STATUS_CHECK_FAILED", true, LogLevel::Warn),
    }
}

impl ErrorMetadata for ClientError {
    fn error_code(&self) -> &'static str {
        client_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        client_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        client_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            ClientError::InvalidInput(ref msg) => msg.clone(),
            ClientError::UnsupportedMediaType(_) => {
                "Only image and video files are allowed.".to_string()
            }
            ClientError::ImageTooLarge { .. } => "Image exceeds 2MB.".to_string(),
            ClientError::VideoTooLarge { .. } => "Video exceeds 500MB.".to_string(),
            ClientError::Http {
                message: Some(ref msg),
                ..
            } => msg.clone(),
            ClientError::Http { message: None, .. }
            | ClientError::Network(_)
            | ClientError::Decode(_) => GENERIC_ERROR_MESSAGE.to_string(),
            ClientError::Config(ref msg) => msg.clone(),
            ClientError::ProcessingFailed(_) => "Video processing failed.".to_string(),
            ClientError::ProcessingTimedOut { .. } => {
                "Video processing is taking longer than expected.".to_string()
            }
            ClientError::StatusCheckFailed(_) => {
                "Could not check the video processing status.".to_string()
            }
        }
    }
}
