use thiserror::Error;

pub mod sanitizer;

pub use sanitizer::{sanitize_message, ErrorSanitizationConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Backend availability
    LinkingError,

    // Initialization errors
    InitFailed,
    InitTimeout,

    // Configuration errors
    MissingSdkKey,
    MissingAccountId,

    // Operation errors
    GetFlagFailed,
    TrackEventFailed,
    SetAttributeFailed,

    // Payload errors
    PayloadTooDeep,
    InvalidPayload,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::LinkingError => "LINKING_ERROR",
            ErrorCode::InitFailed => "INIT_FAILED",
            ErrorCode::InitTimeout => "INIT_TIMEOUT",
            ErrorCode::MissingSdkKey => "MISSING_SDK_KEY",
            ErrorCode::MissingAccountId => "MISSING_ACCOUNT_ID",
            ErrorCode::GetFlagFailed => "GET_FLAG_FAILED",
            ErrorCode::TrackEventFailed => "TRACK_EVENT_FAILED",
            ErrorCode::SetAttributeFailed => "SET_ATTRIBUTE_FAILED",
            ErrorCode::PayloadTooDeep => "PAYLOAD_TOO_DEEP",
            ErrorCode::InvalidPayload => "INVALID_PAYLOAD",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("[{code}] {message}")]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BridgeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn linking() -> Self {
        Self::new(ErrorCode::LinkingError, LINKING_ERROR)
    }

    pub fn init_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InitFailed, message)
    }

    pub fn init_timeout(timeout: std::time::Duration) -> Self {
        Self::new(
            ErrorCode::InitTimeout,
            format!("Initialization did not settle within {} ms", timeout.as_millis()),
        )
    }

    /// Render this error for the diagnostic log with sensitive data removed.
    pub fn sanitized_message(&self, config: &ErrorSanitizationConfig) -> String {
        let message = sanitize_message(&self.message, config);
        format!("[{}] {}", self.code, message)
    }
}

/// Message used when the native backend is not linked into the host.
pub const LINKING_ERROR: &str = "The native feature management backend doesn't seem to be linked. \
Make sure the native module is installed and the host application was rebuilt after installing it.";

pub type Result<T> = std::result::Result<T, BridgeError>;
