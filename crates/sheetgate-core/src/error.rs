// Error taxonomy shared by the gate and the ingestion pipeline.
//
// Three layers: `ErrorCode` (the closed taxonomy), `GateError` (a
// displayable code + message pair surfaced to callers), and
// `SheetgateError` (internal plumbing failures).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of failure categories.
///
/// Every user-visible failure maps to exactly one of these; the
/// `Display` impl is the human-readable string shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// CSV or record-shape violations.
    MalformedInput,
    /// The dataset is empty.
    NoDataAvailable,
    /// A hashing or token precondition was not met.
    InvalidArgument,
    /// A fetch or HTTP failure. Self-inflicted aborts are never
    /// reported under this code.
    NetworkError,
    /// Wrong password, or no route matched.
    AuthenticationFailure,
    /// The attempt limit was exhausted and the lockout window is open.
    LockedOut,
    /// The storage backend failed.
    StorageFailure,
    /// Encryption or decryption failed.
    CryptoFailure,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MalformedInput => "Malformed input",
            Self::NoDataAvailable => "No data available",
            Self::InvalidArgument => "Invalid argument",
            Self::NetworkError => "Network error",
            Self::AuthenticationFailure => "Incorrect password",
            Self::LockedOut => "Too many attempts, try again later",
            Self::StorageFailure => "Storage failure",
            Self::CryptoFailure => "Encryption failure",
        };
        write!(f, "{msg}")
    }
}

/// Displayable error carrying a taxonomy code and a human-readable
/// message. This is what gate and pipeline operations return.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct GateError {
    pub code: ErrorCode,
    pub message: String,
}

impl GateError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.to_string(),
            code,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::MalformedInput, message)
    }

    pub fn no_data() -> Self {
        Self::new(ErrorCode::NoDataAvailable)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidArgument, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NetworkError, message)
    }

    /// Deliberately uniform: never says which route entry mismatched.
    pub fn authentication_failure() -> Self {
        Self::new(ErrorCode::AuthenticationFailure)
    }

    pub fn crypto(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::CryptoFailure, message)
    }
}

/// Internal (non-displayable) error for configuration and plumbing
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum SheetgateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Unified result type for sheetgate operations.
pub type Result<T> = std::result::Result<T, SheetgateError>;
