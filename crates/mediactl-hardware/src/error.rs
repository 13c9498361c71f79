//! Error types for GPIO operations.
//!
//! Hardware errors are fatal for the pin operation that raised them: there is
//! no safe fallback when a line cannot be read or driven.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during GPIO operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Line was used before `setup` (or after `cleanup`).
    #[error("GPIO line {line} is not set up")]
    NotSetUp { line: u32 },

    /// Line is configured for the other direction.
    #[error("GPIO line {line} is not configured as {expected}")]
    WrongDirection { line: u32, expected: &'static str },

    /// Line number is not available on this backend.
    #[error("Invalid GPIO line: {line}")]
    InvalidLine { line: u32 },

    /// Backend returned something that is not a level.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Backend communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new not-set-up error.
    pub fn not_set_up(line: u32) -> Self {
        Self::NotSetUp { line }
    }

    /// Create a new wrong-direction error.
    pub fn wrong_direction(line: u32, expected: &'static str) -> Self {
        Self::WrongDirection { line, expected }
    }

    /// Create a new invalid line error.
    pub fn invalid_line(line: u32) -> Self {
        Self::InvalidLine { line }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
