//! Error types for remote device control.

use thiserror::Error;

/// Result type alias for remote device operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Errors that can occur while talking to a remote projector.
///
/// Every variant is recoverable from the engine's point of view: a virtual
/// pin logs the failure and completes its cycle.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Session was closed or never opened.
    #[error("Not connected to projector")]
    NotConnected,

    /// Address could not be parsed or resolved.
    #[error("Invalid projector address: {0}")]
    InvalidAddress(String),

    /// Connection attempt timed out.
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out.
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out.
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during operation.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Projector demands a password and none was configured, or a command
    /// was issued before `authenticate`.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Projector rejected the password digest.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Projector answered with an error code.
    #[error("Projector error {code}: {description}")]
    Projector {
        code: ProjectorErrorCode,
        description: &'static str,
    },

    /// Response did not follow the PJLink grammar.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// PJLink error codes (`ERR1`..`ERR4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectorErrorCode {
    /// `ERR1`: undefined command.
    UndefinedCommand,
    /// `ERR2`: out of parameter.
    OutOfParameter,
    /// `ERR3`: unavailable time (e.g. cooling down).
    UnavailableTime,
    /// `ERR4`: projector failure.
    ProjectorFailure,
}

impl ProjectorErrorCode {
    /// Parse the wire code.
    pub fn from_wire(code: &str) -> Option<Self> {
        match code {
            "ERR1" => Some(Self::UndefinedCommand),
            "ERR2" => Some(Self::OutOfParameter),
            "ERR3" => Some(Self::UnavailableTime),
            "ERR4" => Some(Self::ProjectorFailure),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::UndefinedCommand => "ERR1",
            Self::OutOfParameter => "ERR2",
            Self::UnavailableTime => "ERR3",
            Self::ProjectorFailure => "ERR4",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::UndefinedCommand => "undefined command",
            Self::OutOfParameter => "out of parameter",
            Self::UnavailableTime => "unavailable time",
            Self::ProjectorFailure => "projector failure",
        }
    }
}

impl std::fmt::Display for ProjectorErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl RemoteError {
    /// Create a projector-reported error.
    pub fn projector(code: ProjectorErrorCode) -> Self {
        Self::Projector {
            code,
            description: code.description(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an invalid address error.
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress(address.into())
    }
}
