use std::path::PathBuf;
use thiserror::Error;

/// Configuration error types.
///
/// These errors represent failures while locating, reading, parsing or
/// writing the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading, writing or creating a file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid TOML or does not match the model
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Document could not be serialised
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is syntactically valid but not acceptable
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Neither the override variable nor `$HOME` is set
    #[error("Cannot locate configuration: neither {0} nor HOME is set")]
    NoHomeDirectory(&'static str),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
