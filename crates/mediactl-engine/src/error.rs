//! Error types for the trigger engine.

use mediactl_config::ConfigError;
use mediactl_core::{PinId, PinKind};
use mediactl_hardware::HardwareError;
use mediactl_network::RemoteError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the registry, the trigger protocol and the controller.
///
/// Reference and identity errors are raised while the registry is being
/// built and abort configuration before any sensing starts. Hardware errors
/// end the pin operation that raised them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No pin with this id is registered.
    #[error("Unknown pin: {0}")]
    UnknownPin(String),

    /// A relationship list names a pin that does not exist.
    #[error("Pin {referenced_by} references unknown pin {id}")]
    UnknownReference { id: String, referenced_by: PinId },

    /// A relationship list names the same pin twice.
    #[error("Pin {referenced_by} lists {id} twice in {list}")]
    DuplicateReference {
        id: PinId,
        referenced_by: PinId,
        list: &'static str,
    },

    /// Every negative placeholder address is taken.
    #[error("No free virtual address left")]
    VirtualAddressesExhausted,

    /// A pin of the wrong kind was used.
    #[error("Pin {id} has kind {actual}, expected {expected}")]
    WrongKind {
        id: PinId,
        expected: &'static str,
        actual: PinKind,
    },

    /// A pin with this id already exists.
    #[error("Pin {0} is already registered")]
    DuplicatePin(PinId),

    /// The hardware line is claimed by another pin.
    #[error("GPIO {address} is already used by pin {id}")]
    AddressInUse { address: i32, id: PinId },

    /// The id declared in a configuration record does not match its address.
    #[error("Declared id {declared} does not match derived id {derived}")]
    IdMismatch { declared: String, derived: PinId },

    /// The controller has been shut down.
    #[error("Controller is stopped")]
    Stopped,

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Remote device error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] mediactl_core::Error),
}

impl EngineError {
    pub(crate) fn wrong_kind(id: &PinId, expected: &'static str) -> Self {
        Self::WrongKind {
            id: id.clone(),
            expected,
            actual: id.kind(),
        }
    }

    pub(crate) fn unknown_reference(id: impl Into<String>, referenced_by: &PinId) -> Self {
        Self::UnknownReference {
            id: id.into(),
            referenced_by: referenced_by.clone(),
        }
    }

    /// Returns `true` for errors raised while building the registry.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPin(_)
                | Self::UnknownReference { .. }
                | Self::DuplicateReference { .. }
                | Self::VirtualAddressesExhausted
                | Self::WrongKind { .. }
                | Self::DuplicatePin(_)
                | Self::AddressInUse { .. }
                | Self::IdMismatch { .. }
                | Self::Config(_)
                | Self::Core(_)
        )
    }
}
