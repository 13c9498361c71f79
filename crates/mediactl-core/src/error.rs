use thiserror::Error;

use crate::types::PinKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Identity errors
    #[error("Invalid pin id: {0}")]
    InvalidPinId(String),

    #[error("Invalid address {address} for {kind} pin")]
    InvalidAddress { kind: PinKind, address: i32 },

    // Value errors
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Unknown {what}: {value}")]
    UnknownVariant { what: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
