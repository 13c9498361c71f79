//! Pin trigger engine for the media control system.
//!
//! This crate owns the pin state machine: registration and wiring of input,
//! output and virtual pins, the shared trigger protocol, the kind-specific
//! activation hooks and the sensing loop that turns input edges into
//! triggers.
//!
//! - [`PinRegistry`] - pins and their relationships before start
//! - [`Controller`] / [`ControllerHandle`] - lifecycle, sensing, manual triggers
//! - [`PinEvent`] - observable lifecycle events
//! - [`Spawner`] - injected task spawning for fan-out
//!
//! GPIO access goes through `mediactl-hardware`, remote power commands
//! through `mediactl-network`.

mod config;
mod controller;
mod engine;
mod input;
mod output;
mod trigger;
mod virtual_pin;

pub mod error;
pub mod events;
pub mod pin;
pub mod registry;
pub mod spawner;
pub mod timing;

pub use controller::{Controller, ControllerHandle};
pub use error::{EngineError, Result};
pub use events::{PinEvent, RefusalReason};
pub use pin::Pin;
pub use registry::PinRegistry;
pub use spawner::{ManualSpawner, Spawner, TokioSpawner};
pub use timing::EngineTiming;
pub use trigger::TriggerOutcome;
