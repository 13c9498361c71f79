//! Mock backend implementations for testing and development.
//!
//! This module provides a simulated GPIO backend that can be controlled
//! programmatically without requiring physical hardware.

pub mod gpio;

// Re-export commonly used types
pub use gpio::{MockGpio, MockGpioHandle, WriteRecord};
