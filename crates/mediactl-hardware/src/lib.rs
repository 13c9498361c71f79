//! GPIO abstraction layer for the media control trigger engine.
//!
//! This crate provides the [`GpioDriver`] trait and its backends. The engine
//! never touches hardware directly: every line is configured, read, driven
//! and released through a driver, which keeps the trigger logic testable on
//! a workstation.
//!
//! # Backends
//!
//! - [`MockGpio`](mock::MockGpio): simulated lines with a control handle for
//!   tests and development.
//! - [`SysfsGpio`](sysfs::SysfsGpio): Linux `/sys/class/gpio` interface.
//!
//! [`AnyGpio`](devices::AnyGpio) selects one of them at runtime.
//!
//! # Examples
//!
//! ```
//! use mediactl_hardware::{GpioDriver, Direction, Level};
//! use mediactl_hardware::mock::MockGpio;
//!
//! #[tokio::main]
//! async fn main() -> mediactl_hardware::Result<()> {
//!     let (gpio, handle) = MockGpio::new();
//!     gpio.setup(17, Direction::InputPullDown).await?;
//!
//!     handle.press(17);
//!     assert!(gpio.read(17).await?.is_high());
//!     Ok(())
//! }
//! ```
//!
//! # Thread Safety
//!
//! Drivers are `Send + Sync` and take `&self`, so a single driver is shared
//! by all pins and concurrently running triggers.

pub mod devices;
pub mod error;
pub mod mock;
pub mod sysfs;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyGpio;
pub use error::{HardwareError, Result};
pub use traits::GpioDriver;
pub use types::{DeviceInfo, Direction, Level};
