//! GPIO driver trait definition.
//!
//! The trigger engine talks to GPIO hardware exclusively through
//! [`GpioDriver`]. The trait only knows about levels and directions; pin
//! numbering schemes and board specifics stay inside each backend.
//!
//! All methods use native `async fn` (Edition 2024 RPITIT), so the trait is
//! not object-safe. Use [`AnyGpio`](crate::devices::AnyGpio) for dynamic
//! selection of a backend.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, Direction, Level};

/// GPIO backend abstraction.
///
/// Methods take `&self`: a single driver is shared by every pin and by
/// every concurrently running trigger, so backends synchronise internally.
///
/// # Examples
///
/// ```
/// use mediactl_hardware::mock::MockGpio;
/// use mediactl_hardware::traits::GpioDriver;
/// use mediactl_hardware::types::{Direction, Level};
///
/// #[tokio::main]
/// async fn main() -> mediactl_hardware::Result<()> {
///     let (gpio, handle) = MockGpio::new();
///
///     gpio.setup(27, Direction::Output).await?;
///     gpio.write(27, Level::High).await?;
///     assert_eq!(handle.level(27), Some(Level::High));
///
///     gpio.cleanup(27).await?;
///     Ok(())
/// }
/// ```
pub trait GpioDriver: Send + Sync {
    /// Configure a line for the given direction.
    ///
    /// Inputs use the pull-down so a released contact reads `Low`; outputs
    /// start `Low`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or cannot be claimed.
    async fn setup(&self, line: u32, direction: Direction) -> Result<()>;

    /// Read the current level of a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not set up or the backend fails.
    async fn read(&self, line: u32) -> Result<Level>;

    /// Drive an output line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not set up as an output or the
    /// backend fails.
    async fn write(&self, line: u32, level: Level) -> Result<()>;

    /// Release a line so other processes may claim it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release the line.
    async fn cleanup(&self, line: u32) -> Result<()>;

    /// Get backend information.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
