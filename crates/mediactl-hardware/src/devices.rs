//! Enum wrapper for GPIO backend dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) is not object-safe, so
//! `Box<dyn GpioDriver>` is not available. [`AnyGpio`] provides concrete
//! dispatch instead: the engine holds one `AnyGpio` and the backend is
//! selected at runtime from configuration or command line flags.
//!
//! # Examples
//!
//! ```
//! use mediactl_hardware::devices::AnyGpio;
//! use mediactl_hardware::mock::MockGpio;
//!
//! let (gpio, _handle) = MockGpio::new();
//! let any_gpio = AnyGpio::Mock(gpio);
//!
//! // Can now be used polymorphically through the GpioDriver trait
//! ```

use crate::mock::MockGpio;
use crate::sysfs::SysfsGpio;
use crate::traits::GpioDriver;
use crate::types::{DeviceInfo, Direction, Level};
use crate::Result;

/// Enum wrapper for GPIO backend dispatch.
///
/// # Examples
///
/// ```
/// use mediactl_hardware::devices::AnyGpio;
/// use mediactl_hardware::traits::GpioDriver;
/// use mediactl_hardware::mock::MockGpio;
///
/// #[tokio::main]
/// async fn main() -> mediactl_hardware::Result<()> {
///     let (gpio, _handle) = MockGpio::new();
///     let any_gpio = AnyGpio::Mock(gpio);
///
///     let info = any_gpio.get_info().await?;
///     println!("GPIO backend: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyGpio {
    /// Mock backend for development and testing.
    Mock(MockGpio),

    /// Linux sysfs backend.
    Sysfs(SysfsGpio),
}

impl GpioDriver for AnyGpio {
    async fn setup(&self, line: u32, direction: Direction) -> Result<()> {
        match self {
            Self::Mock(gpio) => gpio.setup(line, direction).await,
            Self::Sysfs(gpio) => gpio.setup(line, direction).await,
        }
    }

    async fn read(&self, line: u32) -> Result<Level> {
        match self {
            Self::Mock(gpio) => gpio.read(line).await,
            Self::Sysfs(gpio) => gpio.read(line).await,
        }
    }

    async fn write(&self, line: u32, level: Level) -> Result<()> {
        match self {
            Self::Mock(gpio) => gpio.write(line, level).await,
            Self::Sysfs(gpio) => gpio.write(line, level).await,
        }
    }

    async fn cleanup(&self, line: u32) -> Result<()> {
        match self {
            Self::Mock(gpio) => gpio.cleanup(line).await,
            Self::Sysfs(gpio) => gpio.cleanup(line).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(gpio) => gpio.get_info().await,
            Self::Sysfs(gpio) => gpio.get_info().await,
        }
    }
}

impl From<MockGpio> for AnyGpio {
    fn from(gpio: MockGpio) -> Self {
        Self::Mock(gpio)
    }
}

impl From<SysfsGpio> for AnyGpio {
    fn from(gpio: SysfsGpio) -> Self {
        Self::Sysfs(gpio)
    }
}
