//! Linux sysfs GPIO backend.
//!
//! Drives lines through the legacy `/sys/class/gpio` interface:
//!
//! ```text
//! /sys/class/gpio/export          <- "17"
//! /sys/class/gpio/gpio17/direction <- "in" | "out"
//! /sys/class/gpio/gpio17/value     <-> "0" | "1"
//! /sys/class/gpio/unexport        <- "17"
//! ```
//!
//! The sysfs interface has no pull configuration. Inputs rely on the board
//! default or an external pull-down resistor; this matches the BCM defaults
//! for the lines usually wired to buttons on a Raspberry Pi.

use crate::{
    HardwareError, Result,
    traits::GpioDriver,
    types::{DeviceInfo, Direction, Level},
};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};

/// Default sysfs GPIO root.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Attempts made to write the direction right after export.
///
/// udev applies permissions to a freshly exported line asynchronously.
const DIRECTION_RETRIES: u32 = 10;
const DIRECTION_RETRY_DELAY: Duration = Duration::from_millis(20);

/// GPIO backend on top of `/sys/class/gpio`.
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    directions: Mutex<HashMap<u32, Direction>>,
}

impl SysfsGpio {
    /// Create a backend on the default sysfs root.
    pub fn new() -> Self {
        Self::with_root(DEFAULT_SYSFS_ROOT)
    }

    /// Create a backend on a custom root (used by tests and chroots).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            directions: Mutex::new(HashMap::new()),
        }
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{line}"))
    }

    fn direction_of(&self, line: u32) -> Option<Direction> {
        self.directions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&line)
            .copied()
    }

    async fn write_direction(&self, line: u32, direction: Direction) -> Result<()> {
        let path = self.line_dir(line).join("direction");
        let value = match direction {
            Direction::InputPullDown => "in",
            // "low" sets the direction and the initial level in one write.
            Direction::Output => "low",
        };

        let mut attempt = 0;
        loop {
            match tokio::fs::write(&path, value).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::PermissionDenied && attempt < DIRECTION_RETRIES => {
                    attempt += 1;
                    trace!(line, attempt, "direction not writable yet, retrying");
                    tokio::time::sleep(DIRECTION_RETRY_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioDriver for SysfsGpio {
    async fn setup(&self, line: u32, direction: Direction) -> Result<()> {
        if !tokio::fs::try_exists(self.line_dir(line)).await? {
            debug!(line, "exporting GPIO line");
            tokio::fs::write(self.root.join("export"), line.to_string())
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::InvalidInput => HardwareError::invalid_line(line),
                    _ => e.into(),
                })?;
        }

        self.write_direction(line, direction).await?;
        self.directions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(line, direction);

        debug!(line, %direction, "GPIO line configured");
        Ok(())
    }

    async fn read(&self, line: u32) -> Result<Level> {
        if self.direction_of(line).is_none() {
            return Err(HardwareError::not_set_up(line));
        }

        let raw = tokio::fs::read_to_string(self.line_dir(line).join("value")).await?;
        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(HardwareError::invalid_data(format!(
                "unexpected value '{other}' on line {line}"
            ))),
        }
    }

    async fn write(&self, line: u32, level: Level) -> Result<()> {
        match self.direction_of(line) {
            None => return Err(HardwareError::not_set_up(line)),
            Some(Direction::InputPullDown) => {
                return Err(HardwareError::wrong_direction(line, "output"));
            }
            Some(Direction::Output) => {}
        }

        let value = if level.is_high() { "1" } else { "0" };
        tokio::fs::write(self.line_dir(line).join("value"), value).await?;
        Ok(())
    }

    async fn cleanup(&self, line: u32) -> Result<()> {
        let removed = self
            .directions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&line);

        if removed.is_some() {
            debug!(line, "unexporting GPIO line");
            tokio::fs::write(self.root.join("unexport"), line.to_string()).await?;
        }
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("sysfs", "Linux sysfs GPIO")
            .with_location(self.root.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Build a fake sysfs tree with pre-exported lines.
    async fn fake_root(lines: &[u32]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("export"), "").await.unwrap();
        tokio::fs::write(dir.path().join("unexport"), "").await.unwrap();
        for line in lines {
            let line_dir = dir.path().join(format!("gpio{line}"));
            tokio::fs::create_dir_all(&line_dir).await.unwrap();
            tokio::fs::write(line_dir.join("direction"), "in").await.unwrap();
            tokio::fs::write(line_dir.join("value"), "0").await.unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_sysfs_setup_output_writes_direction() {
        let dir = fake_root(&[27]).await;
        let gpio = SysfsGpio::with_root(dir.path());

        gpio.setup(27, Direction::Output).await.unwrap();

        let direction = tokio::fs::read_to_string(dir.path().join("gpio27/direction"))
            .await
            .unwrap();
        assert_eq!(direction, "low");
    }

    #[tokio::test]
    async fn test_sysfs_exports_missing_line() {
        let dir = fake_root(&[]).await;
        // The kernel would create the line directory on export; a fake root
        // cannot, so the direction write fails after the export.
        let gpio = SysfsGpio::with_root(dir.path());

        assert!(gpio.setup(4, Direction::InputPullDown).await.is_err());
        let export = tokio::fs::read_to_string(dir.path().join("export"))
            .await
            .unwrap();
        assert_eq!(export, "4");
    }

    #[tokio::test]
    async fn test_sysfs_read_and_write() {
        let dir = fake_root(&[17, 27]).await;
        let gpio = SysfsGpio::with_root(dir.path());
        gpio.setup(17, Direction::InputPullDown).await.unwrap();
        gpio.setup(27, Direction::Output).await.unwrap();

        tokio::fs::write(dir.path().join("gpio17/value"), "1\n")
            .await
            .unwrap();
        assert_eq!(gpio.read(17).await.unwrap(), Level::High);

        gpio.write(27, Level::High).await.unwrap();
        let value = tokio::fs::read_to_string(dir.path().join("gpio27/value"))
            .await
            .unwrap();
        assert_eq!(value, "1");
    }

    #[tokio::test]
    async fn test_sysfs_rejects_unconfigured_and_wrong_direction() {
        let dir = fake_root(&[17]).await;
        let gpio = SysfsGpio::with_root(dir.path());

        assert!(matches!(
            gpio.read(17).await,
            Err(HardwareError::NotSetUp { line: 17 })
        ));

        gpio.setup(17, Direction::InputPullDown).await.unwrap();
        assert!(matches!(
            gpio.write(17, Level::High).await,
            Err(HardwareError::WrongDirection { .. })
        ));
    }

    #[tokio::test]
    async fn test_sysfs_invalid_value() {
        let dir = fake_root(&[17]).await;
        let gpio = SysfsGpio::with_root(dir.path());
        gpio.setup(17, Direction::InputPullDown).await.unwrap();

        tokio::fs::write(dir.path().join("gpio17/value"), "x")
            .await
            .unwrap();
        assert!(matches!(
            gpio.read(17).await,
            Err(HardwareError::InvalidData { .. })
        ));
    }

    #[tokio::test]
    async fn test_sysfs_cleanup_unexports_once() {
        let dir = fake_root(&[27]).await;
        let gpio = SysfsGpio::with_root(dir.path());
        gpio.setup(27, Direction::Output).await.unwrap();

        gpio.cleanup(27).await.unwrap();
        let unexport = tokio::fs::read_to_string(dir.path().join("unexport"))
            .await
            .unwrap();
        assert_eq!(unexport, "27");

        // Second cleanup is a no-op
        tokio::fs::write(dir.path().join("unexport"), "").await.unwrap();
        gpio.cleanup(27).await.unwrap();
        let unexport = tokio::fs::read_to_string(dir.path().join("unexport"))
            .await
            .unwrap();
        assert_eq!(unexport, "");
    }
}
