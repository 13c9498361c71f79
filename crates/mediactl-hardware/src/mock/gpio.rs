//! Mock GPIO implementation for testing and development.
//!
//! This module provides a simulated GPIO backend whose input levels are set
//! programmatically and whose output writes are recorded, so trigger timing
//! can be asserted without physical hardware.

use crate::{
    HardwareError, Result,
    traits::GpioDriver,
    types::{DeviceInfo, Direction, Level},
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// One recorded output write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    /// Line that was driven.
    pub line: u32,

    /// Level written.
    pub level: Level,

    /// When the write happened (tokio clock, so paused tests see virtual time).
    pub at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct MockLine {
    direction: Direction,
    driven: Level,
}

#[derive(Debug, Default)]
struct MockGpioState {
    lines: HashMap<u32, MockLine>,
    external: HashMap<u32, Level>,
    writes: Vec<WriteRecord>,
    failing: HashSet<u32>,
    cleaned_up: Vec<u32>,
}

fn lock(state: &Mutex<MockGpioState>) -> MutexGuard<'_, MockGpioState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock GPIO backend for testing and development.
///
/// Cloning the backend shares the same simulated lines.
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
///     gpio.setup(17, Direction::InputPullDown).await?;
///
///     // Simulate a button press
///     handle.press(17);
///     assert_eq!(gpio.read(17).await?, Level::High);
///
///     handle.release(17);
///     assert_eq!(gpio.read(17).await?, Level::Low);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockGpio {
    state: Arc<Mutex<MockGpioState>>,
    name: String,
}

impl MockGpio {
    /// Create a new mock backend with the default name.
    ///
    /// Returns a tuple of (MockGpio, MockGpioHandle) where the handle
    /// drives simulated inputs and inspects outputs.
    pub fn new() -> (Self, MockGpioHandle) {
        Self::with_name("Mock GPIO".to_string())
    }

    /// Create a new mock backend with a custom name.
    pub fn with_name(name: String) -> (Self, MockGpioHandle) {
        let state = Arc::new(Mutex::new(MockGpioState::default()));

        let gpio = Self {
            state: Arc::clone(&state),
            name,
        };
        let handle = MockGpioHandle { state };

        (gpio, handle)
    }

    fn check_failing(state: &MockGpioState, line: u32) -> Result<()> {
        if state.failing.contains(&line) {
            return Err(HardwareError::communication(format!(
                "simulated failure on line {line}"
            )));
        }
        Ok(())
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new().0
    }
}

impl GpioDriver for MockGpio {
    async fn setup(&self, line: u32, direction: Direction) -> Result<()> {
        let mut state = lock(&self.state);
        Self::check_failing(&state, line)?;
        state.lines.insert(
            line,
            MockLine {
                direction,
                driven: Level::Low,
            },
        );
        Ok(())
    }

    async fn read(&self, line: u32) -> Result<Level> {
        let state = lock(&self.state);
        Self::check_failing(&state, line)?;
        let entry = state
            .lines
            .get(&line)
            .ok_or_else(|| HardwareError::not_set_up(line))?;

        Ok(match entry.direction {
            Direction::InputPullDown => state.external.get(&line).copied().unwrap_or_default(),
            Direction::Output => entry.driven,
        })
    }

    async fn write(&self, line: u32, level: Level) -> Result<()> {
        let mut state = lock(&self.state);
        Self::check_failing(&state, line)?;
        let entry = state
            .lines
            .get_mut(&line)
            .ok_or_else(|| HardwareError::not_set_up(line))?;

        if entry.direction != Direction::Output {
            return Err(HardwareError::wrong_direction(line, "output"));
        }
        entry.driven = level;
        state.writes.push(WriteRecord {
            line,
            level,
            at: Instant::now(),
        });
        Ok(())
    }

    async fn cleanup(&self, line: u32) -> Result<()> {
        let mut state = lock(&self.state);
        state.lines.remove(&line);
        state.cleaned_up.push(line);
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock GPIO v1.0"))
    }
}

/// Handle for controlling a mock GPIO backend.
///
/// This handle sets simulated input levels and inspects what the engine
/// wrote. It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockGpioHandle {
    state: Arc<Mutex<MockGpioState>>,
}

impl MockGpioHandle {
    /// Set the externally applied level of an input line.
    ///
    /// The level may be set before the line is configured.
    pub fn set_level(&self, line: u32, level: Level) {
        lock(&self.state).external.insert(line, level);
    }

    /// Drive an input line high (button pressed).
    pub fn press(&self, line: u32) {
        self.set_level(line, Level::High);
    }

    /// Drive an input line low (button released).
    pub fn release(&self, line: u32) {
        self.set_level(line, Level::Low);
    }

    /// Current level of a configured line.
    ///
    /// Outputs report the driven level, inputs the applied level. Returns
    /// `None` for lines that are not set up.
    pub fn level(&self, line: u32) -> Option<Level> {
        let state = lock(&self.state);
        let entry = state.lines.get(&line)?;
        Some(match entry.direction {
            Direction::InputPullDown => state.external.get(&line).copied().unwrap_or_default(),
            Direction::Output => entry.driven,
        })
    }

    /// Direction a line was set up with, if any.
    pub fn direction(&self, line: u32) -> Option<Direction> {
        lock(&self.state).lines.get(&line).map(|l| l.direction)
    }

    /// Check whether a line is currently set up.
    pub fn is_set_up(&self, line: u32) -> bool {
        lock(&self.state).lines.contains_key(&line)
    }

    /// Every write recorded for a line, oldest first.
    pub fn writes(&self, line: u32) -> Vec<WriteRecord> {
        lock(&self.state)
            .writes
            .iter()
            .filter(|w| w.line == line)
            .copied()
            .collect()
    }

    /// Lines released through `cleanup`, in call order.
    pub fn cleaned_up(&self) -> Vec<u32> {
        lock(&self.state).cleaned_up.clone()
    }

    /// Make every operation on a line fail until [`restore`](Self::restore).
    pub fn fail(&self, line: u32) {
        lock(&self.state).failing.insert(line);
    }

    /// Stop injecting failures on a line.
    pub fn restore(&self, line: u32) {
        lock(&self.state).failing.remove(&line);
    }
}
