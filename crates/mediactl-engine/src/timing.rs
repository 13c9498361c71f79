//! Engine timing parameters.

use mediactl_core::constants::{PULSE_WIDTH_MS, SENSE_INTERVAL_MS, UPSTREAM_POLL_INTERVAL_MS};
use std::time::Duration;

/// Timing used by the sensing loop and the output strategies.
///
/// # Examples
///
/// ```
/// use mediactl_engine::EngineTiming;
/// use std::time::Duration;
///
/// let timing = EngineTiming {
///     sense_interval: Duration::from_millis(20),
///     ..EngineTiming::default()
/// };
/// assert_eq!(timing.pulse_width, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    /// Interval between two level reads of an input.
    pub sense_interval: Duration,

    /// High time of a `pulse` output.
    pub pulse_width: Duration,

    /// Poll interval of a `while_upstream_active` output.
    pub upstream_poll_interval: Duration,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            sense_interval: Duration::from_millis(SENSE_INTERVAL_MS),
            pulse_width: Duration::from_millis(PULSE_WIDTH_MS),
            upstream_poll_interval: Duration::from_millis(UPSTREAM_POLL_INTERVAL_MS),
        }
    }
}
