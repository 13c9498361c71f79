//! Core constants shared by the media control crates.
//!
//! These values fix the pin identifier format and the default timing of the
//! trigger engine. The timing defaults can be overridden per controller, the
//! identifier format cannot: configuration files written by one version must
//! resolve the same ids when loaded by another.
//!
//! # Pin Identifiers
//!
//! | Kind | Prefix | Example |
//! |------|--------|---------|
//! | Input | `I` | `I#17` |
//! | Output | `O` | `O#27` |
//! | Virtual | `V` | `V#1` (address `-1`) |
//!
//! ```
//! use mediactl_core::constants::*;
//!
//! let id = format!("{}{}{}", INPUT_PREFIX, ID_SEPARATOR, 17);
//! assert_eq!(id, "I#17");
//! ```

// ============================================================================
// Pin Identifiers
// ============================================================================

/// Separator between the kind prefix and the address in a pin id.
pub const ID_SEPARATOR: char = '#';

/// Id prefix for input pins.
pub const INPUT_PREFIX: char = 'I';

/// Id prefix for output pins.
pub const OUTPUT_PREFIX: char = 'O';

/// Id prefix for virtual pins.
pub const VIRTUAL_PREFIX: char = 'V';

// ============================================================================
// Engine Timing
// ============================================================================

/// Interval between two reads of an input level by the sensing loop (milliseconds).
pub const SENSE_INTERVAL_MS: u64 = 100;

/// Width of the high phase of a `pulse` output (milliseconds).
///
/// The configured hold time is ignored for this method.
pub const PULSE_WIDTH_MS: u64 = 100;

/// Poll interval used by `while_upstream_active` outputs while they wait for
/// the originating input to be released (milliseconds).
pub const UPSTREAM_POLL_INTERVAL_MS: u64 = 200;

/// Capacity of the pin event channel exposed by a running controller.
///
/// Events are published with `try_send`; a full channel drops events
/// instead of stalling a trigger.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

// ============================================================================
// Remote Devices
// ============================================================================

/// Default TCP port of a PJLink projector.
pub const PJLINK_DEFAULT_PORT: u16 = 4352;

/// Default timeout applied to each remote operation (connect, send, receive) in milliseconds.
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Configuration
// ============================================================================

/// Project name written into a fresh configuration document.
pub const DEFAULT_PROJECT_NAME: &str = "dpt-media-control";

/// Directory below `$HOME/.config` holding the default configuration file.
pub const CONFIG_DIR_NAME: &str = "dpt-media-control";

/// File name of the default configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "MEDIACTL_CONFIG";

/// `strftime` pattern prefixed to snapshot file names (`20250110-1430_config.toml`).
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_distinct() {
        assert_ne!(INPUT_PREFIX, OUTPUT_PREFIX);
        assert_ne!(OUTPUT_PREFIX, VIRTUAL_PREFIX);
        assert_ne!(INPUT_PREFIX, VIRTUAL_PREFIX);
    }

    #[test]
    fn test_poll_interval_longer_than_sense_interval() {
        assert!(UPSTREAM_POLL_INTERVAL_MS >= SENSE_INTERVAL_MS);
    }
}
