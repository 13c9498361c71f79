//! Common types shared across GPIO backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Electrical level of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Logic low.
    #[default]
    Low,
    /// Logic high.
    High,
}

impl Level {
    /// Returns `true` for `High`.
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value { Level::High } else { Level::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}

/// Line direction requested at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Input with the internal pull-down enabled (released reads `Low`).
    InputPullDown,
    /// Push-pull output, initially `Low`.
    Output,
}

impl Direction {
    /// Returns `true` for input directions.
    pub fn is_input(self) -> bool {
        matches!(self, Direction::InputPullDown)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::InputPullDown => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Generic backend information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Backend name (e.g., "sysfs", "Mock GPIO").
    pub name: String,

    /// Backend model identifier.
    pub model: String,

    /// Optional location of the backend (chip path, sysfs root).
    pub location: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            location: None,
        }
    }

    /// Set the backend location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_level_from_bool() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert!(Level::High.is_high());
        assert!(!Level::default().is_high());
    }

    #[rstest]
    #[case(Level::Low, "low", false)]
    #[case(Level::High, "high", true)]
    fn test_level_display(#[case] level: Level, #[case] text: &str, #[case] high: bool) {
        assert_eq!(level.to_string(), text);
        assert_eq!(level.is_high(), high);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::InputPullDown.to_string(), "input");
        assert_eq!(Direction::Output.to_string(), "output");
        assert!(Direction::InputPullDown.is_input());
    }

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("sysfs", "Linux sysfs GPIO").with_location("/sys/class/gpio");

        assert_eq!(info.name, "sysfs");
        assert_eq!(info.location, Some("/sys/class/gpio".to_string()));
    }

    #[test]
    fn test_level_serialization() {
        let json = serde_json::to_string(&Level::High).unwrap();
        assert_eq!(json, "\"high\"");
        let level: Level = serde_json::from_str(&json).unwrap();
        assert_eq!(level, Level::High);
    }
}
