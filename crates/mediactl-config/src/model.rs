//! Configuration document model.
//!
//! The document mirrors the TOML file one to one: a `[Project]` table and
//! three arrays of pin records. Cross references between pins are kept as
//! ordered id strings; resolving them is the engine's job. A list naming the
//! same pin twice is rejected when the document is applied.
//!
//! Older files used different spellings for some keys. They are accepted on
//! load and written back in the current spelling:
//!
//! | Current | Legacy |
//! |---------|--------|
//! | `triggered_pins` | `pins_to_trigger` |
//! | `remote_action` | `virtual_trigger_method` |
//! | `ip_address` | `ip_adress` |
//! | `while_upstream_active` | `while_input` |
//! | `power_on` / `power_off` / `none` | `pjlink_power_on` / `pjlink_power_off` / `nothing` |

use mediactl_core::constants::DEFAULT_PROJECT_NAME;
use mediactl_core::{RemoteAction, TriggerMethod};
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

/// Complete configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(rename = "Project", default)]
    pub project: Project,

    #[serde(rename = "InputPins", default)]
    pub input_pins: Vec<InputPinConfig>,

    #[serde(rename = "OutputPins", default)]
    pub output_pins: Vec<OutputPinConfig>,

    #[serde(rename = "VirtualPins", default)]
    pub virtual_pins: Vec<VirtualPinConfig>,
}

impl MediaConfig {
    /// Total number of pin records.
    pub fn pin_count(&self) -> usize {
        self.input_pins.len() + self.output_pins.len() + self.virtual_pins.len()
    }

    /// Returns `true` when the document declares no pins.
    pub fn is_empty(&self) -> bool {
        self.pin_count() == 0
    }
}

/// Project metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

/// Input pin record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPinConfig {
    /// Optional explicit id; must equal the id derived from `gpio_pin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub gpio_pin: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Debounce delay in seconds.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub activation_delay: f64,

    #[serde(default, alias = "pins_to_trigger")]
    pub triggered_pins: Vec<String>,

    #[serde(default)]
    pub pins_to_block: Vec<String>,

    #[serde(default)]
    pub pins_to_unblock: Vec<String>,

    /// Resting blocked flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub blocked: bool,
}

impl InputPinConfig {
    /// Record with defaults for everything but the address.
    pub fn new(gpio_pin: i32) -> Self {
        Self {
            id: None,
            gpio_pin,
            display_name: None,
            activation_delay: 0.0,
            triggered_pins: Vec::new(),
            pins_to_block: Vec::new(),
            pins_to_unblock: Vec::new(),
            blocked: false,
        }
    }
}

/// Output pin record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPinConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub gpio_pin: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub trigger_method: TriggerMethod,

    /// High time in seconds for `hold`.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub hold_time: f64,

    #[serde(default)]
    pub pins_to_block: Vec<String>,

    #[serde(default)]
    pub pins_to_unblock: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub blocked: bool,
}

impl OutputPinConfig {
    /// Record with defaults for everything but the address.
    pub fn new(gpio_pin: i32) -> Self {
        Self {
            id: None,
            gpio_pin,
            display_name: None,
            trigger_method: TriggerMethod::default(),
            hold_time: 0.0,
            pins_to_block: Vec::new(),
            pins_to_unblock: Vec::new(),
            blocked: false,
        }
    }
}

/// Virtual pin record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualPinConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Negative placeholder address. Allocated on apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpio_pin: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Projector address, `host` or `host:port`.
    #[serde(default, alias = "ip_adress", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, alias = "virtual_trigger_method")]
    pub remote_action: RemoteAction,

    #[serde(default)]
    pub pins_to_block: Vec<String>,

    #[serde(default)]
    pub pins_to_unblock: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub blocked: bool,
}

impl VirtualPinConfig {
    /// Record with defaults for everything.
    pub fn new() -> Self {
        Self {
            id: None,
            gpio_pin: None,
            display_name: None,
            ip_address: None,
            password: None,
            remote_action: RemoteAction::default(),
            pins_to_block: Vec::new(),
            pins_to_unblock: Vec::new(),
            blocked: false,
        }
    }
}

impl Default for VirtualPinConfig {
    fn default() -> Self {
        Self::new()
    }
}
