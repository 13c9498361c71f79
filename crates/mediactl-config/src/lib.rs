//! Configuration layer for the media control system.
//!
//! This crate owns the on-disk description of a pin installation: which
//! inputs, outputs and virtual pins exist, how outputs are driven and which
//! pins trigger, block or unblock each other.
//!
//! - [`MediaConfig`] - document model (serde)
//! - [`ConfigStore`] - TOML file store with create-if-missing and snapshots
//! - [`default_config_path`] - `$MEDIACTL_CONFIG` or `~/.config/dpt-media-control/config.toml`
//!
//! # Examples
//!
//! ```no_run
//! use mediactl_config::{ConfigStore, InputPinConfig, OutputPinConfig, default_config_path};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ConfigStore::open(default_config_path()?)?;
//! let mut config = store.load()?;
//!
//! let mut button = InputPinConfig::new(17);
//! button.triggered_pins.push("O#27".to_string());
//! config.input_pins.push(button);
//! config.output_pins.push(OutputPinConfig::new(27));
//!
//! store.save(&config)?;
//! store.save_snapshot(&config)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod model;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use model::{InputPinConfig, MediaConfig, OutputPinConfig, Project, VirtualPinConfig};
pub use store::{ConfigStore, default_config_path};
