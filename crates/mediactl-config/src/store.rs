//! Configuration file store.
//!
//! A [`ConfigStore`] owns the path of one TOML document. Opening the store
//! creates the file (and its parent directories) when missing, so a fresh
//! installation starts from an empty document instead of an error.

use chrono::{DateTime, Local};
use mediactl_core::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, CONFIG_PATH_ENV, SNAPSHOT_TIMESTAMP_FORMAT,
};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::MediaConfig;

/// Locate the default configuration file.
///
/// Search order:
/// 1. `MEDIACTL_CONFIG` environment variable
/// 2. `$HOME/.config/dpt-media-control/config.toml`
///
/// # Errors
///
/// Returns `ConfigError::NoHomeDirectory` if neither variable is set.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    resolve_config_path(std::env::var_os(CONFIG_PATH_ENV), std::env::var_os("HOME"))
}

fn resolve_config_path(
    override_path: Option<OsString>,
    home: Option<OsString>,
) -> ConfigResult<PathBuf> {
    if let Some(path) = override_path.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let home = home
        .filter(|h| !h.is_empty())
        .ok_or(ConfigError::NoHomeDirectory(CONFIG_PATH_ENV))?;

    Ok(PathBuf::from(home)
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

/// TOML file store for [`MediaConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Open the store, creating parent directories and an empty file if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the directories or file cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
            }
            fs::write(&path, "").map_err(|e| ConfigError::io(&path, e))?;
            info!(path = %path.display(), "Created empty configuration file");
        }

        Ok(Self { path })
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. An empty file yields the default document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid document.
    pub fn load(&self) -> ConfigResult<MediaConfig> {
        let content = fs::read_to_string(&self.path).map_err(|e| ConfigError::io(&self.path, e))?;
        let config: MediaConfig = toml::from_str(&content)?;

        debug!(
            path = %self.path.display(),
            inputs = config.input_pins.len(),
            outputs = config.output_pins.len(),
            virtuals = config.virtual_pins.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Write the document to the configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn save(&self, config: &MediaConfig) -> ConfigResult<()> {
        write_document(&self.path, config)?;
        info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Write the document next to the configured file under a timestamped
    /// name (`20250110-1430_config.toml`) and return that path.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn save_snapshot(&self, config: &MediaConfig) -> ConfigResult<PathBuf> {
        let path = self.snapshot_path(Local::now());
        write_document(&path, config)?;
        info!(path = %path.display(), "Configuration snapshot saved");
        Ok(path)
    }

    /// Snapshot file name for a given instant.
    pub fn snapshot_path(&self, at: DateTime<Local>) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let name = format!(
            "{}_{stem}{extension}",
            at.format(SNAPSHOT_TIMESTAMP_FORMAT)
        );

        self.path.with_file_name(name)
    }
}

fn write_document(path: &Path, config: &MediaConfig) -> ConfigResult<()> {
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content).map_err(|e| ConfigError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_prefers_override() {
        let path = resolve_config_path(
            Some(OsString::from("/etc/mediactl.toml")),
            Some(OsString::from("/home/stage")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/etc/mediactl.toml"));
    }

    #[test]
    fn test_resolve_from_home() {
        let path = resolve_config_path(None, Some(OsString::from("/home/stage"))).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/home/stage/.config/dpt-media-control/config.toml")
        );
    }

    #[test]
    fn test_resolve_ignores_empty_override() {
        let path =
            resolve_config_path(Some(OsString::new()), Some(OsString::from("/root"))).unwrap();
        assert_eq!(path, PathBuf::from("/root/.config/dpt-media-control/config.toml"));
    }

    #[test]
    fn test_resolve_without_home_fails() {
        assert!(matches!(
            resolve_config_path(None, None),
            Err(ConfigError::NoHomeDirectory(_))
        ));
    }

    #[test]
    fn test_snapshot_path_format() {
        let store = ConfigStore {
            path: PathBuf::from("/srv/media/config.toml"),
        };
        let at = Local.with_ymd_and_hms(2025, 1, 10, 14, 30, 5).unwrap();

        assert_eq!(
            store.snapshot_path(at),
            PathBuf::from("/srv/media/20250110-1430_config.toml")
        );
    }

    #[test]
    fn test_snapshot_path_without_extension() {
        let store = ConfigStore {
            path: PathBuf::from("/srv/media/pins"),
        };
        let at = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();

        assert_eq!(
            store.snapshot_path(at),
            PathBuf::from("/srv/media/20241231-2359_pins")
        );
    }
}
