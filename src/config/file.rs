//! Runtime settings loaded from a TOML file.
//!
//! Every table and every key is optional, so an empty file is a valid
//! configuration. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! [display]
//! device = "/dev/fb1"
//!
//! [units]
//! speed = "knots"        # kmh | knots | mph
//! distance = "nm"        # km | nm | mi
//! track_error = "ft"     # m | ft | nm
//!
//! [colors]
//! background = 0x0000
//! warning = 0xF800
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::layout::DEFAULT_DEVICE;
use crate::error::ConfigError;
use crate::units::Units;

/// Output device settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    /// Framebuffer device node.
    pub device: PathBuf,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
        }
    }
}

/// Per-role color overrides as raw 5-6-5 values. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorOverrides {
    pub background: Option<u16>,
    pub compass_rose: Option<u16>,
    pub dir_marker: Option<u16>,
    pub magnetic_dir: Option<u16>,
    pub route_indicator: Option<u16>,
    pub cdi: Option<u16>,
    pub cdi_scale: Option<u16>,
    pub alt_scale: Option<u16>,
    pub vsi: Option<u16>,
    pub alt_marker: Option<u16>,
    pub text: Option<u16>,
    pub warning: Option<u16>,
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub display: DisplaySettings,
    pub units: Units,
    pub colors: ColorOverrides,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise fall back to the defaults.
    ///
    /// A file that does not exist also gives the defaults. One that exists but
    /// cannot be read or parsed is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => match Self::load(path) {
                Ok(settings) => {
                    log::info!("Loaded configuration from {}", path.display());
                    Ok(settings)
                }
                Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    log::warn!("Config file {} not found, using defaults", path.display());
                    Ok(Self::default())
                }
                Err(err) => Err(err),
            },
            None => {
                log::debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::units::{DistanceUnit, SpeedUnit, TrackErrorUnit};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = write_config("");
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.display.device, PathBuf::from("/dev/fb"));
        assert_eq!(settings.units.speed, SpeedUnit::Kmh);
    }

    #[test]
    fn test_full_file() {
        let file = write_config(
            r#"
            [display]
            device = "/dev/fb1"

            [units]
            speed = "knots"
            distance = "nm"
            track_error = "ft"

            [colors]
            background = 0x001F
            warning = 63488
            "#,
        );
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.display.device, PathBuf::from("/dev/fb1"));
        assert_eq!(settings.units.speed, SpeedUnit::Knots);
        assert_eq!(settings.units.distance, DistanceUnit::Nm);
        assert_eq!(settings.units.track_error, TrackErrorUnit::Ft);
        assert_eq!(settings.colors.background, Some(0x001F));
        assert_eq!(settings.colors.warning, Some(0xF800));
        assert_eq!(settings.colors.cdi, None);
    }

    #[test]
    fn test_unknown_unit_is_parse_error() {
        let file = write_config("[units]\nspeed = \"furlongs\"\n");
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let file = write_config("[colors]\nbackgrund = 0\n");
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }), "got {err:?}");
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(Settings::load_or_default(Some(&path)).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_or_default_keeps_parse_errors() {
        let file = write_config("[units]\nspeed = \"warp\"\n");
        let err = Settings::load_or_default(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_load_or_default_without_path() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
