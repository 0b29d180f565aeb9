//! Configuration management for travelmemory.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "travelmemory";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "memories.db";

/// Default media library directory name (inside the data directory).
const LIBRARY_DIR_NAME: &str = "library";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TRAVELMEMORY_`, sections separated by `__`)
/// 2. TOML config file at `~/.config/travelmemory/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Capture configuration.
    pub capture: CaptureConfig,
    /// Location configuration.
    pub location: LocationConfig,
    /// Media library configuration.
    pub library: LibraryConfig,
    /// Login API configuration.
    pub api: ApiConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/travelmemory/memories.db`
    pub database_path: Option<PathBuf>,
}

/// Capture-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Whether a front-facing camera is present.
    pub front_camera: bool,
    /// Whether a rear-facing camera is present.
    pub rear_camera: bool,
    /// Probe the platform for camera devices instead of trusting the two flags above.
    pub detect_devices: bool,
    /// How long the save step waits for the location fetch, in milliseconds.
    pub location_timeout_ms: u64,
}

/// Location-related configuration.
///
/// When `endpoint` is set the location is fetched over HTTP; otherwise the
/// fixed `latitude`/`longitude` pair is reported, if present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Fixed latitude in degrees.
    pub latitude: Option<f64>,
    /// Fixed longitude in degrees.
    pub longitude: Option<f64>,
    /// JSON geolocation endpoint returning `latitude` and `longitude`.
    pub endpoint: Option<String>,
}

/// Media library configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory saved clips are copied into.
    /// Defaults to `~/.local/share/travelmemory/library`
    pub path: Option<PathBuf>,
    /// File extensions the library accepts (case-insensitive).
    pub compatible_extensions: Vec<String>,
}

/// Login API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the demo API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            front_camera: true,
            rear_camera: true,
            detect_devices: false,
            location_timeout_ms: 10_000,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: None, // Will be resolved to default at runtime
            compatible_extensions: default_compatible_extensions(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://reqres.in/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Container formats the media library accepts by default.
fn default_compatible_extensions() -> Vec<String> {
    vec!["mp4".to_string(), "mov".to_string(), "m4v".to_string()]
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("TRAVELMEMORY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.capture.location_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "location_timeout_ms must be greater than 0".to_string(),
            });
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(Error::ConfigValidation {
                        message: format!("latitude {lat} is outside -90..=90"),
                    });
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(Error::ConfigValidation {
                        message: format!("longitude {lon} is outside -180..=180"),
                    });
                }
            }
            (None, None) => {}
            _ => {
                return Err(Error::ConfigValidation {
                    message: "latitude and longitude must be set together".to_string(),
                });
            }
        }

        if self.library.compatible_extensions.is_empty() {
            return Err(Error::ConfigValidation {
                message: "compatible_extensions must not be empty".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "api timeout_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the media library directory, resolving defaults if not set.
    #[must_use]
    pub fn library_path(&self) -> PathBuf {
        self.library
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LIBRARY_DIR_NAME))
    }

    /// Get the location fetch timeout as a Duration.
    #[must_use]
    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.capture.location_timeout_ms)
    }

    /// Get the API request timeout as a Duration.
    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
