//! Console configuration.
//!
//! Loaded from `~/.config/vigil/config.toml` when present, with environment
//! variables taking priority over the file:
//!
//! - `VIGIL_BACKEND_URL` - base URL of the operations backend
//! - `OPENWEATHER_API_KEY` - key for the weather lookup
//!
//! Every field has a default, so a missing config file is not an error; the
//! weather client is the only consumer that requires an explicit value (the
//! API key).

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use vigil_core::{Result, VigilError};

/// Backend the console talks to when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

// Monitored site coordinates (central Texas wind corridor).
const DEFAULT_SITE_LATITUDE: f64 = 31.9686;
const DEFAULT_SITE_LONGITUDE: f64 = -99.9018;

/// Top-level console configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Base URL of the operations backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// Weather lookup settings for the monitored site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// OpenWeather API key; the weather command is unavailable without one
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_latitude() -> f64 {
    DEFAULT_SITE_LATITUDE
}

fn default_longitude() -> f64 {
    DEFAULT_SITE_LONGITUDE
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            api_key: None,
        }
    }
}

impl ConsoleConfig {
    /// Loads configuration from the user config directory and environment.
    ///
    /// # Errors
    ///
    /// Returns an error only when a config file exists but cannot be read
    /// or parsed; a missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = dirs::config_dir().map(|dir| dir.join("vigil").join("config.toml"));
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|err| VigilError::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("VIGIL_BACKEND_URL") {
            if !url.is_empty() {
                self.backend_url = url;
            }
        }
        if let Ok(key) = env::var("OPENWEATHER_API_KEY") {
            if !key.is_empty() {
                self.weather.api_key = Some(key);
            }
        }
    }
}
