//! Configuration for the drift flow-field animation.
//!
//! The config lives at `<config_dir>/drift/config.toml`. Every field is
//! optional; a missing file means defaults.

mod error;

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use drift_core::{ColorTheme, FlowSettings, FlowSpeed};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use error::ConfigError;

/// Environment variable that requests reduced motion when set to a truthy value.
pub const REDUCE_MOTION_ENV: &str = "DRIFT_REDUCE_MOTION";

const CONFIG_FILE: &str = "config.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Never start the animation.
    pub reduce_motion: bool,
    pub color_theme: ColorTheme,
    pub speed: FlowSpeed,
    /// Show the key binding line at the bottom.
    pub show_help: bool,
    /// Target frames per second.
    pub fps: u32,
    pub flow: FlowSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reduce_motion: false,
            color_theme: ColorTheme::default(),
            speed: FlowSpeed::default(),
            show_help: true,
            fps: 60,
            flow: FlowSettings::default(),
        }
    }
}

impl Config {
    /// Path of the config file for this platform.
    pub fn path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "drift")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the config from the platform config directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load the config from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse a config from TOML text and sanitize it.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Save the config to the platform config directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Save the config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(io_err)?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Clamp out-of-range values.
    pub fn sanitized(mut self) -> Self {
        if self.fps == 0 || self.fps > 240 {
            warn!(fps = self.fps, "fps out of range, clamping");
            self.fps = self.fps.clamp(1, 240);
        }
        self.flow = self.flow.sanitized();
        self
    }

    /// Whether reduced motion is requested by the config or the environment.
    ///
    /// Sampled once at startup.
    pub fn reduce_motion_requested(&self) -> bool {
        self.reduce_motion || is_truthy(std::env::var(REDUCE_MOTION_ENV).ok().as_deref())
    }
}

/// Interpret an optional environment value as a boolean flag.
fn is_truthy(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no")),
    }
}
