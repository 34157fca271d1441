//! Error types for configuration loading and saving.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while reading or writing the config file.
#[derive(Debug)]
pub enum ConfigError {
    /// No home/config directory could be determined for this platform.
    NoConfigDir,
    /// Failed to read or write the config file.
    Io { path: PathBuf, source: std::io::Error },
    /// The config file is not valid TOML for [`crate::Config`].
    Parse(toml::de::Error),
    /// The config could not be serialized.
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "Could not determine a config directory"),
            ConfigError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(f, "Invalid config file: {}", e),
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            ConfigError::NoConfigDir => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}
