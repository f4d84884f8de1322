//! Configuration management (config.toml)
//!
//! Window and playback defaults, stored as TOML in the platform-specific
//! config directory. Command-line flags override these values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading or saving a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Replay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReplayConfig {
    /// Window settings
    #[serde(default)]
    pub window: WindowConfig,
    /// Playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Initial window settings. The window still grows to fit the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Initial width in pixels (default: 256)
    #[serde(default = "default_dimension")]
    pub width: u32,
    /// Initial height in pixels (default: 256)
    #[serde(default = "default_dimension")]
    pub height: u32,
    /// Window title (default: "glretrace")
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlaybackConfig {
    /// Present on buffer swaps instead of counting flushes (default: false)
    #[serde(default)]
    pub double_buffer: bool,
}

fn default_dimension() -> u32 {
    256
}
fn default_title() -> String {
    "glretrace".to_string()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
            title: default_title(),
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\glretrace\config`
/// On macOS: `~/Library/Application Support/org.glretrace.glretrace`
/// On Linux: `~/.config/glretrace`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "glretrace", "glretrace")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the config directory.
///
/// Returns defaults if the file is missing; an unreadable or invalid file is
/// logged and also yields defaults.
pub fn load() -> ReplayConfig {
    let Some(path) = config_dir().map(|dir| dir.join("config.toml")) else {
        return ReplayConfig::default();
    };
    if !path.exists() {
        return ReplayConfig::default();
    }
    load_from(&path).unwrap_or_else(|e| {
        tracing::warn!("{}; using default configuration", e);
        ReplayConfig::default()
    })
}

/// Loads a configuration file from an explicit path.
pub fn load_from(path: &Path) -> Result<ReplayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves the configuration to the config directory, creating it if needed.
pub fn save(config: &ReplayConfig) -> Result<(), ConfigError> {
    match config_dir() {
        Some(dir) => save_to(config, &dir.join("config.toml")),
        None => Ok(()),
    }
}

/// Saves the configuration to an explicit path.
pub fn save_to(config: &ReplayConfig, path: &Path) -> Result<(), ConfigError> {
    let io_error = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_error)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ReplayConfig::default();
        assert_eq!(config.window.width, 256);
        assert_eq!(config.window.height, 256);
        assert_eq!(config.window.title, "glretrace");
        assert!(!config.playback.double_buffer);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: ReplayConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReplayConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: ReplayConfig = toml::from_str(
            r#"
[window]
width = 640

[playback]
double_buffer = true
"#,
        )
        .unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 256); // default
        assert!(config.playback.double_buffer);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ReplayConfig {
            window: WindowConfig {
                width: 800,
                height: 600,
                title: "scene".into(),
            },
            playback: PlaybackConfig {
                double_buffer: true,
            },
        };

        save_to(&config, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_from(&missing), Err(ConfigError::Io { .. })));

        let invalid = dir.path().join("invalid.toml");
        std::fs::write(&invalid, "[window]\nwidth = \"wide\"\n").unwrap();
        assert!(matches!(load_from(&invalid), Err(ConfigError::Parse { .. })));
    }
}
