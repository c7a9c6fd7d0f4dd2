//! Configuration and settings management for GDGKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in the platform config directory.
//!
//! Configuration is organized into sections:
//! - Connection settings (port, timeouts, settle intervals)
//! - Host presets (short names for the lab's delay generators)
//! - Logging (minimum severity shown to the operator)
//! - Autorun (sweep step interval)

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use gdgkit_core::LogLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// TCP port of the device's network interface
    pub port: u16,
    /// Transport connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Wait after connecting before the first command, in milliseconds
    pub connect_settle_ms: u64,
    /// Wait between writing a command and reading its reply, in milliseconds
    pub command_settle_ms: u64,
    /// Bound on waiting for a reply terminator, in milliseconds
    pub response_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: 10001,
            connect_timeout_ms: 1000,
            connect_settle_ms: 1000,
            command_settle_ms: 1000,
            response_timeout_ms: 1000,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Lowest severity delivered to the operator log
    pub level: LogLevel,
}

/// Autorun settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutorunSettings {
    /// Time between sweep steps in milliseconds
    pub interval_ms: u64,
}

impl Default for AutorunSettings {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

/// The lab's delay generators.
fn default_hosts() -> BTreeMap<String, String> {
    [
        ("gdg1", "172.19.68.136"),
        ("gdg2", "172.19.68.137"),
        ("gdg3", "172.19.68.138"),
        ("gdg4", "172.19.68.198"),
        ("gdg5", "172.19.68.199"),
        ("gdg6", "172.19.68.220"),
        ("gdg7", "172.19.68.209"),
        ("gdg8", "172.19.68.210"),
        ("gdg9", "172.19.68.229"),
        ("gdg10", "172.19.68.148"),
    ]
    .into_iter()
    .map(|(name, addr)| (name.to_string(), addr.to_string()))
    .collect()
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Host presets, name to address
    pub hosts: BTreeMap<String, String>,
    /// Logging settings
    pub logging: LogSettings,
    /// Autorun settings
    pub autorun: AutorunSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            hosts: default_hosts(),
            logging: LogSettings::default(),
            autorun: AutorunSettings::default(),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/gdgkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("gdgkit").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format_of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(e.to_string()))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let c = &self.connection;
        if c.port == 0 {
            return Err(out_of_range("connection.port", c.port));
        }
        if c.connect_timeout_ms == 0 {
            return Err(out_of_range("connection.connect_timeout_ms", 0));
        }
        if c.response_timeout_ms == 0 {
            return Err(out_of_range("connection.response_timeout_ms", 0));
        }
        if self.autorun.interval_ms == 0 {
            return Err(out_of_range("autorun.interval_ms", 0));
        }

        for (name, address) in &self.hosts {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidHost {
                    name: name.clone(),
                    reason: "empty name".to_string(),
                });
            }
            if address.trim().is_empty() {
                return Err(ConfigError::InvalidHost {
                    name: name.clone(),
                    reason: "empty address".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Map a preset name to its address; anything else passes through.
    ///
    /// Preset names match case-insensitively.
    pub fn resolve_host<'a>(&'a self, name_or_address: &'a str) -> &'a str {
        let wanted = name_or_address.trim();
        self.hosts
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, address)| address.as_str())
            .unwrap_or(wanted)
    }
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.connection.port, 10001);
        assert_eq!(config.connection.command_settle_ms, 1000);
        assert_eq!(config.hosts.len(), 10);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_resolve_host() {
        let config = Config::new();
        assert_eq!(config.resolve_host("gdg3"), "172.19.68.138");
        assert_eq!(config.resolve_host("GDG10"), "172.19.68.148");
        assert_eq!(config.resolve_host(" 10.0.0.5 "), "10.0.0.5");
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::new();
        config.connection.response_timeout_ms = 2500;
        config.logging.level = LogLevel::Debug;
        config.hosts.insert("bench".to_string(), "127.0.0.1".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "connection": { "port": 2000 } }"#).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.connection.port, 2000);
        assert_eq!(loaded.connection.response_timeout_ms, 1000);
        assert_eq!(loaded.hosts.len(), 10);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::new();
        config.connection.response_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { .. })
        ));

        let mut config = Config::new();
        config.hosts.insert("lab".to_string(), " ".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHost { .. })
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let err = Config::new().save_to_file(&path).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
