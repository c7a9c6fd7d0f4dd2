//! GDGKit Settings Crate
//!
//! Handles application configuration and settings persistence.

pub mod config;
pub mod error;

pub use config::{AutorunSettings, Config, ConnectionSettings, LogSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
