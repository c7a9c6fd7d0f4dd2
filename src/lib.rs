//! # GDGKit
//!
//! Remote control client for a dual channel (A/B) gate and delay generator
//! reachable over a line oriented TCP link.
//!
//! ## Architecture
//!
//! GDGKit is organized as a workspace with multiple crates:
//!
//! 1. **gdgkit-core** - Domain types, value validation, errors, log event bridge
//! 2. **gdgkit-communication** - TCP transport, command execution, device client
//! 3. **gdgkit-settings** - Configuration file handling and host presets
//! 4. **gdgkit** - Command line front end that integrates all crates
//!
//! ## Features
//!
//! - **Settings read-back**: raw `ral` snapshot of both channels
//! - **Adjustments**: pulse delay and width with range checks before anything is sent
//! - **Trigger and output control**: first/last trigger mode, output enable/disable
//! - **Autorun**: timed delay sweeps
//! - **Simulation**: an in-process instrument model for running without hardware

use std::time::Duration;

pub use gdgkit_core::{
    log_bridge, AdjustmentKind, Channel, ConnectionError, ConnectionState, Error, LogEvent,
    LogLevel, LogReceiver, LogSink, OutputControl, Result, SettingsSnapshot, StateError,
    TriggerMode, ValidationError,
};

pub use gdgkit_communication::{
    AutorunSummary, ClientConfig, DeviceClient, DeviceTiming, MockDevice, DEFAULT_PORT,
};

pub use gdgkit_settings::{Config, ConfigError, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Build the device client configuration from the settings file model.
///
/// `debug` forces the operator log down to debug level.
pub fn client_config(config: &Config, debug: bool) -> ClientConfig {
    let c = &config.connection;
    ClientConfig {
        timing: DeviceTiming {
            connect_timeout: Duration::from_millis(c.connect_timeout_ms),
            connect_settle: Duration::from_millis(c.connect_settle_ms),
            command_settle: Duration::from_millis(c.command_settle_ms),
            response_timeout: Duration::from_millis(c.response_timeout_ms),
        },
        log_level: if debug {
            LogLevel::Debug
        } else {
            config.logging.level
        },
        autorun_interval: Duration::from_millis(config.autorun.interval_ms),
    }
}

/// Initialize logging with the default configuration
///
/// Sets up structured diagnostics with:
/// - Console output on stderr, so it never mixes with command output
/// - RUST_LOG environment variable support (default `warn`)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_from_defaults() {
        let config = Config::default();
        let client = client_config(&config, false);
        assert_eq!(client, ClientConfig::default());
    }

    #[test]
    fn test_debug_flag_overrides_level() {
        let mut config = Config::default();
        config.logging.level = LogLevel::Error;
        config.connection.response_timeout_ms = 250;

        let client = client_config(&config, true);
        assert_eq!(client.log_level, LogLevel::Debug);
        assert_eq!(client.timing.response_timeout, Duration::from_millis(250));
    }
}
