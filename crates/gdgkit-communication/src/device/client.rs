//! Device control client
//!
//! The public face of the protocol stack. Each operation validates its
//! input, encodes a command, runs one exchange and reports the outcome
//! through the log bridge. Failures never escape as errors: they come back
//! as `false` or an empty snapshot together with exactly one Error event.

use crate::communication::{
    CommandExecutor, ConnectionManager, Connector, DeviceTiming, TcpConnector,
};
use crate::device::commands::{DeviceCommand, TERMINATOR};
use gdgkit_core::{
    log_bridge, validate_channel, validate_control, validate_mode, validate_numeric,
    AdjustmentKind, ConnectionState, Error, LogEvent, LogLevel, LogReceiver, LogSink, Result,
    SettingsSnapshot, StateError,
};
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Settle and timeout intervals
    pub timing: DeviceTiming,
    /// Lowest severity queued on the log bridge
    pub log_level: LogLevel,
    /// Wait between autorun steps
    pub autorun_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timing: DeviceTiming::default(),
            log_level: LogLevel::Info,
            autorun_interval: Duration::from_secs(1),
        }
    }
}

impl ClientConfig {
    /// Configuration for simulated devices: no settle waits, debug logging.
    pub fn immediate() -> Self {
        Self {
            timing: DeviceTiming::immediate(),
            log_level: LogLevel::Debug,
            autorun_interval: Duration::from_millis(1),
        }
    }
}

/// Remote control client for one device
///
/// Operations take `&mut self` and block until the exchange completes;
/// share a client between threads behind a mutex.
pub struct DeviceClient {
    connection: ConnectionManager,
    executor: CommandExecutor,
    pub(crate) config: ClientConfig,
    pub(crate) log: LogSink,
    receiver: Option<LogReceiver>,
}

impl DeviceClient {
    /// Create a client that connects over TCP.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, Box::new(TcpConnector::new()))
    }

    /// Create a client that opens connections through `connector`.
    pub fn with_connector(config: ClientConfig, connector: Box<dyn Connector>) -> Self {
        let (log, receiver) = log_bridge(config.log_level);
        Self {
            connection: ConnectionManager::new(connector),
            executor: CommandExecutor::new(config.timing.command_settle),
            config,
            log,
            receiver: Some(receiver),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Host of the open connection
    pub fn host(&self) -> Option<&str> {
        self.connection.host()
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Producer handle, for callers that add their own events to the log.
    pub fn log_sink(&self) -> &LogSink {
        &self.log
    }

    /// Hand the log consumer to an independent polling loop.
    ///
    /// Returns `None` if it was already taken. Afterwards
    /// [`drain_log_events`](Self::drain_log_events) always returns nothing.
    pub fn take_log_receiver(&mut self) -> Option<LogReceiver> {
        self.receiver.take()
    }

    /// Remove and return every queued log event without blocking.
    pub fn drain_log_events(&mut self) -> Vec<LogEvent> {
        self.receiver
            .as_mut()
            .map(LogReceiver::drain)
            .unwrap_or_default()
    }

    /// Open a connection to `host:port`.
    pub fn connect(&mut self, host: &str, port: u16) -> bool {
        match self.try_connect(host, port) {
            Ok(()) => {
                self.log
                    .info(format!("connected to host: {}, port: {}", host.trim(), port));
                true
            }
            Err(e) => self.report(e),
        }
    }

    /// Close the connection. Always succeeds.
    pub fn disconnect(&mut self) -> bool {
        match self.connection.close() {
            Some(host) => self.log.info(format!("disconnected from host {}", host)),
            None => self.log.debug("already disconnected"),
        }
        true
    }

    /// Read delay and width of both channels.
    ///
    /// Returns an empty snapshot on failure.
    pub fn read_settings(&mut self) -> SettingsSnapshot {
        let command = DeviceCommand::ReadAll.encode();
        let response = match self.run(&command) {
            Ok(response) => response,
            Err(e) => {
                self.report(e);
                return SettingsSnapshot::empty();
            }
        };

        self.log.info(format!("Read current setting {}", response));
        if response.is_empty() {
            self.report(Error::EmptyResponse {
                command: command.trim().to_string(),
            });
        }
        SettingsSnapshot::new(response)
    }

    /// Set a channel's delay or width in microseconds.
    ///
    /// Invalid input is rejected before anything is sent.
    pub fn set_adjustment(&mut self, channel: &str, kind: AdjustmentKind, raw_value: &str) -> bool {
        let result = self.try_command(|| {
            Ok(DeviceCommand::Adjust {
                channel: validate_channel(channel)?,
                value: validate_numeric(kind, raw_value)?,
            })
        });
        match result {
            Ok(response) => {
                self.log.info(format!(
                    "Set channel ({}) {} as value {}, return: {}",
                    channel, kind, raw_value.trim(), response
                ));
                true
            }
            Err(e) => self.report(e),
        }
    }

    /// Select a channel's trigger mode (`first`/`f` or `last`/`l`).
    pub fn set_trigger_mode(&mut self, channel: &str, raw_mode: &str) -> bool {
        let result = self.try_command(|| {
            Ok(DeviceCommand::Trigger {
                channel: validate_channel(channel)?,
                mode: validate_mode(raw_mode)?,
            })
        });
        match result {
            Ok(response) => {
                self.log.info(format!(
                    "Set channel ({}) mode as {}, return: {}",
                    channel, raw_mode, response
                ));
                true
            }
            Err(e) => self.report(e),
        }
    }

    /// Enable or disable a channel's output (`enable`/`en`, `disable`/`di`).
    pub fn set_output_control(&mut self, channel: &str, raw_ctrl: &str) -> bool {
        let result = self.try_command(|| {
            Ok(DeviceCommand::Output {
                channel: validate_channel(channel)?,
                control: validate_control(raw_ctrl)?,
            })
        });
        match result {
            Ok(response) => {
                self.log.info(format!(
                    "Set channel ({}) output as {}, return: {}",
                    channel, raw_ctrl, response
                ));
                true
            }
            Err(e) => self.report(e),
        }
    }

    fn try_connect(&mut self, host: &str, port: u16) -> Result<()> {
        if let Some(current) = self.connection.host() {
            return Err(StateError::AlreadyConnected {
                host: current.to_string(),
            }
            .into());
        }
        self.connection.open(host.trim(), port, &self.config.timing)
    }

    /// Build a command, then run it. Nothing is sent if building fails.
    fn try_command<F>(&mut self, build: F) -> Result<String>
    where
        F: FnOnce() -> Result<DeviceCommand>,
    {
        let command = build()?;
        self.run(&command.encode())
    }

    fn run(&mut self, command: &str) -> Result<String> {
        self.executor.execute(
            &mut self.connection,
            command,
            TERMINATOR,
            self.config.timing.response_timeout,
            &self.log,
        )
    }

    /// Log a failure as the single Error event for this operation.
    pub(crate) fn report(&self, err: Error) -> bool {
        self.log.error(err.to_string());
        false
    }
}

impl std::fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceClient")
            .field("connection", &self.connection)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
