//! Byte stream transport layer
//!
//! A [`Connector`] opens a [`DeviceStream`]; the [`ConnectionManager`] owns
//! the single open stream and the [`CommandExecutor`] runs one
//! write/settle/read exchange over it.
//!
//! All operations are blocking. Reads take an explicit timeout so the
//! executor can bound its wait for the terminator byte.

pub mod connection;
pub mod executor;
pub mod mock;
pub mod tcp;

pub use connection::ConnectionManager;
pub use executor::{decode_permissive, CommandExecutor};
pub use mock::{MockConnector, MockDevice};
pub use tcp::{TcpConnector, TcpDeviceStream};

use gdgkit_core::Result;
use std::io;
use std::time::Duration;

/// Default TCP port of the device's network interface
pub const DEFAULT_PORT: u16 = 10001;

/// Timing contract with the device
///
/// The device has no ready signal, so every exchange relies on fixed
/// waits. Defaults match the hardware; tests shrink them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTiming {
    /// Bound on establishing the transport connection
    pub connect_timeout: Duration,
    /// Grace period after the transport opens before the device answers reliably
    pub connect_settle: Duration,
    /// Wait between writing a command and reading its reply
    pub command_settle: Duration,
    /// Bound on waiting for the reply terminator
    pub response_timeout: Duration,
}

impl Default for DeviceTiming {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            connect_settle: Duration::from_secs(1),
            command_settle: Duration::from_secs(1),
            response_timeout: Duration::from_secs(1),
        }
    }
}

impl DeviceTiming {
    /// No settle waits and a short response window, for simulated devices.
    pub fn immediate() -> Self {
        Self {
            connect_timeout: Duration::from_millis(500),
            connect_settle: Duration::ZERO,
            command_settle: Duration::ZERO,
            response_timeout: Duration::from_millis(200),
        }
    }
}

/// An open, bidirectional byte stream to the device
pub trait DeviceStream: Send {
    /// Write every byte of `data`.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read available bytes, waiting at most `timeout`.
    ///
    /// Returns `Ok(0)` when the peer closed the stream and an error of kind
    /// `TimedOut` or `WouldBlock` when nothing arrived in time.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Close the stream.
    fn close(&mut self) -> io::Result<()>;

    /// Human readable peer address
    fn peer(&self) -> String;
}

/// Factory for device streams
pub trait Connector: Send {
    /// Open a stream to `host:port`, failing after `timeout`.
    fn open(&self, host: &str, port: u16, timeout: Duration) -> Result<Box<dyn DeviceStream>>;
}

/// Check whether an I/O error only means "no data yet".
pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
