//! Command execution
//!
//! One exchange: write the command line, wait the settle interval, then
//! read until the terminator byte or until the response window closes.
//! A reply cut short by the window is returned as-is; callers decide
//! whether an empty answer is suspicious.

use super::{is_timeout, ConnectionManager};
use gdgkit_core::{ConnectionError, LogSink, Result};
use std::io;
use std::thread;
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 256;

/// Raw reply bytes, and whether the peer hung up while sending them
struct Reply {
    bytes: Vec<u8>,
    peer_closed: bool,
}

impl Reply {
    fn open(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            peer_closed: false,
        }
    }
}

/// Runs write/settle/read exchanges over a [`ConnectionManager`]
#[derive(Debug, Clone, Copy)]
pub struct CommandExecutor {
    settle: Duration,
}

impl CommandExecutor {
    /// Create an executor that waits `settle` between write and read.
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    /// Settle interval between write and read
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Send `command` verbatim and collect the reply.
    ///
    /// Fails immediately with `NotConnected` when no connection is open.
    /// A transport failure closes the connection before the error is
    /// returned. A reply cut short by the peer hanging up is still
    /// returned, but the connection is closed. The reply is decoded
    /// permissively and trimmed.
    pub fn execute(
        &self,
        connection: &mut ConnectionManager,
        command: &str,
        terminator: u8,
        response_wait: Duration,
        log: &LogSink,
    ) -> Result<String> {
        let result = self.exchange(connection, command, terminator, response_wait);
        match result {
            Ok(reply) => {
                let response = decode_permissive(&reply.bytes).trim().to_string();
                log.debug(format!("run cmd:{}, return:{}", command.trim(), response));
                if reply.peer_closed {
                    connection.drop_link();
                }
                Ok(response)
            }
            Err(e) => {
                connection.drop_link();
                Err(e)
            }
        }
    }

    fn exchange(
        &self,
        connection: &mut ConnectionManager,
        command: &str,
        terminator: u8,
        response_wait: Duration,
    ) -> Result<Reply> {
        let link = connection.link_mut()?;

        link.stream
            .write_all(command.as_bytes())
            .map_err(|e| io_failure("write", e))?;

        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }

        let deadline = Instant::now() + response_wait;
        let mut collected = std::mem::take(&mut link.pending);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(pos) = collected.iter().position(|&b| b == terminator) {
                link.pending = collected.split_off(pos + 1);
                return Ok(Reply::open(collected));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(
                    "No terminator within {}ms for '{}'",
                    response_wait.as_millis(),
                    command.trim()
                );
                return Ok(Reply::open(collected));
            }

            match link.stream.read_timeout(&mut chunk, remaining) {
                Ok(0) => {
                    if collected.is_empty() {
                        return Err(ConnectionError::ConnectionLost {
                            reason: format!("{} closed the connection", link.host),
                        }
                        .into());
                    }
                    tracing::debug!(
                        "{} closed the connection after {} bytes",
                        link.host,
                        collected.len()
                    );
                    return Ok(Reply {
                        bytes: collected,
                        peer_closed: true,
                    });
                }
                Ok(n) => collected.extend_from_slice(&chunk[..n]),
                Err(e) if is_timeout(&e) => {
                    tracing::debug!(
                        "Response window closed for '{}' with {} bytes",
                        command.trim(),
                        collected.len()
                    );
                    return Ok(Reply::open(collected));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_failure("read", e)),
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Decode device bytes, dropping anything that is not ASCII.
///
/// Line noise and telnet control bytes are discarded instead of failing
/// the whole reply.
pub fn decode_permissive(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

fn io_failure(op: &str, err: io::Error) -> gdgkit_core::Error {
    ConnectionError::ConnectionLost {
        reason: format!("{} failed: {}", op, err),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::{DeviceTiming, MockDevice};
    use gdgkit_core::{log_bridge, Error, LogLevel, StateError};

    fn connected(device: &MockDevice) -> ConnectionManager {
        let mut manager = ConnectionManager::new(device.connector());
        manager
            .open("mock", 10001, &DeviceTiming::immediate())
            .unwrap();
        manager
    }

    #[test]
    fn test_decode_drops_non_ascii() {
        assert_eq!(decode_permissive(b"ok\xff\xfe\r\n"), "ok\r\n");
        assert_eq!(decode_permissive(&[0xc3, 0xa9, b'a']), "a");
    }

    #[test]
    fn test_execute_returns_trimmed_reply() {
        let device = MockDevice::new();
        device.script_reply("  12.0, 1.0, 3.0, 4.0 \r\n");
        let mut manager = connected(&device);
        let (sink, mut receiver) = log_bridge(LogLevel::Debug);

        let reply = CommandExecutor::new(Duration::ZERO)
            .execute(&mut manager, "ral\n", b'\n', Duration::from_millis(100), &sink)
            .unwrap();

        assert_eq!(reply, "12.0, 1.0, 3.0, 4.0");
        assert_eq!(device.written(), "ral\n");
        let events = receiver.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "run cmd:ral, return:12.0, 1.0, 3.0, 4.0");
    }

    #[test]
    fn test_missing_terminator_returns_partial_text() {
        let device = MockDevice::new();
        device.script_reply("partial");
        let mut manager = connected(&device);
        let (sink, _receiver) = log_bridge(LogLevel::Info);

        let reply = CommandExecutor::new(Duration::ZERO)
            .execute(&mut manager, "ral\n", b'\n', Duration::from_millis(50), &sink)
            .unwrap();

        assert_eq!(reply, "partial");
        assert!(manager.is_connected());
    }

    #[test]
    fn test_silent_device_returns_empty() {
        let device = MockDevice::new();
        device.set_silent(true);
        let mut manager = connected(&device);
        let (sink, _receiver) = log_bridge(LogLevel::Info);

        let reply = CommandExecutor::new(Duration::ZERO)
            .execute(&mut manager, "ral\n", b'\n', Duration::from_millis(50), &sink)
            .unwrap();
        assert_eq!(reply, "");
    }

    #[test]
    fn test_bytes_after_terminator_carry_over() {
        let device = MockDevice::new();
        device.script_reply("first\nsecond\n");
        device.script_reply("");
        let mut manager = connected(&device);
        let (sink, _receiver) = log_bridge(LogLevel::Info);
        let executor = CommandExecutor::new(Duration::ZERO);

        let wait = Duration::from_millis(50);
        assert_eq!(
            executor.execute(&mut manager, "ral\n", b'\n', wait, &sink).unwrap(),
            "first"
        );
        assert_eq!(
            executor.execute(&mut manager, "ral\n", b'\n', wait, &sink).unwrap(),
            "second"
        );
    }

    #[test]
    fn test_hangup_after_partial_reply_drops_connection() {
        let device = MockDevice::new();
        device.script_reply("10000000.0, 00");
        device.hang_up_after_reply();
        let mut manager = connected(&device);
        let (sink, _receiver) = log_bridge(LogLevel::Info);

        let reply = CommandExecutor::new(Duration::ZERO)
            .execute(&mut manager, "ral\n", b'\n', Duration::from_millis(50), &sink)
            .unwrap();

        assert_eq!(reply, "10000000.0, 00");
        assert!(!manager.is_connected());
        assert!(!device.is_open());
    }

    #[test]
    fn test_settle_interval() {
        assert_eq!(
            CommandExecutor::new(Duration::from_millis(250)).settle(),
            Duration::from_millis(250)
        );
        assert_eq!(CommandExecutor::default().settle(), Duration::from_secs(1));
    }

    #[test]
    fn test_not_connected_fails_without_io() {
        let device = MockDevice::new();
        let mut manager = ConnectionManager::new(device.connector());
        let (sink, _receiver) = log_bridge(LogLevel::Info);

        let err = CommandExecutor::new(Duration::ZERO)
            .execute(&mut manager, "ral\n", b'\n', Duration::from_millis(50), &sink)
            .unwrap_err();

        assert_eq!(err, Error::State(StateError::NotConnected));
        assert_eq!(device.written(), "");
    }

    #[test]
    fn test_write_failure_drops_connection() {
        let device = MockDevice::new();
        let mut manager = connected(&device);
        device.set_fail_writes(true);
        let (sink, _receiver) = log_bridge(LogLevel::Info);

        let err = CommandExecutor::new(Duration::ZERO)
            .execute(&mut manager, "aen\n", b'\n', Duration::from_millis(50), &sink)
            .unwrap_err();

        assert!(err.is_connection_error());
        assert!(!manager.is_connected());
    }

    #[test]
    fn test_peer_hangup_drops_connection() {
        let device = MockDevice::new();
        let mut manager = connected(&device);
        device.hang_up();
        let (sink, _receiver) = log_bridge(LogLevel::Info);

        let err = CommandExecutor::new(Duration::ZERO)
            .execute(&mut manager, "ral\n", b'\n', Duration::from_millis(50), &sink)
            .unwrap_err();

        assert!(err.is_connection_error());
        assert!(!manager.is_connected());
    }
}
