//! TCP transport implementation
//!
//! The device exposes its command interface as a raw TCP socket. No telnet
//! option negotiation takes place; bytes are passed through untouched.

use super::{is_timeout, Connector, DeviceStream};
use gdgkit_core::{ConnectionError, Result};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Opens [`TcpDeviceStream`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    /// Create a new TCP connector
    pub fn new() -> Self {
        Self
    }
}

impl Connector for TcpConnector {
    fn open(&self, host: &str, port: u16, timeout: Duration) -> Result<Box<dyn DeviceStream>> {
        let stream = TcpDeviceStream::connect(host, port, timeout)?;
        Ok(Box::new(stream))
    }
}

/// A connected TCP socket
#[derive(Debug)]
pub struct TcpDeviceStream {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpDeviceStream {
    /// Resolve `host` and connect to the first address that accepts.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        if host.is_empty() {
            return Err(ConnectionError::EmptyHost.into());
        }
        if timeout.is_zero() {
            return Err(ConnectionError::FailedToOpen {
                address: format!("{}:{}", host, port),
                reason: "connect timeout must be > 0".to_string(),
            }
            .into());
        }

        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| {
                tracing::warn!("Failed to resolve {}: {}", host, e);
                ConnectionError::HostnameResolution {
                    hostname: host.to_string(),
                }
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ConnectionError::HostnameResolution {
                hostname: host.to_string(),
            }
            .into());
        }

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_write_timeout(Some(timeout))?;
                    tracing::debug!("TCP connection established to {}", addr);
                    return Ok(Self { stream, peer: addr });
                }
                Err(e) => {
                    tracing::debug!("TCP connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(ConnectionError::FailedToOpen {
            address: format!("{}:{}", host, port),
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no address accepted the connection".to_string()),
        }
        .into())
    }
}

impl DeviceStream for TcpDeviceStream {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        if timeout.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "read window closed"));
        }
        self.stream.set_read_timeout(Some(timeout))?;
        match self.stream.read(buf) {
            Err(e) if is_timeout(&e) => Err(io::Error::new(io::ErrorKind::TimedOut, e)),
            other => other,
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }
}
