//! Connection lifecycle
//!
//! Owns at most one open [`DeviceStream`]. The manager moves between
//! `Disconnected` and `Connected`; it drops back to `Disconnected` on
//! close or when the executor reports an unrecovered transport error.

use super::{Connector, DeviceStream, DeviceTiming};
use gdgkit_core::{ConnectionState, Result, StateError};
use std::thread;

/// An open stream plus the bytes read past the last reply terminator
pub(crate) struct Link {
    pub(crate) stream: Box<dyn DeviceStream>,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) pending: Vec<u8>,
}

/// Owner of the device connection
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    link: Option<Link>,
}

impl ConnectionManager {
    /// Create a disconnected manager that opens streams through `connector`.
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            link: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        if self.link.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Check if a connection is open
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Host of the open connection
    pub fn host(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.host.as_str())
    }

    /// Port of the open connection
    pub fn port(&self) -> Option<u16> {
        self.link.as_ref().map(|link| link.port)
    }

    /// Open a connection and wait for the device to settle.
    ///
    /// Fails with [`StateError::AlreadyConnected`] if a connection is open.
    /// On failure the manager stays disconnected.
    pub fn open(&mut self, host: &str, port: u16, timing: &DeviceTiming) -> Result<()> {
        if let Some(link) = &self.link {
            return Err(StateError::AlreadyConnected {
                host: link.host.clone(),
            }
            .into());
        }

        let stream = self.connector.open(host, port, timing.connect_timeout)?;
        tracing::debug!("Transport open to {}, settling for {:?}", stream.peer(), timing.connect_settle);

        if !timing.connect_settle.is_zero() {
            thread::sleep(timing.connect_settle);
        }

        self.link = Some(Link {
            stream,
            host: host.to_string(),
            port,
            pending: Vec::new(),
        });
        Ok(())
    }

    /// Close the connection if one is open.
    ///
    /// Returns the host that was closed, or `None` when already
    /// disconnected. Errors from the transport are logged and otherwise
    /// ignored; the manager is always disconnected afterwards.
    pub fn close(&mut self) -> Option<String> {
        let mut link = self.link.take()?;
        if let Err(e) = link.stream.close() {
            tracing::warn!("Error while closing connection to {}: {}", link.host, e);
        }
        Some(link.host)
    }

    /// Borrow the open link, or fail with [`StateError::NotConnected`].
    pub(crate) fn link_mut(&mut self) -> Result<&mut Link> {
        self.link
            .as_mut()
            .ok_or_else(|| StateError::NotConnected.into())
    }

    /// Discard a link that failed mid-exchange.
    pub(crate) fn drop_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            tracing::warn!("Dropping broken connection to {}", link.host);
            let _ = link.stream.close();
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("host", &self.host())
            .finish()
    }
}
