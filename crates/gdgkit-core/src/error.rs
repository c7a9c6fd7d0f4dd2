//! Error handling for GDGKit
//!
//! Provides error types for all layers of the client:
//! - Validation errors (caller input rejected before it reaches the wire)
//! - State errors (operation invoked in the wrong connection state)
//! - Connection errors (transport level open/read/write failures)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::data::AdjustmentKind;
use thiserror::Error;

/// Validation error type
///
/// Raised by the value validator for malformed or out-of-range input.
/// A value that fails validation never reaches the command encoder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Channel identifier is not A or B
    #[error("Error channel value: {value}")]
    InvalidChannel {
        /// The rejected input.
        value: String,
    },

    /// Adjustment kind is neither delay nor width
    #[error("Error type value: {value}")]
    InvalidAdjustment {
        /// The rejected input.
        value: String,
    },

    /// Trigger mode is neither first nor last
    #[error("Error trigger mode value: {value}")]
    InvalidTriggerMode {
        /// The rejected input.
        value: String,
    },

    /// Output control is neither enable nor disable
    #[error("Error control value: {value}")]
    InvalidOutputControl {
        /// The rejected input.
        value: String,
    },

    /// Numeric input could not be parsed as a finite decimal
    #[error("Error {kind} value: {value} is not a number")]
    NotANumber {
        /// Quantity the value was meant for.
        kind: AdjustmentKind,
        /// The rejected input.
        value: String,
    },

    /// Numeric input outside the legal range for its quantity
    #[error("Error {kind} value: {value} (must be between {min} and {max} us)")]
    OutOfRange {
        /// Quantity the value was meant for.
        kind: AdjustmentKind,
        /// The rejected input.
        value: String,
        /// Inclusive lower bound in microseconds.
        min: f64,
        /// Inclusive upper bound in microseconds.
        max: f64,
    },
}

/// State error type
///
/// An operation was invoked while the client was in the wrong connection state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No device connection is open
    #[error("Device not connected")]
    NotConnected,

    /// A device connection is already open
    #[error("Already connected to {host}, disconnect first")]
    AlreadyConnected {
        /// Host of the open connection.
        host: String,
    },
}

/// Connection error type
///
/// Represents byte-stream level failures while opening, writing to or
/// reading from the device connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No host was given
    #[error("No host given")]
    EmptyHost,

    /// Host name resolved to no usable address
    #[error("Failed to resolve hostname {hostname}")]
    HostnameResolution {
        /// The host that failed to resolve.
        hostname: String,
    },

    /// Transport refused to open
    #[error("Failed to connect to {address}: {reason}")]
    FailedToOpen {
        /// Address of the attempted connection.
        address: String,
        /// The reason the open failed.
        reason: String,
    },

    /// Peer closed the connection or it broke mid-exchange
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// I/O error on an open connection
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Main error type for GDGKit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// State error
    #[error(transparent)]
    State(#[from] StateError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Device answered a query with nothing before the response window closed
    #[error("Return empty string from host for command '{command}'")]
    EmptyResponse {
        /// The command that received no answer.
        command: String,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a state error
    pub fn is_state_error(&self) -> bool {
        matches!(self, Error::State(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Connection(ConnectionError::Io {
            reason: err.to_string(),
        })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
