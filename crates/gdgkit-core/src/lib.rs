//! # GDGKit Core
//!
//! Core types, validation, and error handling for GDGKit.
//! Provides the device data model, the value validator, and the log event
//! bridge that connects blocking device calls to a polling presentation loop.

pub mod data;
pub mod error;
pub mod event_log;
pub mod types;
pub mod validation;

pub use data::{
    AdjustmentKind, Channel, ConnectionState, NumericValue, OutputControl, SettingsSnapshot,
    TriggerMode, MAX_DELAY_US, MAX_WIDTH_US, MIN_VALUE_US,
};

pub use error::{ConnectionError, Error, Result, StateError, ValidationError};

pub use event_log::{log_bridge, LogEvent, LogLevel, LogReceiver, LogSink};

pub use validation::{
    validate_channel, validate_control, validate_kind, validate_mode, validate_numeric,
};
