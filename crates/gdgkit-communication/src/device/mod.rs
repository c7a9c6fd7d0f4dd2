//! Device protocol
//!
//! Command encoding for the gate delay generator and the client façade
//! that composes validation, encoding and execution.

pub mod autorun;
pub mod client;
pub mod commands;

pub use autorun::AutorunSummary;
pub use client::{ClientConfig, DeviceClient};
pub use commands::{
    encode_control, encode_delay, encode_read, encode_trigger, encode_width, DeviceCommand,
    TERMINATOR,
};
