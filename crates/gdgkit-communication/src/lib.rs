//! # GDGKit Communication
//!
//! Transport and protocol layers for GDGKit.
//! Connects to the delay generator over TCP, runs command exchanges with
//! the device's settle and timeout rules, and exposes the blocking
//! [`DeviceClient`] used by front ends.

pub mod communication;
pub mod device;

pub use communication::{
    decode_permissive, CommandExecutor, ConnectionManager, Connector, DeviceStream, DeviceTiming,
    MockConnector, MockDevice, TcpConnector, TcpDeviceStream, DEFAULT_PORT,
};

pub use device::{AutorunSummary, ClientConfig, DeviceClient, DeviceCommand, TERMINATOR};
