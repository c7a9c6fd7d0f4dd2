//! In-process simulated device
//!
//! [`MockDevice`] models the instrument's command set well enough to stand
//! in for hardware: it keeps delay, width, trigger mode and output state
//! per channel and answers `ral` in the device's zero padded format.
//!
//! Tests can also script raw replies, silence the device, refuse
//! connections, break writes, hang up, and inspect every byte written.
//!
//! ```rust,ignore
//! let device = MockDevice::new();
//! let mut client = DeviceClient::with_connector(ClientConfig::immediate(), device.connector());
//! assert!(client.connect("sim", DEFAULT_PORT));
//! assert!(client.set_trigger_mode("b", "last"));
//! assert_eq!(device.written(), "bpl\n");
//! ```

use super::{Connector, DeviceStream};
use gdgkit_core::types::{thread_safe, ThreadSafe};
use gdgkit_core::{
    AdjustmentKind, Channel, ConnectionError, OutputControl, Result, TriggerMode,
};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct ChannelSettings {
    delay: f64,
    width: f64,
    mode: TriggerMode,
    output: OutputControl,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            delay: 10.0,
            width: 1.0,
            mode: TriggerMode::First,
            output: OutputControl::Enable,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    channels: [ChannelSettings; 2],
    scripted: VecDeque<Vec<u8>>,
    outgoing: VecDeque<u8>,
    line_buffer: Vec<u8>,
    writes: Vec<String>,
    silent: bool,
    refuse_connections: bool,
    fail_writes: bool,
    peer_closed: bool,
    hang_up_after_reply: bool,
    open: bool,
    open_count: usize,
}

impl MockState {
    fn channel(&self, channel: Channel) -> &ChannelSettings {
        &self.channels[channel_index(channel)]
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut ChannelSettings {
        &mut self.channels[channel_index(channel)]
    }

    /// Feed written bytes; every completed line produces one reply.
    fn receive(&mut self, data: &[u8]) {
        for &byte in data {
            if byte != b'\n' {
                self.line_buffer.push(byte);
                continue;
            }
            let line = String::from_utf8_lossy(&self.line_buffer).trim().to_string();
            self.line_buffer.clear();

            let reply = match self.scripted.pop_front() {
                Some(reply) => reply,
                None => self.simulate(&line).into_bytes(),
            };
            if !self.silent && !self.peer_closed {
                self.outgoing.extend(reply);
            }
            if self.hang_up_after_reply {
                self.hang_up_after_reply = false;
                self.peer_closed = true;
            }
        }
    }

    fn simulate(&mut self, line: &str) -> String {
        if line == "ral" {
            let a = self.channel(Channel::A);
            let b = self.channel(Channel::B);
            return format!(
                "{:010.1}, {:010.1}, {:010.1}, {:010.1}\n",
                a.delay, a.width, b.delay, b.width
            );
        }

        let channel = match line.chars().next() {
            Some('a') => Channel::A,
            Some('b') => Channel::B,
            _ => return "?\n".to_string(),
        };
        let (op, arg) = match line.get(1..3) {
            Some(op) => (op, line[3..].trim()),
            None => return "?\n".to_string(),
        };

        let settings = self.channel_mut(channel);
        match op {
            "pd" | "pw" => {
                let kind = if op == "pd" {
                    AdjustmentKind::Delay
                } else {
                    AdjustmentKind::Width
                };
                match arg.parse::<f64>() {
                    Ok(value) if kind.contains(value) => {
                        match kind {
                            AdjustmentKind::Delay => settings.delay = value,
                            AdjustmentKind::Width => settings.width = value,
                        }
                        "ok\n".to_string()
                    }
                    _ => "error\n".to_string(),
                }
            }
            "pf" => {
                settings.mode = TriggerMode::First;
                "ok\n".to_string()
            }
            "pl" => {
                settings.mode = TriggerMode::Last;
                "ok\n".to_string()
            }
            "en" => {
                settings.output = OutputControl::Enable;
                "ok\n".to_string()
            }
            "di" => {
                settings.output = OutputControl::Disable;
                "ok\n".to_string()
            }
            _ => "?\n".to_string(),
        }
    }
}

fn channel_index(channel: Channel) -> usize {
    match channel {
        Channel::A => 0,
        Channel::B => 1,
    }
}

/// Simulated instrument shared between a test and the streams it serves
#[derive(Clone, Default)]
pub struct MockDevice {
    state: ThreadSafe<MockState>,
}

impl MockDevice {
    /// Create a device with default settings on both channels.
    pub fn new() -> Self {
        Self {
            state: thread_safe(MockState::default()),
        }
    }

    /// A connector whose streams talk to this device.
    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(MockConnector {
            device: self.clone(),
        })
    }

    /// Queue a raw reply for the next command line, overriding simulation.
    ///
    /// Include the terminator yourself; omit it to simulate a cut-off reply.
    pub fn script_reply(&self, reply: &str) {
        self.state.lock().scripted.push_back(reply.as_bytes().to_vec());
    }

    /// Queue raw reply bytes, which need not be valid text.
    pub fn script_reply_bytes(&self, reply: &[u8]) {
        self.state.lock().scripted.push_back(reply.to_vec());
    }

    /// Stop answering commands.
    pub fn set_silent(&self, silent: bool) {
        self.state.lock().silent = silent;
    }

    /// Make new connection attempts fail.
    pub fn set_refuse_connections(&self, refuse: bool) {
        self.state.lock().refuse_connections = refuse;
    }

    /// Make writes on open streams fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Close the device side of the connection.
    pub fn hang_up(&self) {
        let mut state = self.state.lock();
        state.peer_closed = true;
        state.outgoing.clear();
    }

    /// Close the device side right after answering the next command.
    ///
    /// The reply stays readable; the read after it sees end of stream.
    pub fn hang_up_after_reply(&self) {
        self.state.lock().hang_up_after_reply = true;
    }

    /// Preset a channel value without going through the wire.
    pub fn preset(&self, channel: Channel, kind: AdjustmentKind, micros: f64) {
        let mut state = self.state.lock();
        let settings = state.channel_mut(channel);
        match kind {
            AdjustmentKind::Delay => settings.delay = micros,
            AdjustmentKind::Width => settings.width = micros,
        }
    }

    /// Every byte written so far, concatenated.
    pub fn written(&self) -> String {
        self.state.lock().writes.concat()
    }

    /// Each write call's payload, in order.
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().writes.clone()
    }

    /// Forget recorded writes.
    pub fn clear_written(&self) {
        self.state.lock().writes.clear();
    }

    /// Number of successful opens.
    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Current delay of a channel in microseconds.
    pub fn delay(&self, channel: Channel) -> f64 {
        self.state.lock().channel(channel).delay
    }

    /// Current width of a channel in microseconds.
    pub fn width(&self, channel: Channel) -> f64 {
        self.state.lock().channel(channel).width
    }

    /// Current trigger mode of a channel.
    pub fn trigger_mode(&self, channel: Channel) -> TriggerMode {
        self.state.lock().channel(channel).mode
    }

    /// Current output state of a channel.
    pub fn output(&self, channel: Channel) -> OutputControl {
        self.state.lock().channel(channel).output
    }
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockDevice")
            .field("open", &state.open)
            .field("writes", &state.writes.len())
            .finish()
    }
}

/// Opens streams to a [`MockDevice`]
pub struct MockConnector {
    device: MockDevice,
}

impl Connector for MockConnector {
    fn open(&self, host: &str, port: u16, _timeout: Duration) -> Result<Box<dyn DeviceStream>> {
        if host.is_empty() {
            return Err(ConnectionError::EmptyHost.into());
        }

        let mut state = self.device.state.lock();
        if state.refuse_connections {
            return Err(ConnectionError::FailedToOpen {
                address: format!("{}:{}", host, port),
                reason: "connection refused".to_string(),
            }
            .into());
        }

        state.open = true;
        state.open_count += 1;
        state.peer_closed = false;
        state.outgoing.clear();
        state.line_buffer.clear();

        Ok(Box::new(MockStream {
            device: self.device.clone(),
            peer: format!("{}:{}", host, port),
        }))
    }
}

struct MockStream {
    device: MockDevice,
    peer: String,
}

impl DeviceStream for MockStream {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.device.state.lock();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated write failure"));
        }
        state.writes.push(String::from_utf8_lossy(data).into_owned());
        state.receive(data);
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        let mut state = self.device.state.lock();
        if state.outgoing.is_empty() {
            if state.peer_closed {
                return Ok(0);
            }
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
        }

        let n = buf.len().min(state.outgoing.len());
        for (slot, byte) in buf.iter_mut().zip(state.outgoing.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn close(&mut self) -> io::Result<()> {
        self.device.state.lock().open = false;
        Ok(())
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}
