//! Device data model
//!
//! Channel and setting identifiers, validated numeric values, the
//! connection state and the raw settings snapshot returned by the device.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound shared by delay and width, in microseconds.
pub const MIN_VALUE_US: f64 = 0.1;

/// Upper bound for a channel delay, in microseconds.
pub const MAX_DELAY_US: f64 = 15_999_999.9;

/// Upper bound for a channel pulse width, in microseconds.
pub const MAX_WIDTH_US: f64 = 9_999_999.9;

/// One of the two independent output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Output A
    A,
    /// Output B
    B,
}

impl Channel {
    /// Lowercase letter used as the command prefix.
    pub fn letter(self) -> char {
        match self {
            Channel::A => 'a',
            Channel::B => 'b',
        }
    }

    /// Both channels, in device order.
    pub fn all() -> [Channel; 2] {
        [Channel::A, Channel::B]
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "A"),
            Channel::B => write!(f, "B"),
        }
    }
}

/// Physical quantity a numeric command sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// Delay from trigger to pulse
    Delay,
    /// Pulse width
    Width,
}

impl AdjustmentKind {
    /// Inclusive legal range in microseconds.
    pub fn range(self) -> (f64, f64) {
        match self {
            AdjustmentKind::Delay => (MIN_VALUE_US, MAX_DELAY_US),
            AdjustmentKind::Width => (MIN_VALUE_US, MAX_WIDTH_US),
        }
    }

    /// Check whether `value` lies inside the legal range.
    pub fn contains(self, value: f64) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&value)
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustmentKind::Delay => write!(f, "delay"),
            AdjustmentKind::Width => write!(f, "width"),
        }
    }
}

/// Trigger handling while a delay is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Ignore later trigger pulses during the delay window
    First,
    /// Ignore the first trigger pulse, restart on the last
    Last,
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerMode::First => write!(f, "first"),
            TriggerMode::Last => write!(f, "last"),
        }
    }
}

/// Output gate of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputControl {
    /// Output active
    Enable,
    /// Output suppressed
    Disable,
}

impl fmt::Display for OutputControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputControl::Enable => write!(f, "enable"),
            OutputControl::Disable => write!(f, "disable"),
        }
    }
}

/// A range-checked delay or width value.
///
/// Keeps the caller's text so the encoder can emit it without reformatting.
/// Only the validator constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericValue {
    kind: AdjustmentKind,
    text: String,
    micros: f64,
}

impl NumericValue {
    pub(crate) fn new(kind: AdjustmentKind, text: String, micros: f64) -> Self {
        Self { kind, text, micros }
    }

    /// Quantity this value was validated for.
    pub fn kind(&self) -> AdjustmentKind {
        self.kind
    }

    /// The caller's decimal representation, trimmed.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Parsed value in microseconds.
    pub fn micros(&self) -> f64 {
        self.micros
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport open
    #[default]
    Disconnected,
    /// Transport open and settled
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// Reply to a read-all query, relayed verbatim.
///
/// The device reports `delay_A, width_A, delay_B, width_B`. The text is not
/// validated; [`SettingsSnapshot::fields`] only splits it for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    raw: String,
}

impl SettingsSnapshot {
    /// Wrap a device reply.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Snapshot returned when the read failed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The reply text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True when the device returned nothing or the read failed.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Split into `[delay_A, width_A, delay_B, width_B]`.
    ///
    /// Returns `None` unless the reply holds exactly four comma separated fields.
    pub fn fields(&self) -> Option<[&str; 4]> {
        let mut parts = self.raw.split(',').map(str::trim);
        let fields = [parts.next()?, parts.next()?, parts.next()?, parts.next()?];
        if parts.next().is_some() {
            return None;
        }
        Some(fields)
    }

    /// Raw delay field for a channel.
    pub fn delay(&self, channel: Channel) -> Option<&str> {
        let fields = self.fields()?;
        Some(match channel {
            Channel::A => fields[0],
            Channel::B => fields[2],
        })
    }

    /// Raw width field for a channel.
    pub fn width(&self, channel: Channel) -> Option<&str> {
        let fields = self.fields()?;
        Some(match channel {
            Channel::A => fields[1],
            Channel::B => fields[3],
        })
    }
}

impl fmt::Display for SettingsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
