//! Command encoder
//!
//! Maps validated control intents to the device's ASCII command lines.
//! Every line is a channel letter, a two letter opcode, an optional value
//! and a single `\n`. Numeric values are emitted exactly as the caller
//! typed them.

use gdgkit_core::{AdjustmentKind, Channel, NumericValue, OutputControl, TriggerMode};

/// Terminator of both command lines and device replies
pub const TERMINATOR: u8 = b'\n';

/// A control intent ready for the wire
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Report delay and width of both channels
    ReadAll,
    /// Set a channel's delay or width
    Adjust {
        /// Target channel
        channel: Channel,
        /// Validated value; carries its own kind
        value: NumericValue,
    },
    /// Select a channel's trigger mode
    Trigger {
        /// Target channel
        channel: Channel,
        /// Mode to select
        mode: TriggerMode,
    },
    /// Gate a channel's output
    Output {
        /// Target channel
        channel: Channel,
        /// Enable or disable
        control: OutputControl,
    },
}

impl DeviceCommand {
    /// Render the command line, terminator included.
    pub fn encode(&self) -> String {
        match self {
            DeviceCommand::ReadAll => encode_read(),
            DeviceCommand::Adjust { channel, value } => match value.kind() {
                AdjustmentKind::Delay => encode_delay(*channel, value),
                AdjustmentKind::Width => encode_width(*channel, value),
            },
            DeviceCommand::Trigger { channel, mode } => encode_trigger(*channel, *mode),
            DeviceCommand::Output { channel, control } => encode_control(*channel, *control),
        }
    }
}

/// `ral`
pub fn encode_read() -> String {
    "ral\n".to_string()
}

/// `{ch}pd {value}`
pub fn encode_delay(channel: Channel, value: &NumericValue) -> String {
    format!("{}pd {}\n", channel.letter(), value.as_str())
}

/// `{ch}pw {value}`
pub fn encode_width(channel: Channel, value: &NumericValue) -> String {
    format!("{}pw {}\n", channel.letter(), value.as_str())
}

/// `{ch}pf` or `{ch}pl`
pub fn encode_trigger(channel: Channel, mode: TriggerMode) -> String {
    let op = match mode {
        TriggerMode::First => "pf",
        TriggerMode::Last => "pl",
    };
    format!("{}{}\n", channel.letter(), op)
}

/// `{ch}en` or `{ch}di`
pub fn encode_control(channel: Channel, control: OutputControl) -> String {
    let op = match control {
        OutputControl::Enable => "en",
        OutputControl::Disable => "di",
    };
    format!("{}{}\n", channel.letter(), op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdgkit_core::validate_numeric;

    #[test]
    fn test_read() {
        assert_eq!(DeviceCommand::ReadAll.encode(), "ral\n");
    }

    #[test]
    fn test_adjust_keeps_value_text() {
        let value = validate_numeric(AdjustmentKind::Delay, "888888").unwrap();
        assert_eq!(encode_delay(Channel::A, &value), "apd 888888\n");

        let value = validate_numeric(AdjustmentKind::Width, "0002.10").unwrap();
        let command = DeviceCommand::Adjust {
            channel: Channel::B,
            value,
        };
        assert_eq!(command.encode(), "bpw 0002.10\n");
    }

    #[test]
    fn test_trigger_and_output() {
        assert_eq!(encode_trigger(Channel::A, TriggerMode::First), "apf\n");
        assert_eq!(encode_trigger(Channel::B, TriggerMode::Last), "bpl\n");
        assert_eq!(encode_control(Channel::A, OutputControl::Enable), "aen\n");
        assert_eq!(encode_control(Channel::B, OutputControl::Disable), "bdi\n");
    }

    #[test]
    fn test_single_terminator() {
        let lines = [
            encode_read(),
            encode_trigger(Channel::A, TriggerMode::Last),
            encode_control(Channel::B, OutputControl::Enable),
        ];
        for line in lines {
            assert_eq!(line.matches('\n').count(), 1);
            assert!(line.ends_with('\n'));
        }
    }
}
