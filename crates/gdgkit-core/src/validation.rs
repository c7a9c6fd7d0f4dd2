//! Value validation
//!
//! Pure functions that turn caller text into typed device parameters.
//! Textual identifiers are matched case-insensitively; numbers fail closed
//! and are never clamped into range.

use crate::data::{AdjustmentKind, Channel, NumericValue, OutputControl, TriggerMode};
use crate::error::ValidationError;

/// Parse a channel identifier: `a` or `b`.
pub fn validate_channel(raw: &str) -> Result<Channel, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "a" => Ok(Channel::A),
        "b" => Ok(Channel::B),
        _ => Err(ValidationError::InvalidChannel {
            value: raw.to_string(),
        }),
    }
}

/// Parse an adjustment kind: `delay`/`d` or `width`/`w`.
pub fn validate_kind(raw: &str) -> Result<AdjustmentKind, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "delay" | "d" => Ok(AdjustmentKind::Delay),
        "width" | "w" => Ok(AdjustmentKind::Width),
        _ => Err(ValidationError::InvalidAdjustment {
            value: raw.to_string(),
        }),
    }
}

/// Parse a trigger mode: `first`/`f` or `last`/`l`.
pub fn validate_mode(raw: &str) -> Result<TriggerMode, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "first" | "f" => Ok(TriggerMode::First),
        "last" | "l" => Ok(TriggerMode::Last),
        _ => Err(ValidationError::InvalidTriggerMode {
            value: raw.to_string(),
        }),
    }
}

/// Parse an output control: `enable`/`en` or `disable`/`di`.
pub fn validate_control(raw: &str) -> Result<OutputControl, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "enable" | "en" => Ok(OutputControl::Enable),
        "disable" | "di" => Ok(OutputControl::Disable),
        _ => Err(ValidationError::InvalidOutputControl {
            value: raw.to_string(),
        }),
    }
}

/// Parse and range check a delay or width in microseconds.
///
/// Only plain decimal notation is accepted (`12`, `2.1`, `.5`). Signs,
/// exponents and special values are rejected.
pub fn validate_numeric(kind: AdjustmentKind, raw: &str) -> Result<NumericValue, ValidationError> {
    let text = raw.trim();
    let not_a_number = || ValidationError::NotANumber {
        kind,
        value: raw.to_string(),
    };

    if !is_plain_decimal(text) {
        return Err(not_a_number());
    }

    let micros: f64 = text.parse().map_err(|_| not_a_number())?;
    if !micros.is_finite() {
        return Err(not_a_number());
    }

    if !kind.contains(micros) {
        let (min, max) = kind.range();
        return Err(ValidationError::OutOfRange {
            kind,
            value: raw.to_string(),
            min,
            max,
        });
    }

    Ok(NumericValue::new(kind, text.to_string(), micros))
}

/// Digits with at most one decimal point and at least one digit.
fn is_plain_decimal(text: &str) -> bool {
    let mut digits = 0;
    let mut points = 0;
    for c in text.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_case_insensitive() {
        assert_eq!(validate_channel("a"), Ok(Channel::A));
        assert_eq!(validate_channel("A"), Ok(Channel::A));
        assert_eq!(validate_channel(" b "), Ok(Channel::B));
        assert!(validate_channel("c").is_err());
        assert!(validate_channel("").is_err());
    }

    #[test]
    fn test_mode_aliases() {
        assert_eq!(validate_mode("first"), Ok(TriggerMode::First));
        assert_eq!(validate_mode("F"), Ok(TriggerMode::First));
        assert_eq!(validate_mode("Last"), Ok(TriggerMode::Last));
        assert_eq!(validate_mode("l"), Ok(TriggerMode::Last));
        assert!(validate_mode("middle").is_err());
    }

    #[test]
    fn test_control_aliases() {
        assert_eq!(validate_control("ENABLE"), Ok(OutputControl::Enable));
        assert_eq!(validate_control("en"), Ok(OutputControl::Enable));
        assert_eq!(validate_control("disable"), Ok(OutputControl::Disable));
        assert_eq!(validate_control("Di"), Ok(OutputControl::Disable));
        assert!(validate_control("on").is_err());
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(validate_kind("delay"), Ok(AdjustmentKind::Delay));
        assert_eq!(validate_kind("W"), Ok(AdjustmentKind::Width));
        assert!(validate_kind("height").is_err());
    }

    #[test]
    fn test_delay_boundaries() {
        assert!(validate_numeric(AdjustmentKind::Delay, "0.1").is_ok());
        assert!(validate_numeric(AdjustmentKind::Delay, "15999999.9").is_ok());
        assert!(matches!(
            validate_numeric(AdjustmentKind::Delay, "0.09"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_numeric(AdjustmentKind::Delay, "16000000.0"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_width_boundaries() {
        assert!(validate_numeric(AdjustmentKind::Width, "0.1").is_ok());
        assert!(validate_numeric(AdjustmentKind::Width, "9999999.9").is_ok());
        assert!(validate_numeric(AdjustmentKind::Width, "10000000.0").is_err());
    }

    #[test]
    fn test_numeric_keeps_caller_text() {
        let value = validate_numeric(AdjustmentKind::Delay, " 0000500.0 ").unwrap();
        assert_eq!(value.as_str(), "0000500.0");
        assert_eq!(value.micros(), 500.0);
        assert_eq!(value.kind(), AdjustmentKind::Delay);
    }

    #[test]
    fn test_numeric_fails_closed() {
        for raw in ["", "abc", "1e3", "-5", "+5", "NaN", "inf", "1.2.3", ".", "12 us"] {
            assert!(
                matches!(
                    validate_numeric(AdjustmentKind::Delay, raw),
                    Err(ValidationError::NotANumber { .. })
                ),
                "{raw:?} should be rejected"
            );
        }
    }
}
