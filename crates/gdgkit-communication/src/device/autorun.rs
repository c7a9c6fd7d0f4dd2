//! Delay sweep
//!
//! Starting from the channel's current delay, autorun applies
//! `start + n * step` once per autorun interval. Step `n` is due `n - 1`
//! intervals after the sweep starts. A step only runs if its command can
//! settle before `duration` has elapsed, so the sweep never outlasts it.
//! The sweep also stops when the next value would leave the delay range or
//! a step fails. The caller is blocked for the whole sweep.

use crate::device::client::DeviceClient;
use gdgkit_core::{validate_channel, AdjustmentKind, Error, StateError};
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutorunSummary {
    /// Steps the device accepted
    pub steps_applied: u64,
    /// Last delay applied, in microseconds
    pub last_value: Option<f64>,
}

/// Time budget of a sweep
///
/// A duration too long to represent as an instant means no deadline.
#[derive(Debug, Clone, Copy)]
pub struct SweepClock {
    started: Instant,
    deadline: Option<Instant>,
    interval: Duration,
}

impl SweepClock {
    /// Start the clock now.
    pub fn start(duration: Duration, interval: Duration) -> Self {
        Self::starting_at(Instant::now(), duration, interval)
    }

    /// Start the clock at `started`.
    pub fn starting_at(started: Instant, duration: Duration, interval: Duration) -> Self {
        Self {
            started,
            deadline: started.checked_add(duration),
            interval,
        }
    }

    /// When step `index` (1-based) is due, or `None` if it is beyond any
    /// representable time.
    pub fn due(&self, index: u64) -> Option<Instant> {
        let offset = u32::try_from(index.saturating_sub(1))
            .ok()
            .and_then(|n| self.interval.checked_mul(n))?;
        self.started.checked_add(offset)
    }

    /// Whether work starting at `at` and taking `busy` ends by the deadline.
    pub fn allows(&self, at: Instant, busy: Duration) -> bool {
        match (self.deadline, at.checked_add(busy)) {
            (None, _) => true,
            (Some(deadline), Some(end)) => end <= deadline,
            (Some(_), None) => false,
        }
    }
}

/// Delay after `index` steps, rounded to the device's 0.1 us resolution.
pub fn step_value(start: f64, step: f64, index: u64) -> f64 {
    ((start + step * index as f64) * 10.0).round() / 10.0
}

/// Render a delay with one decimal, the device's resolution.
pub fn format_micros(value: f64) -> String {
    format!("{:.1}", value)
}

impl DeviceClient {
    /// Sweep a channel's delay by `step_us` microseconds per interval for `duration`.
    ///
    /// A negative step sweeps downwards.
    pub fn autorun(&mut self, channel: &str, step_us: f64, duration: Duration) -> AutorunSummary {
        let clock = SweepClock::start(duration, self.config.autorun_interval);
        let mut summary = AutorunSummary::default();

        let ch = match validate_channel(channel) {
            Ok(ch) => ch,
            Err(e) => {
                self.report(e.into());
                return summary;
            }
        };
        if !step_us.is_finite() || step_us == 0.0 {
            self.report(Error::other(format!("Error autorun step value: {}", step_us)));
            return summary;
        }
        if !self.is_connected() {
            self.report(StateError::NotConnected.into());
            return summary;
        }

        let snapshot = self.read_settings();
        if snapshot.is_empty() {
            return summary;
        }
        let start = match snapshot.delay(ch).and_then(|raw| raw.parse::<f64>().ok()) {
            Some(start) => start,
            None => {
                self.report(Error::other(format!(
                    "Cannot read channel ({}) delay from '{}'",
                    ch, snapshot
                )));
                return summary;
            }
        };

        let interval = self.config.autorun_interval;
        let settle = self.config.timing.command_settle;
        self.log.info(format!(
            "Autorun channel ({}) from {} us, step {} us every {:?} for {:?}",
            ch,
            format_micros(start),
            step_us,
            interval,
            duration
        ));

        let mut index = 1;
        loop {
            if !clock.allows(Instant::now(), settle) {
                break;
            }

            let value = step_value(start, step_us, index);
            if !AdjustmentKind::Delay.contains(value) {
                self.log.info(format!(
                    "Autorun channel ({}) stopped: {} us is outside the delay range",
                    ch,
                    format_micros(value)
                ));
                break;
            }

            if !self.set_adjustment(channel, AdjustmentKind::Delay, &format_micros(value)) {
                break;
            }
            summary.steps_applied += 1;
            summary.last_value = Some(value);

            index += 1;
            match clock.due(index) {
                Some(next) if clock.allows(next, settle) => {
                    thread::sleep(next.saturating_duration_since(Instant::now()));
                }
                _ => break,
            }
        }

        self.log.info(format!(
            "Autorun channel ({}) finished after {} steps",
            ch, summary.steps_applied
        ));
        summary
    }
}
