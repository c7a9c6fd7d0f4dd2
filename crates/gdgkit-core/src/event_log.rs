//! Log event bridge
//!
//! Decouples events produced inside blocking device calls from the
//! presentation loop that displays them. Producers hold a cloneable
//! [`LogSink`]; exactly one [`LogReceiver`] exists per bridge and polls it
//! without blocking.
//!
//! The queue is unbounded, so emitting never waits on a slow or absent
//! consumer. Events come out in the order they went in.
//!
//! ```rust,ignore
//! let (sink, mut receiver) = log_bridge(LogLevel::Info);
//! sink.info("connected to host: gdg3, port: 10001");
//!
//! // On the UI timer, every 100 ms:
//! for event in receiver.drain() {
//!     println!("{event}");
//! }
//! ```

use crate::types::{thread_safe_deque, ThreadSafeDeque};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout used when rendering events.
pub const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S %p";

/// Event severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Wire level detail
    Debug,
    /// Normal operation
    #[default]
    Info,
    /// A failed operation
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A single timestamped log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Local time the event was emitted
    pub timestamp: DateTime<Local>,
    /// Severity
    pub level: LogLevel,
    /// Human readable text
    pub message: String,
}

impl LogEvent {
    /// Create an event stamped with the current time.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    /// Check whether this is an error event.
    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.timestamp.format(DATE_FORMAT),
            self.level,
            self.message
        )
    }
}

/// Create a connected producer/consumer pair.
///
/// Events below `min_level` are dropped at emit time.
pub fn log_bridge(min_level: LogLevel) -> (LogSink, LogReceiver) {
    let queue = thread_safe_deque();
    (
        LogSink {
            queue: queue.clone(),
            min_level,
        },
        LogReceiver { queue },
    )
}

/// Producer side of the bridge.
///
/// Cheap to clone; every component that reports events holds one.
#[derive(Clone)]
pub struct LogSink {
    queue: ThreadSafeDeque<LogEvent>,
    min_level: LogLevel,
}

impl LogSink {
    /// Enqueue an event. Never blocks on the consumer and never fails.
    ///
    /// The event is also forwarded to `tracing` regardless of `min_level`.
    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!(target: "gdgkit::device", "{}", message),
            LogLevel::Info => tracing::info!(target: "gdgkit::device", "{}", message),
            LogLevel::Error => tracing::error!(target: "gdgkit::device", "{}", message),
        }

        if level < self.min_level {
            return;
        }
        self.queue.lock().push_back(LogEvent::new(level, message));
    }

    /// Emit a debug event.
    pub fn debug(&self, message: impl Into<String>) {
        self.emit(LogLevel::Debug, message);
    }

    /// Emit an info event.
    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    /// Emit an error event.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }

    /// Lowest severity that reaches the queue.
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

/// Consumer side of the bridge.
///
/// Not cloneable: each event is delivered to exactly one consumer.
pub struct LogReceiver {
    queue: ThreadSafeDeque<LogEvent>,
}

impl LogReceiver {
    /// Remove and return the oldest event, or `None` if nothing is queued.
    pub fn try_recv(&mut self) -> Option<LogEvent> {
        self.queue.lock().pop_front()
    }

    /// Remove and return every event currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        self.queue.lock().drain(..).collect()
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Check whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl fmt::Debug for LogReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogReceiver")
            .field("pending", &self.len())
            .finish()
    }
}
