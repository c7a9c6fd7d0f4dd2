//! Type aliases for commonly used shared types.
//!
//! Gives meaningful names to the lock-wrapped containers passed between the
//! protocol call path and the presentation thread.
//!
//! ```rust,ignore
//! use gdgkit_core::types::*;
//!
//! // Instead of: Arc<Mutex<VecDeque<String>>>
//! let queue: ThreadSafeDeque<String> = thread_safe_deque();
//! ```

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex`; the lock never poisons.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe deque for cross-thread queue/buffer management.
pub type ThreadSafeDeque<T> = Arc<Mutex<VecDeque<T>>>;

/// Create a new [`ThreadSafe`] value.
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create an empty [`ThreadSafeDeque`].
pub fn thread_safe_deque<T>() -> ThreadSafeDeque<T> {
    Arc::new(Mutex::new(VecDeque::new()))
}
