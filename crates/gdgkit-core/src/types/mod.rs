//! Type system utilities and aliases.
//!
//! - [`aliases`]: Type aliases for `Arc<Mutex<T>>` shapes shared across threads.

pub mod aliases;

pub use aliases::*;
