//! Synchronous signal/slot notification.
//!
//! Change propagation between widgets and listeners is a plain signal/slot
//! mechanism: no auto-tracking, no scheduler — emission runs slots in
//! connection order, on the caller's stack.
//!
//! - [`Signal`] — a cloneable emitter handle with connect/disconnect.
//! - [`SignalBlocker`] — scoped suppression of emission.

pub mod signal;

pub use signal::{ConnectionId, Signal, SignalBlocker};
