//! Headless testing support.
//!
//! A complete in-memory backend (no toolkit, no event loop) so the widget
//! layer, resolver, and `FunctionGui` can be exercised end to end. User
//! interaction is simulated by driving the mock controls directly.

pub mod mock;

pub use mock::{MockControl, MockFactory};
