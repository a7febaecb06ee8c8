//! # autoform
//!
//! Build GUIs from function signatures, independent of any GUI toolkit.
//!
//! autoform maps typed values and annotations to widgets through a scopable
//! type registry, wraps toolkit controls behind small capability contracts,
//! and binds a callable's parameter list to a container of live widgets.
//! Inspired by Python's [magicgui](https://pyapp-kit.github.io/magicgui/),
//! but designed as a Rust-native system with reified annotations, explicit
//! error types, and signal-based change notification.
//!
//! ## Core Systems
//!
//! - **[`value`]** — The runtime [`Value`](value::Value) model and literal evaluation
//! - **[`types`]** — Reified annotations ([`TypeKey`](types::TypeKey)) and namespaces
//! - **[`options`]** — Widget descriptors, constructor options, option merging
//! - **[`registry`]** — Process-wide type-to-widget rules with scoped overrides
//! - **[`resolve`]** — The resolution algorithm: `(value, annotation, overrides)` to descriptor
//! - **[`backend`]** — Capability contracts a toolkit adapter implements
//! - **[`widget`]** — The backend-independent widget node and shared state
//! - **[`widgets`]** — Concrete widgets: value, ranged, button, categorical, composite
//! - **[`function_gui`]** — Signature-bound GUIs with live defaults and auto-call
//! - **[`reactive`]** — Reentrancy-safe signals with connection blocking
//! - **[`testing`]** — A complete in-memory backend for headless tests

// Foundation
pub mod options;
pub mod types;
pub mod value;

// Resolution
pub mod registry;
pub mod resolve;

// Widget system
pub mod backend;
pub mod widget;
pub mod widgets;

// Signatures
pub mod function_gui;

// Reactivity
pub mod reactive;

// Headless backend
pub mod testing;

pub use backend::{BackendError, BackendFactory, BackendHandle};
pub use function_gui::{
    CallArguments, CallError, FunctionGui, FunctionGuiError, FunctionGuiOptions, Parameter,
    Signature,
};
pub use options::{
    Binding, ChoicesSource, Orientation, RangePolicy, WidgetDescriptor, WidgetKind,
    WidgetOptions, WidgetRef,
};
pub use registry::{Registry, RegistryRule, RegistryScope};
pub use resolve::{resolve, ResolveRequest, TypeResolutionError};
pub use types::{Namespace, TypeKey, TypeName};
pub use value::Value;
pub use widget::{ValueError, Widget};
pub use widgets::{create_widget, Container, WidgetCreationError};
