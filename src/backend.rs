//! Backend capability contracts.
//!
//! Core widgets never talk to a concrete toolkit. Each widget family is
//! written against one of the traits below, and a [`BackendFactory`]
//! supplies implementations keyed by [`WidgetKind`]. A toolkit adapter that
//! implements these traits gets the whole widget layer for free; the mock
//! backend in [`crate::testing`] is one such adapter.
//!
//! Two rules bind every implementation:
//!
//! 1. Programmatic setters must behave exactly like user input, except that
//!    the widget layer decides whether a change notification fires.
//! 2. A backend that echoes a programmatic set back through its change
//!    callback must tolerate the widget layer ignoring the echo.

use std::any::Any;
use std::rc::Rc;

use crate::options::{Orientation, WidgetKind};
use crate::value::Value;

/// Errors a factory can raise while instantiating a backend control.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend {backend:?} does not support widget kind {kind}")]
    UnsupportedKind { backend: String, kind: WidgetKind },
    #[error("backend construction failed: {0}")]
    Construction(String),
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Base contract every backend control satisfies: visibility, enablement,
/// label and tooltip, and an escape hatch to the native object.
pub trait WidgetBackend {
    fn set_visible(&self, visible: bool);
    fn is_visible(&self) -> bool;

    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;

    fn set_label(&self, label: &str);
    fn label(&self) -> String;

    fn set_tooltip(&self, tooltip: &str);
    fn tooltip(&self) -> String;

    /// The underlying toolkit object, for downcasting in adapter-specific
    /// code. Core widgets never inspect it.
    fn native(&self) -> Rc<dyn Any>;
}

/// A control that holds a single value.
pub trait ValueBackend: WidgetBackend {
    fn value(&self) -> Value;
    fn set_value(&self, value: &Value);

    /// Install the change callback. Called once, at widget construction;
    /// the backend must invoke it on every user edit.
    fn on_change(&self, callback: Box<dyn FnMut(&Value)>);
}

/// A value control with numeric bounds and a step increment.
pub trait RangedBackend: ValueBackend {
    fn set_minimum(&self, min: f64);
    fn minimum(&self) -> f64;

    fn set_maximum(&self, max: f64);
    fn maximum(&self) -> f64;

    fn set_step(&self, step: f64);
    fn step(&self) -> f64;
}

/// A ranged control rendered as a slider.
pub trait SliderBackend: RangedBackend {
    fn set_orientation(&self, orientation: Orientation);
    fn orientation(&self) -> Orientation;

    /// Show or hide the numeric readout next to the slider track.
    fn set_readout_visible(&self, visible: bool);
    fn readout_visible(&self) -> bool;
}

/// A clickable control: push buttons and checkboxes.
pub trait ButtonBackend: WidgetBackend {
    fn set_text(&self, text: &str);
    fn text(&self) -> String;

    fn set_checked(&self, checked: bool);
    fn is_checked(&self) -> bool;

    /// Install the click callback, invoked with the post-click checked
    /// state. Called once, at widget construction.
    fn on_click(&self, callback: Box<dyn FnMut(bool)>);
}

/// A control presenting a closed set of choices.
///
/// The backend stores `(name, value)` pairs and a current index; choice
/// identity and selection-preservation policy live in the widget layer.
pub trait CategoricalBackend: WidgetBackend {
    /// Replace the full choice list, preserving the given pair order.
    fn set_choices(&self, choices: &[(String, Value)]);
    fn choices(&self) -> Vec<(String, Value)>;

    fn set_current_index(&self, index: Option<usize>);
    fn current_index(&self) -> Option<usize>;

    /// Install the selection-change callback. Called once, at widget
    /// construction; invoked with the newly selected choice's value on user
    /// selection, or `Value::Null` when the selection is cleared.
    fn on_selection(&self, callback: Box<dyn FnMut(&Value)>);
}

/// A control that hosts child controls in order.
pub trait ContainerBackend: WidgetBackend {
    /// Insert a child's native object at `index`.
    fn insert_child(&self, index: usize, child: Rc<dyn Any>);
    fn remove_child(&self, index: usize);
    fn child_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// BackendHandle / BackendFactory
// ---------------------------------------------------------------------------

/// A freshly created backend control, tagged with the capability contract
/// it satisfies. The widget layer matches on the variant it needs and
/// treats a mismatch as a creation error.
pub enum BackendHandle {
    Value(Box<dyn ValueBackend>),
    Ranged(Box<dyn RangedBackend>),
    Slider(Box<dyn SliderBackend>),
    Button(Box<dyn ButtonBackend>),
    Categorical(Box<dyn CategoricalBackend>),
    Container(Box<dyn ContainerBackend>),
}

impl BackendHandle {
    /// Name of the contract this handle carries, for error messages.
    pub fn contract_name(&self) -> &'static str {
        match self {
            BackendHandle::Value(_) => "Value",
            BackendHandle::Ranged(_) => "Ranged",
            BackendHandle::Slider(_) => "Slider",
            BackendHandle::Button(_) => "Button",
            BackendHandle::Categorical(_) => "Categorical",
            BackendHandle::Container(_) => "Container",
        }
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BackendHandle::{}(..)", self.contract_name())
    }
}

/// Instantiates backend controls for widget kinds.
///
/// Factories are cheap, cloneable handles (`Rc<dyn BackendFactory>`);
/// composite editors keep one around to build element widgets on demand.
pub trait BackendFactory {
    /// A short identifier for error messages.
    fn name(&self) -> &str;

    /// Create a control for `kind`. The returned handle's contract must
    /// match the kind's family.
    fn create(&self, kind: WidgetKind) -> Result<BackendHandle, BackendError>;
}
