//! The runtime widget node.
//!
//! A [`Widget`] is one interactive element, backend-independent: it owns a
//! name, an annotation, label/tooltip/visibility state, and exactly one
//! boxed backend object (via [`WidgetBase`]). The enum variants are the
//! capability families; family-specific operations live on the concrete
//! types in [`crate::widgets`], while everything shared dispatches here.

pub mod base;

pub use base::{UpdateGuard, WidgetBase};

use std::any::Any;
use std::rc::Rc;

use crate::options::WidgetKind;
use crate::types::TypeKey;
use crate::value::{EvaluationError, Value};
use crate::widgets::{
    ButtonWidget, CategoricalWidget, Container, ListEdit, RangedWidget, SliderWidget, TupleEdit,
    ValueWidget,
};

/// A runtime value violates a widget's declared constraint.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("value {value} is outside the range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
    #[error("{value:?} is not among the current choices")]
    InvalidChoice { value: Value },
    #[error("expected a {expected} value, got {got}")]
    WrongType {
        expected: &'static str,
        got: &'static str,
    },
    #[error("expected {expected} elements, got {got}")]
    WrongArity { expected: usize, got: usize },
    #[error("failed to build element widget: {0}")]
    ElementCreation(String),
    #[error("widget {0:?} does not hold a value")]
    NotAValue(String),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// A widget node, tagged by capability family.
pub enum Widget {
    Value(ValueWidget),
    Ranged(RangedWidget),
    Slider(SliderWidget),
    Button(ButtonWidget),
    Categorical(CategoricalWidget),
    List(ListEdit),
    Tuple(TupleEdit),
    Container(Container),
}

/// Dispatch an expression over every variant's concrete widget.
macro_rules! each {
    ($self:expr, $w:ident => $body:expr) => {
        match $self {
            Widget::Value($w) => $body,
            Widget::Ranged($w) => $body,
            Widget::Slider($w) => $body,
            Widget::Button($w) => $body,
            Widget::Categorical($w) => $body,
            Widget::List($w) => $body,
            Widget::Tuple($w) => $body,
            Widget::Container($w) => $body,
        }
    };
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        each!(self, w => w.kind())
    }

    pub fn name(&self) -> String {
        each!(self, w => w.base().name())
    }

    pub fn set_name(&self, name: &str) {
        each!(self, w => w.base().set_name(name));
    }

    pub fn label(&self) -> String {
        each!(self, w => w.base().label())
    }

    pub fn set_label(&self, label: &str) {
        each!(self, w => w.base().set_label(label));
    }

    pub fn tooltip(&self) -> String {
        each!(self, w => w.base().tooltip())
    }

    pub fn set_tooltip(&self, tooltip: &str) {
        each!(self, w => w.base().set_tooltip(tooltip));
    }

    pub fn visible(&self) -> bool {
        each!(self, w => w.base().visible())
    }

    pub fn set_visible(&self, visible: bool) {
        each!(self, w => w.base().set_visible(visible));
    }

    pub fn enabled(&self) -> bool {
        each!(self, w => w.base().enabled())
    }

    pub fn set_enabled(&self, enabled: bool) {
        each!(self, w => w.base().set_enabled(enabled));
    }

    pub fn annotation(&self) -> Option<TypeKey> {
        each!(self, w => w.base().annotation())
    }

    pub fn set_annotation(&self, annotation: Option<TypeKey>) {
        each!(self, w => w.base().set_annotation(annotation));
    }

    /// Excluded from signature binding (e.g. call buttons).
    pub fn gui_only(&self) -> bool {
        each!(self, w => w.base().gui_only())
    }

    pub fn set_gui_only(&self, gui_only: bool) {
        each!(self, w => w.base().set_gui_only(gui_only));
    }

    /// Whether `Value::Null` is an admissible value.
    pub fn nullable(&self) -> bool {
        each!(self, w => w.base().nullable())
    }

    pub fn set_nullable(&self, nullable: bool) {
        each!(self, w => w.base().set_nullable(nullable));
    }

    /// The backend-native handle, for adapter-specific downcasting.
    pub fn native(&self) -> Rc<dyn Any> {
        each!(self, w => w.base().native())
    }

    pub fn set_bind(&self, binding: crate::options::Binding) {
        each!(self, w => w.base().set_bind(binding));
    }

    pub fn unbind(&self) {
        each!(self, w => w.base().unbind());
    }

    /// Change notification channel. Payload is the widget's new value; for
    /// composite widgets it is the value of the child that changed.
    pub fn changed(&self) -> &crate::reactive::Signal<Value> {
        each!(self, w => w.changed())
    }

    /// The widget's current value. Fallible: a literal-fallback editor
    /// parses its text here, and containers hold no value.
    pub fn value(&self) -> Result<Value, ValueError> {
        each!(self, w => w.value())
    }

    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        each!(self, w => w.set_value(value))
    }

    /// Re-query dynamic choice sources, recursively for composites.
    /// Returns whether anything observably changed.
    pub fn reset_choices(&self) -> bool {
        each!(self, w => w.reset_choices())
    }

    // -----------------------------------------------------------------------
    // Variant accessors
    // -----------------------------------------------------------------------

    pub fn as_value(&self) -> Option<&ValueWidget> {
        match self {
            Widget::Value(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_ranged(&self) -> Option<&RangedWidget> {
        match self {
            Widget::Ranged(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_slider(&self) -> Option<&SliderWidget> {
        match self {
            Widget::Slider(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_button(&self) -> Option<&ButtonWidget> {
        match self {
            Widget::Button(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalWidget> {
        match self {
            Widget::Categorical(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListEdit> {
        match self {
            Widget::List(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleEdit> {
        match self {
            Widget::Tuple(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Widget::Container(w) => Some(w),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}
