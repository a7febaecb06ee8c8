//! Clickable widgets: push buttons and checkboxes.

use std::cell::Cell;
use std::rc::Rc;

use crate::backend::ButtonBackend;
use crate::options::WidgetKind;
use crate::reactive::Signal;
use crate::value::Value;
use crate::widget::{ValueError, WidgetBase};

/// A boolean-valued widget the user activates by clicking.
///
/// User activation emits [`clicked`] and then `changed` with the new
/// checked state; programmatic [`set_value`] emits only `changed`.
///
/// [`clicked`]: ButtonWidget::clicked
/// [`set_value`]: ButtonWidget::set_value
pub struct ButtonWidget {
    base: WidgetBase<dyn ButtonBackend>,
    kind: WidgetKind,
    changed: Signal<Value>,
    clicked: Signal<()>,
    /// "No value" state of a nullable checkbox; any click leaves it.
    null: Rc<Cell<bool>>,
}

impl ButtonWidget {
    pub fn new(kind: WidgetKind, backend: Box<dyn ButtonBackend>) -> Self {
        let widget = Self {
            base: WidgetBase::new(backend),
            kind,
            changed: Signal::new(),
            clicked: Signal::new(),
            null: Rc::new(Cell::new(false)),
        };
        let updating = widget.base.updating_flag();
        let changed = widget.changed.clone();
        let clicked = widget.clicked.clone();
        let null = Rc::clone(&widget.null);
        widget.base.backend().on_click(Box::new(move |checked| {
            if updating.get() {
                return;
            }
            null.set(false);
            clicked.emit(&());
            changed.emit(&Value::Bool(checked));
        }));
        widget
    }

    pub fn base(&self) -> &WidgetBase<dyn ButtonBackend> {
        &self.base
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn changed(&self) -> &Signal<Value> {
        &self.changed
    }

    /// Emitted on user activation, before `changed`.
    pub fn clicked(&self) -> &Signal<()> {
        &self.clicked
    }

    pub fn text(&self) -> String {
        self.base.backend().text()
    }

    pub fn set_text(&self, text: &str) {
        self.base.backend().set_text(text);
    }

    pub fn value(&self) -> Result<Value, ValueError> {
        if let Some(binding) = self.base.bind() {
            return Ok(binding.resolve());
        }
        if self.null.get() {
            return Ok(Value::Null);
        }
        Ok(Value::Bool(self.base.backend().is_checked()))
    }

    /// Set the checked state. A nullable widget also accepts `Value::Null`
    /// as its "no value" state.
    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        if value.is_null() {
            if !self.base.nullable() {
                return Err(ValueError::WrongType {
                    expected: "bool",
                    got: value.kind_name(),
                });
            }
            if !self.null.replace(true) {
                self.changed.emit(&Value::Null);
            }
            return Ok(());
        }
        let checked = value.as_bool().ok_or_else(|| ValueError::WrongType {
            expected: "bool",
            got: value.kind_name(),
        })?;
        let was_null = self.null.replace(false);
        if !was_null && self.base.backend().is_checked() == checked {
            return Ok(());
        }
        if self.base.backend().is_checked() != checked {
            let _guard = self.base.update_guard();
            self.base.backend().set_checked(checked);
        }
        self.changed.emit(&Value::Bool(checked));
        Ok(())
    }

    pub fn reset_choices(&self) -> bool {
        false
    }
}

// ===========================================================================
// Tests
// ===========================================================================
