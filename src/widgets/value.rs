//! Single-value widgets: line editors, file pickers, the literal-fallback
//! editor, and the invisible placeholder.

use crate::backend::ValueBackend;
use crate::options::WidgetKind;
use crate::reactive::Signal;
use crate::value::{evaluate_literal, Value};
use crate::widget::{ValueError, WidgetBase};

/// A widget holding one value behind a [`ValueBackend`].
///
/// In `LiteralEdit` mode the backend stores raw text and [`value`] parses
/// it as a literal expression on read; everything else stores the value
/// as-is.
///
/// [`value`]: ValueWidget::value
pub struct ValueWidget {
    base: WidgetBase<dyn ValueBackend>,
    kind: WidgetKind,
    changed: Signal<Value>,
}

impl ValueWidget {
    pub fn new(kind: WidgetKind, backend: Box<dyn ValueBackend>) -> Self {
        let widget = Self {
            base: WidgetBase::new(backend),
            kind,
            changed: Signal::new(),
        };
        let updating = widget.base.updating_flag();
        let changed = widget.changed.clone();
        widget.base.backend().on_change(Box::new(move |value| {
            // Ignore the backend's synchronous echo of a programmatic set.
            if updating.get() {
                return;
            }
            changed.emit(value);
        }));
        widget
    }

    pub fn base(&self) -> &WidgetBase<dyn ValueBackend> {
        &self.base
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn changed(&self) -> &Signal<Value> {
        &self.changed
    }

    /// Current value. A bound value shadows the control; a literal editor
    /// parses its text here, surfacing `EvaluationError` through
    /// [`ValueError::Evaluation`].
    pub fn value(&self) -> Result<Value, ValueError> {
        if let Some(binding) = self.base.bind() {
            return Ok(binding.resolve());
        }
        let raw = self.base.backend().value();
        if self.kind == WidgetKind::LiteralEdit {
            let text = match &raw {
                Value::Str(s) => s.as_str(),
                _ => return Ok(raw),
            };
            return Ok(evaluate_literal(text)?);
        }
        Ok(raw)
    }

    /// Set the value. Setting a value equal to the current one is a no-op
    /// and emits nothing.
    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        let stored = if self.kind == WidgetKind::LiteralEdit {
            match value {
                Value::Str(s) => Value::Str(s.clone()),
                other => Value::Str(other.to_literal()),
            }
        } else {
            value.clone()
        };
        if self.base.backend().value() == stored {
            return Ok(());
        }
        {
            let _guard = self.base.update_guard();
            self.base.backend().set_value(&stored);
        }
        self.changed.emit(&stored);
        Ok(())
    }

    /// Raw text of a literal editor (its unparsed backend state).
    pub fn text(&self) -> String {
        match self.base.backend().value() {
            Value::Str(s) => s,
            other => other.to_string(),
        }
    }

    pub fn reset_choices(&self) -> bool {
        false
    }
}

// ===========================================================================
// Tests
// ===========================================================================
