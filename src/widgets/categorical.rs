//! Choice widgets: combo boxes, radio groups, multi-line selects.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::backend::CategoricalBackend;
use crate::options::{ChoicesSource, WidgetKind};
use crate::reactive::Signal;
use crate::value::Value;
use crate::widget::{ValueError, WidgetBase};

/// A widget whose value is one of an ordered set of named choices.
///
/// Choices come from a [`ChoicesSource`]; a dynamic source is re-queried by
/// [`reset_choices`], which replaces the choice list atomically and
/// preserves the current selection when its value is still present.
///
/// [`reset_choices`]: CategoricalWidget::reset_choices
pub struct CategoricalWidget {
    base: WidgetBase<dyn CategoricalBackend>,
    kind: WidgetKind,
    changed: Signal<Value>,
    source: RefCell<Option<ChoicesSource>>,
}

impl CategoricalWidget {
    pub fn new(kind: WidgetKind, backend: Box<dyn CategoricalBackend>) -> Self {
        let widget = Self {
            base: WidgetBase::new(backend),
            kind,
            changed: Signal::new(),
            source: RefCell::new(None),
        };
        let updating = widget.base.updating_flag();
        let changed = widget.changed.clone();
        widget.base.backend().on_selection(Box::new(move |value| {
            if updating.get() {
                return;
            }
            changed.emit(value);
        }));
        widget
    }

    pub fn base(&self) -> &WidgetBase<dyn CategoricalBackend> {
        &self.base
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn changed(&self) -> &Signal<Value> {
        &self.changed
    }

    /// Whether `Value::Null` ("no selection") is an admissible value.
    pub fn nullable(&self) -> bool {
        self.base.nullable()
    }

    pub fn set_nullable(&self, nullable: bool) {
        self.base.set_nullable(nullable);
    }

    /// Current `(name, value)` pairs, in display order.
    pub fn choices(&self) -> Vec<(String, Value)> {
        self.base.backend().choices()
    }

    /// Display name of the current choice.
    pub fn current_choice(&self) -> Option<String> {
        let index = self.base.backend().current_index()?;
        self.choices().get(index).map(|(name, _)| name.clone())
    }

    /// Install a new choices source and apply it. Returns whether anything
    /// observably changed.
    pub fn set_choices(&self, source: ChoicesSource) -> bool {
        let pairs = source.materialize();
        *self.source.borrow_mut() = Some(source);
        self.apply_choices(pairs)
    }

    /// Re-query the choices source. A dynamic source runs again; a static
    /// source yields the same pairs and this is a no-op. Returns whether
    /// anything observably changed.
    pub fn reset_choices(&self) -> bool {
        let source = self.source.borrow().clone();
        match source {
            // Materialize before touching any state: a failing source must
            // leave the previous choices fully intact.
            Some(src) => {
                let pairs = src.materialize();
                self.apply_choices(pairs)
            }
            None => false,
        }
    }

    pub fn value(&self) -> Result<Value, ValueError> {
        if let Some(binding) = self.base.bind() {
            return Ok(binding.resolve());
        }
        Ok(self.current_value())
    }

    /// Select the choice whose value equals `value`. `Value::Null` clears
    /// the selection when the widget is nullable; a value not among the
    /// current choices fails with [`ValueError::InvalidChoice`].
    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        if value.is_null() && self.base.nullable() {
            if self.base.backend().current_index().is_some() {
                {
                    let _guard = self.base.update_guard();
                    self.base.backend().set_current_index(None);
                }
                self.changed.emit(&Value::Null);
            }
            return Ok(());
        }
        let choices = self.choices();
        let index = choices
            .iter()
            .position(|(_, v)| v == value)
            .ok_or_else(|| ValueError::InvalidChoice {
                value: value.clone(),
            })?;
        if self.base.backend().current_index() == Some(index) {
            return Ok(());
        }
        {
            let _guard = self.base.update_guard();
            self.base.backend().set_current_index(Some(index));
        }
        self.changed.emit(value);
        Ok(())
    }

    fn current_value(&self) -> Value {
        match self.base.backend().current_index() {
            Some(index) => self
                .choices()
                .get(index)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null),
            None => Value::Null,
        }
    }

    /// Replace the displayed choices. Duplicate display names collapse to
    /// their last value, keeping first-seen position. An identical choice
    /// set emits nothing and does not touch the backend; otherwise the
    /// selection is preserved by value when possible, else the first choice
    /// is selected, else `changed` fires with `Value::Null`.
    fn apply_choices(&self, pairs: Vec<(String, Value)>) -> bool {
        let mut deduped: IndexMap<String, Value> = IndexMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            deduped.insert(name, value);
        }
        let new_pairs: Vec<(String, Value)> = deduped.into_iter().collect();

        if self.base.backend().choices() == new_pairs {
            return false;
        }

        let old_value = self.current_value();
        {
            let _guard = self.base.update_guard();
            self.base.backend().set_choices(&new_pairs);
            let index = new_pairs
                .iter()
                .position(|(_, v)| *v == old_value)
                .or(if new_pairs.is_empty() { None } else { Some(0) });
            self.base.backend().set_current_index(index);
        }
        let new_value = self.current_value();
        if new_value != old_value {
            self.changed.emit(&new_value);
        }
        true
    }
}

// ===========================================================================
// Tests
// ===========================================================================
