//! Numeric widgets with bounds: spinboxes and sliders.

use std::cell::Cell;
use std::rc::Rc;

use crate::backend::{RangedBackend, SliderBackend};
use crate::options::{Orientation, RangePolicy, WidgetKind};
use crate::reactive::Signal;
use crate::value::Value;
use crate::widget::{ValueError, WidgetBase};

/// Shared implementation for every bounded numeric widget, generic over the
/// backend contract so sliders keep access to their extra capabilities.
pub struct RangedCore<B: ?Sized + RangedBackend> {
    base: WidgetBase<B>,
    kind: WidgetKind,
    changed: Signal<Value>,
    policy: Cell<RangePolicy>,
    /// "No value" state of a nullable widget. The backend keeps its latent
    /// number; user input clears the flag (shared with the change callback).
    null: Rc<Cell<bool>>,
}

/// An integer or float spinbox.
pub type RangedWidget = RangedCore<dyn RangedBackend>;

impl<B: ?Sized + RangedBackend> RangedCore<B> {
    pub fn new(kind: WidgetKind, backend: Box<B>) -> Self {
        let widget = Self {
            base: WidgetBase::new(backend),
            kind,
            changed: Signal::new(),
            policy: Cell::new(RangePolicy::default()),
            null: Rc::new(Cell::new(false)),
        };
        let updating = widget.base.updating_flag();
        let changed = widget.changed.clone();
        let null = Rc::clone(&widget.null);
        widget.base.backend().on_change(Box::new(move |value| {
            if updating.get() {
                return;
            }
            null.set(false);
            changed.emit(value);
        }));
        widget
    }

    pub fn base(&self) -> &WidgetBase<B> {
        &self.base
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn changed(&self) -> &Signal<Value> {
        &self.changed
    }

    pub fn range_policy(&self) -> RangePolicy {
        self.policy.get()
    }

    pub fn set_range_policy(&self, policy: RangePolicy) {
        self.policy.set(policy);
    }

    pub fn minimum(&self) -> f64 {
        self.base.backend().minimum()
    }

    /// Raise the lower bound; the current value is pulled up if it falls
    /// below the new minimum.
    pub fn set_minimum(&self, min: f64) {
        self.base.backend().set_minimum(min);
        if self.null.get() {
            // A latent number is never exposed; leaving the null state
            // re-clamps against the new bound.
            return;
        }
        if let Some(current) = self.base.backend().value().as_f64() {
            if current < min {
                // Cannot fail: min is inside the new range.
                let _ = self.set_value(&self.numeric(min));
            }
        }
    }

    pub fn maximum(&self) -> f64 {
        self.base.backend().maximum()
    }

    pub fn set_maximum(&self, max: f64) {
        self.base.backend().set_maximum(max);
        if self.null.get() {
            return;
        }
        if let Some(current) = self.base.backend().value().as_f64() {
            if current > max {
                let _ = self.set_value(&self.numeric(max));
            }
        }
    }

    pub fn step(&self) -> f64 {
        self.base.backend().step()
    }

    pub fn set_step(&self, step: f64) {
        self.base.backend().set_step(step);
    }

    pub fn value(&self) -> Result<Value, ValueError> {
        if let Some(binding) = self.base.bind() {
            return Ok(binding.resolve());
        }
        if self.null.get() {
            return Ok(Value::Null);
        }
        Ok(self.base.backend().value())
    }

    /// Set the value, clamping into `[min, max]` or failing with
    /// [`ValueError::OutOfRange`] per the range policy. A nullable widget
    /// accepts `Value::Null` as its "no value" state.
    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        if value.is_null() {
            if !self.base.nullable() {
                return Err(ValueError::WrongType {
                    expected: "numeric",
                    got: value.kind_name(),
                });
            }
            if !self.null.replace(true) {
                self.changed.emit(&Value::Null);
            }
            return Ok(());
        }
        let number = value.as_f64().ok_or_else(|| ValueError::WrongType {
            expected: "numeric",
            got: value.kind_name(),
        })?;
        let (min, max) = (self.minimum(), self.maximum());
        let number = if number < min || number > max {
            match self.policy.get() {
                RangePolicy::Clamp => number.clamp(min, max),
                RangePolicy::Reject => {
                    return Err(ValueError::OutOfRange {
                        value: number,
                        min,
                        max,
                    })
                }
            }
        } else {
            number
        };
        let stored = self.numeric(number);
        let was_null = self.null.replace(false);
        if !was_null && self.base.backend().value() == stored {
            return Ok(());
        }
        if self.base.backend().value() != stored {
            let _guard = self.base.update_guard();
            self.base.backend().set_value(&stored);
        }
        self.changed.emit(&stored);
        Ok(())
    }

    pub fn reset_choices(&self) -> bool {
        false
    }

    /// Wrap a number in the value shape this kind stores.
    fn numeric(&self, number: f64) -> Value {
        match self.kind {
            WidgetKind::SpinBox | WidgetKind::Slider => Value::Int(number.round() as i64),
            _ => Value::Float(number),
        }
    }
}

// ---------------------------------------------------------------------------
// SliderWidget
// ---------------------------------------------------------------------------

/// A ranged widget rendered as a slider, with orientation and an optional
/// numeric readout.
pub struct SliderWidget {
    core: RangedCore<dyn SliderBackend>,
}

impl SliderWidget {
    pub fn new(kind: WidgetKind, backend: Box<dyn SliderBackend>) -> Self {
        Self {
            core: RangedCore::new(kind, backend),
        }
    }

    pub fn base(&self) -> &WidgetBase<dyn SliderBackend> {
        self.core.base()
    }

    pub fn kind(&self) -> WidgetKind {
        self.core.kind()
    }

    pub fn changed(&self) -> &Signal<Value> {
        self.core.changed()
    }

    pub fn value(&self) -> Result<Value, ValueError> {
        self.core.value()
    }

    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        self.core.set_value(value)
    }

    pub fn minimum(&self) -> f64 {
        self.core.minimum()
    }

    pub fn set_minimum(&self, min: f64) {
        self.core.set_minimum(min);
    }

    pub fn maximum(&self) -> f64 {
        self.core.maximum()
    }

    pub fn set_maximum(&self, max: f64) {
        self.core.set_maximum(max);
    }

    pub fn step(&self) -> f64 {
        self.core.step()
    }

    pub fn set_step(&self, step: f64) {
        self.core.set_step(step);
    }

    pub fn range_policy(&self) -> RangePolicy {
        self.core.range_policy()
    }

    pub fn set_range_policy(&self, policy: RangePolicy) {
        self.core.set_range_policy(policy);
    }

    pub fn orientation(&self) -> Orientation {
        self.core.base().backend().orientation()
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        self.core.base().backend().set_orientation(orientation);
    }

    pub fn readout_visible(&self) -> bool {
        self.core.base().backend().readout_visible()
    }

    pub fn set_readout_visible(&self, visible: bool) {
        self.core.base().backend().set_readout_visible(visible);
    }

    pub fn reset_choices(&self) -> bool {
        false
    }
}

// ===========================================================================
// Tests
// ===========================================================================
