//! Composite editors for sequences and tuples.
//!
//! A `ListEdit` hosts a growable row of element widgets built from one
//! element descriptor; a `TupleEdit` hosts a fixed row built from
//! per-position descriptors. Both keep a backend factory around so they can
//! build element widgets on demand.

use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::{BackendFactory, ContainerBackend};
use crate::options::{WidgetDescriptor, WidgetKind};
use crate::reactive::{ConnectionId, Signal};
use crate::value::Value;
use crate::widget::{ValueError, Widget, WidgetBase};
use crate::widgets::create::{create_widget, WidgetCreationError};

struct ElementSlot {
    widget: Rc<Widget>,
    relay: ConnectionId,
}

// ---------------------------------------------------------------------------
// ListEdit
// ---------------------------------------------------------------------------

/// A growable editor whose value is the list of its element values.
pub struct ListEdit {
    base: WidgetBase<dyn ContainerBackend>,
    changed: Signal<Value>,
    element: WidgetDescriptor,
    factory: Rc<dyn BackendFactory>,
    elements: RefCell<Vec<ElementSlot>>,
}

impl ListEdit {
    pub fn new(
        element: WidgetDescriptor,
        factory: Rc<dyn BackendFactory>,
        backend: Box<dyn ContainerBackend>,
    ) -> Self {
        Self {
            base: WidgetBase::new(backend),
            changed: Signal::new(),
            element,
            factory,
            elements: RefCell::new(Vec::new()),
        }
    }

    pub fn base(&self) -> &WidgetBase<dyn ContainerBackend> {
        &self.base
    }

    pub fn kind(&self) -> WidgetKind {
        WidgetKind::ListEdit
    }

    pub fn changed(&self) -> &Signal<Value> {
        &self.changed
    }

    /// The descriptor every element widget is built from.
    pub fn element_descriptor(&self) -> &WidgetDescriptor {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    pub fn element(&self, index: usize) -> Option<Rc<Widget>> {
        self.elements.borrow().get(index).map(|s| Rc::clone(&s.widget))
    }

    /// Append an element holding `value`.
    pub fn push(&self, value: &Value) -> Result<(), ValueError> {
        self.insert(self.len(), value)
    }

    pub fn insert(&self, index: usize, value: &Value) -> Result<(), ValueError> {
        let widget = self.build_element(value)?;
        self.attach(index, widget);
        self.changed.emit(&self.aggregate());
        Ok(())
    }

    /// Remove the element at `index`, severing its change relay. Returns
    /// `None` when the index is out of bounds.
    pub fn remove(&self, index: usize) -> Option<Rc<Widget>> {
        let slot = {
            let mut elements = self.elements.borrow_mut();
            if index >= elements.len() {
                return None;
            }
            elements.remove(index)
        };
        slot.widget.changed().disconnect(slot.relay);
        self.base.backend().remove_child(index);
        self.changed.emit(&self.aggregate());
        Some(slot.widget)
    }

    pub fn value(&self) -> Result<Value, ValueError> {
        if let Some(binding) = self.base.bind() {
            return Ok(binding.resolve());
        }
        let mut items = Vec::with_capacity(self.len());
        for slot in self.elements.borrow().iter() {
            items.push(slot.widget.value()?);
        }
        Ok(Value::List(items))
    }

    /// Replace the whole list: existing elements are reused in place, the
    /// row grows or shrinks to match, and `changed` fires at most once.
    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        let items = match value {
            Value::List(items) => items,
            other => {
                return Err(ValueError::WrongType {
                    expected: "list",
                    got: other.kind_name(),
                })
            }
        };
        let before = self.value()?;
        {
            let _mute = self.changed.blocked();
            for (index, item) in items.iter().enumerate() {
                let existing = self.element(index);
                match existing {
                    Some(widget) => widget.set_value(item)?,
                    None => {
                        let widget = self.build_element(item)?;
                        self.attach(index, widget);
                    }
                }
            }
            while self.len() > items.len() {
                let index = self.len() - 1;
                let slot = self.elements.borrow_mut().remove(index);
                slot.widget.changed().disconnect(slot.relay);
                self.base.backend().remove_child(index);
            }
        }
        let after = self.value()?;
        if before != after {
            self.changed.emit(&after);
        }
        Ok(())
    }

    /// Re-query dynamic choices in every element, emitting at most one
    /// consolidated notification.
    pub fn reset_choices(&self) -> bool {
        let mut any = false;
        for slot in self.elements.borrow().iter() {
            let _mute = slot.widget.changed().blocked();
            if slot.widget.reset_choices() {
                any = true;
            }
        }
        if any {
            self.changed.emit(&Value::Null);
        }
        any
    }

    fn build_element(&self, value: &Value) -> Result<Rc<Widget>, ValueError> {
        let mut descriptor = self.element.clone();
        descriptor.options.value = Some(value.clone());
        let widget = create_widget(&self.factory, &descriptor)
            .map_err(|e| ValueError::ElementCreation(e.to_string()))?;
        Ok(Rc::new(widget))
    }

    fn attach(&self, index: usize, widget: Rc<Widget>) {
        let changed = self.changed.clone();
        let relay = widget
            .changed()
            .connect(move |value| {
                changed.emit(value);
            });
        self.base.backend().insert_child(index, widget.native());
        self.elements
            .borrow_mut()
            .insert(index, ElementSlot { widget, relay });
    }

    fn aggregate(&self) -> Value {
        self.value().unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// TupleEdit
// ---------------------------------------------------------------------------

/// A fixed-arity editor whose value is the tuple of its element values.
pub struct TupleEdit {
    base: WidgetBase<dyn ContainerBackend>,
    changed: Signal<Value>,
    elements: RefCell<Vec<ElementSlot>>,
}

impl TupleEdit {
    /// Build one element widget per descriptor, in order.
    pub fn new(
        descriptors: &[WidgetDescriptor],
        factory: &Rc<dyn BackendFactory>,
        backend: Box<dyn ContainerBackend>,
    ) -> Result<Self, WidgetCreationError> {
        let edit = Self {
            base: WidgetBase::new(backend),
            changed: Signal::new(),
            elements: RefCell::new(Vec::with_capacity(descriptors.len())),
        };
        for (index, descriptor) in descriptors.iter().enumerate() {
            let widget = Rc::new(create_widget(factory, descriptor)?);
            let changed = edit.changed.clone();
            let relay = widget.changed().connect(move |value| {
                changed.emit(value);
            });
            edit.base.backend().insert_child(index, widget.native());
            edit.elements
                .borrow_mut()
                .push(ElementSlot { widget, relay });
        }
        Ok(edit)
    }

    pub fn base(&self) -> &WidgetBase<dyn ContainerBackend> {
        &self.base
    }

    pub fn kind(&self) -> WidgetKind {
        WidgetKind::TupleEdit
    }

    pub fn changed(&self) -> &Signal<Value> {
        &self.changed
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    pub fn element(&self, index: usize) -> Option<Rc<Widget>> {
        self.elements.borrow().get(index).map(|s| Rc::clone(&s.widget))
    }

    pub fn value(&self) -> Result<Value, ValueError> {
        if let Some(binding) = self.base.bind() {
            return Ok(binding.resolve());
        }
        let mut items = Vec::with_capacity(self.len());
        for slot in self.elements.borrow().iter() {
            items.push(slot.widget.value()?);
        }
        Ok(Value::Tuple(items))
    }

    /// Set all positions at once; the tuple's arity must match exactly.
    /// `changed` fires at most once.
    pub fn set_value(&self, value: &Value) -> Result<(), ValueError> {
        let items = match value {
            Value::Tuple(items) => items,
            other => {
                return Err(ValueError::WrongType {
                    expected: "tuple",
                    got: other.kind_name(),
                })
            }
        };
        if items.len() != self.len() {
            return Err(ValueError::WrongArity {
                expected: self.len(),
                got: items.len(),
            });
        }
        let before = self.value()?;
        {
            let _mute = self.changed.blocked();
            for (slot, item) in self.elements.borrow().iter().zip(items) {
                slot.widget.set_value(item)?;
            }
        }
        let after = self.value()?;
        if before != after {
            self.changed.emit(&after);
        }
        Ok(())
    }

    pub fn reset_choices(&self) -> bool {
        let mut any = false;
        for slot in self.elements.borrow().iter() {
            let _mute = slot.widget.changed().blocked();
            if slot.widget.reset_choices() {
                any = true;
            }
        }
        if any {
            self.changed.emit(&Value::Null);
        }
        any
    }
}

// ===========================================================================
// Tests
// ===========================================================================
