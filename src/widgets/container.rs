//! Ordered, name-unique widget collections.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::backend::ContainerBackend;
use crate::options::{Orientation, WidgetKind};
use crate::reactive::{ConnectionId, Signal};
use crate::value::Value;
use crate::widget::{ValueError, Widget, WidgetBase};

/// Errors from container child management.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("a child named {0:?} already exists in this container")]
    DuplicateName(String),
    #[error("widget {0:?} is already a child of this container")]
    AlreadyPresent(String),
    #[error("index {index} is out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("no child named {0:?}")]
    NoSuchChild(String),
}

struct ChildEntry {
    widget: Rc<Widget>,
    /// The container-made relay from the child's `changed`. Severed on
    /// removal; connections users made directly on the child are not.
    relay: ConnectionId,
}

/// An ordered sequence of child widgets.
///
/// Insertion order is significant, a widget handle may appear at most once,
/// and non-empty names are unique among immediate children. Every child's
/// `changed` is relayed through the container's own `changed`.
pub struct Container {
    base: WidgetBase<dyn ContainerBackend>,
    changed: Signal<Value>,
    orientation: Cell<Orientation>,
    labels_visible: Cell<bool>,
    children: RefCell<Vec<ChildEntry>>,
}

impl Container {
    pub fn new(backend: Box<dyn ContainerBackend>) -> Self {
        Self {
            base: WidgetBase::new(backend),
            changed: Signal::new(),
            orientation: Cell::new(Orientation::default()),
            labels_visible: Cell::new(true),
            children: RefCell::new(Vec::new()),
        }
    }

    pub fn base(&self) -> &WidgetBase<dyn ContainerBackend> {
        &self.base
    }

    pub fn kind(&self) -> WidgetKind {
        WidgetKind::Container
    }

    pub fn changed(&self) -> &Signal<Value> {
        &self.changed
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation.get()
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        self.orientation.set(orientation);
    }

    /// Whether child labels are rendered (a layout policy for backends).
    pub fn labels_visible(&self) -> bool {
        self.labels_visible.get()
    }

    pub fn set_labels_visible(&self, visible: bool) {
        self.labels_visible.set(visible);
    }

    // -----------------------------------------------------------------------
    // Mutable-sequence API
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    /// Append a child. See [`insert`].
    ///
    /// [`insert`]: Container::insert
    pub fn push(&self, widget: Rc<Widget>) -> Result<(), ContainerError> {
        self.insert(self.len(), widget)
    }

    /// Insert a child at `index`. Fails if the handle is already present or
    /// a non-empty name collides with an existing child.
    pub fn insert(&self, index: usize, widget: Rc<Widget>) -> Result<(), ContainerError> {
        let len = self.len();
        if index > len {
            return Err(ContainerError::IndexOutOfBounds { index, len });
        }
        let name = widget.name();
        {
            let children = self.children.borrow();
            for entry in children.iter() {
                if Rc::ptr_eq(&entry.widget, &widget) {
                    return Err(ContainerError::AlreadyPresent(name));
                }
                if !name.is_empty() && entry.widget.name() == name {
                    return Err(ContainerError::DuplicateName(name));
                }
            }
        }
        let changed = self.changed.clone();
        let relay = widget.changed().connect(move |value| {
            changed.emit(value);
        });
        self.base.backend().insert_child(index, widget.native());
        self.children
            .borrow_mut()
            .insert(index, ChildEntry { widget, relay });
        Ok(())
    }

    /// Remove the child at `index`, severing the container's change relay.
    pub fn remove(&self, index: usize) -> Result<Rc<Widget>, ContainerError> {
        let entry = {
            let mut children = self.children.borrow_mut();
            if index >= children.len() {
                return Err(ContainerError::IndexOutOfBounds {
                    index,
                    len: children.len(),
                });
            }
            children.remove(index)
        };
        entry.widget.changed().disconnect(entry.relay);
        self.base.backend().remove_child(index);
        Ok(entry.widget)
    }

    pub fn remove_named(&self, name: &str) -> Result<Rc<Widget>, ContainerError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| ContainerError::NoSuchChild(name.to_owned()))?;
        self.remove(index)
    }

    pub fn at(&self, index: usize) -> Option<Rc<Widget>> {
        self.children.borrow().get(index).map(|e| Rc::clone(&e.widget))
    }

    /// Look a child up by name.
    pub fn get(&self, name: &str) -> Option<Rc<Widget>> {
        self.children
            .borrow()
            .iter()
            .find(|e| e.widget.name() == name)
            .map(|e| Rc::clone(&e.widget))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.children
            .borrow()
            .iter()
            .position(|e| e.widget.name() == name)
    }

    /// Snapshot of the children, in order.
    pub fn children(&self) -> Vec<Rc<Widget>> {
        self.children
            .borrow()
            .iter()
            .map(|e| Rc::clone(&e.widget))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Value protocol (containers hold no value)
    // -----------------------------------------------------------------------

    pub fn value(&self) -> Result<Value, ValueError> {
        Err(ValueError::NotAValue(self.base.name()))
    }

    pub fn set_value(&self, _value: &Value) -> Result<(), ValueError> {
        Err(ValueError::NotAValue(self.base.name()))
    }

    /// Recursively re-query every descendant's dynamic choices. Per-child
    /// emission is suspended for the duration; at most one consolidated
    /// `changed` fires, and none if nothing observably changed.
    pub fn reset_choices(&self) -> bool {
        let mut any = false;
        for child in self.children() {
            let _mute = child.changed().blocked();
            if child.reset_choices() {
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
