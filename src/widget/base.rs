//! Shared widget state and backend forwarding.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::backend::WidgetBackend;
use crate::options::Binding;
use crate::types::TypeKey;

/// State every core widget carries, plus forwarding to the single backend
/// object it owns. Generic over the backend contract so each widget family
/// keeps full access to its own capabilities.
pub struct WidgetBase<B: ?Sized + WidgetBackend> {
    name: RefCell<String>,
    annotation: RefCell<Option<TypeKey>>,
    /// An explicitly assigned label; `None` falls back to the name.
    explicit_label: RefCell<Option<String>>,
    /// Excluded from signature binding (call buttons, result displays).
    gui_only: Cell<bool>,
    /// Whether `Value::Null` is an admissible value for this widget.
    nullable: Cell<bool>,
    /// When set, the bound value shadows whatever the control shows.
    bind: RefCell<Option<Binding>>,
    /// In-flight programmatic update flag. Lives outside any `RefCell` so a
    /// backend that synchronously echoes a set through its change callback
    /// can be filtered without a borrow conflict.
    updating: Rc<Cell<bool>>,
    backend: Box<B>,
}

impl<B: ?Sized + WidgetBackend> WidgetBase<B> {
    pub fn new(backend: Box<B>) -> Self {
        Self {
            name: RefCell::new(String::new()),
            annotation: RefCell::new(None),
            explicit_label: RefCell::new(None),
            gui_only: Cell::new(false),
            nullable: Cell::new(false),
            bind: RefCell::new(None),
            updating: Rc::new(Cell::new(false)),
            backend,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shared in-flight flag, cloned into the backend change callback.
    pub fn updating_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.updating)
    }

    /// Mark a programmatic update in flight until the guard drops.
    pub fn update_guard(&self) -> UpdateGuard {
        self.updating.set(true);
        UpdateGuard {
            flag: Rc::clone(&self.updating),
        }
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: &str) {
        *self.name.borrow_mut() = name.to_owned();
        if self.explicit_label.borrow().is_none() {
            self.backend.set_label(name);
        }
    }

    /// The display label: explicit if assigned, otherwise the name.
    pub fn label(&self) -> String {
        self.explicit_label
            .borrow()
            .clone()
            .unwrap_or_else(|| self.name())
    }

    pub fn set_label(&self, label: &str) {
        *self.explicit_label.borrow_mut() = Some(label.to_owned());
        self.backend.set_label(label);
    }

    pub fn annotation(&self) -> Option<TypeKey> {
        self.annotation.borrow().clone()
    }

    pub fn set_annotation(&self, annotation: Option<TypeKey>) {
        *self.annotation.borrow_mut() = annotation;
    }

    pub fn gui_only(&self) -> bool {
        self.gui_only.get()
    }

    pub fn set_gui_only(&self, gui_only: bool) {
        self.gui_only.set(gui_only);
    }

    pub fn nullable(&self) -> bool {
        self.nullable.get()
    }

    pub fn set_nullable(&self, nullable: bool) {
        self.nullable.set(nullable);
    }

    /// The active binding, if any.
    pub fn bind(&self) -> Option<Binding> {
        self.bind.borrow().clone()
    }

    pub fn set_bind(&self, binding: Binding) {
        *self.bind.borrow_mut() = Some(binding);
    }

    /// Remove the binding; the control's own value becomes visible again.
    pub fn unbind(&self) {
        *self.bind.borrow_mut() = None;
    }

    // -----------------------------------------------------------------------
    // Backend forwarding
    // -----------------------------------------------------------------------

    pub fn visible(&self) -> bool {
        self.backend.is_visible()
    }

    pub fn set_visible(&self, visible: bool) {
        self.backend.set_visible(visible);
    }

    pub fn enabled(&self) -> bool {
        self.backend.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.backend.set_enabled(enabled);
    }

    pub fn tooltip(&self) -> String {
        self.backend.tooltip()
    }

    pub fn set_tooltip(&self, tooltip: &str) {
        self.backend.set_tooltip(tooltip);
    }

    pub fn native(&self) -> Rc<dyn Any> {
        self.backend.native()
    }
}

/// RAII guard from [`WidgetBase::update_guard`]; clears the in-flight flag
/// on drop, including during unwinding.
pub struct UpdateGuard {
    flag: Rc<Cell<bool>>,
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
