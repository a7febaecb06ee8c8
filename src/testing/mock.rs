//! In-memory mock backend.
//!
//! Every mock control is a plain state bag behind one shared
//! [`MockControl`]; the `simulate_*` methods stand in for user interaction
//! by driving the callbacks a real toolkit would fire. Widgets reach the
//! control back through `native()` downcasting.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::backend::{
    BackendError, BackendFactory, BackendHandle, ButtonBackend, CategoricalBackend,
    ContainerBackend, RangedBackend, SliderBackend, ValueBackend, WidgetBackend,
};
use crate::options::{Orientation, WidgetKind};
use crate::value::Value;

struct MockState {
    visible: bool,
    enabled: bool,
    label: String,
    tooltip: String,
    value: Value,
    min: f64,
    max: f64,
    step: f64,
    orientation: Orientation,
    readout: bool,
    text: String,
    checked: bool,
    choices: Vec<(String, Value)>,
    current: Option<usize>,
    children: Vec<Rc<dyn Any>>,
}

impl MockState {
    fn new(initial: Value) -> Self {
        Self {
            visible: true,
            enabled: true,
            label: String::new(),
            tooltip: String::new(),
            value: initial,
            min: 0.0,
            max: 1000.0,
            step: 1.0,
            orientation: Orientation::default(),
            readout: true,
            text: String::new(),
            checked: false,
            choices: Vec::new(),
            current: None,
            children: Vec::new(),
        }
    }
}

/// The shared state of one mock control, with interaction simulation.
pub struct MockControl {
    state: RefCell<MockState>,
    on_change: RefCell<Option<Box<dyn FnMut(&Value)>>>,
    on_click: RefCell<Option<Box<dyn FnMut(bool)>>>,
    on_selection: RefCell<Option<Box<dyn FnMut(&Value)>>>,
    /// When set, programmatic `set_value` also fires the change callback,
    /// imitating toolkits that echo every set.
    echo: Cell<bool>,
}

impl MockControl {
    fn new(initial: Value) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(MockState::new(initial)),
            on_change: RefCell::new(None),
            on_click: RefCell::new(None),
            on_selection: RefCell::new(None),
            echo: Cell::new(false),
        })
    }

    fn for_kind(kind: WidgetKind) -> Rc<Self> {
        let initial = match kind {
            WidgetKind::SpinBox | WidgetKind::Slider => Value::Int(0),
            WidgetKind::FloatSpinBox | WidgetKind::FloatSlider => Value::Float(0.0),
            WidgetKind::LineEdit | WidgetKind::FileEdit | WidgetKind::LiteralEdit => {
                Value::Str(String::new())
            }
            _ => Value::Null,
        };
        Self::new(initial)
    }

    /// Make programmatic sets echo through the change callback.
    pub fn set_echo(&self, echo: bool) {
        self.echo.set(echo);
    }

    /// Act as the user editing the control to `value`.
    pub fn simulate_input(&self, value: &Value) {
        self.state.borrow_mut().value = value.clone();
        self.fire_change(value);
    }

    /// Act as the user clicking the control (toggling its checked state).
    pub fn simulate_click(&self) {
        let checked = {
            let mut state = self.state.borrow_mut();
            state.checked = !state.checked;
            state.checked
        };
        let taken = self.on_click.borrow_mut().take();
        if let Some(mut cb) = taken {
            cb(checked);
            self.on_click.borrow_mut().get_or_insert(cb);
        }
    }

    /// Act as the user picking the choice at `index` (or clearing).
    pub fn simulate_select(&self, index: Option<usize>) {
        let value = {
            let mut state = self.state.borrow_mut();
            state.current = index;
            index
                .and_then(|i| state.choices.get(i))
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null)
        };
        let taken = self.on_selection.borrow_mut().take();
        if let Some(mut cb) = taken {
            cb(&value);
            self.on_selection.borrow_mut().get_or_insert(cb);
        }
    }

    /// Number of hosted child natives (container controls).
    pub fn child_count(&self) -> usize {
        self.state.borrow().children.len()
    }

    fn fire_change(&self, value: &Value) {
        // Take the callback out while it runs so reentrant simulation
        // cannot double-borrow.
        let taken = self.on_change.borrow_mut().take();
        if let Some(mut cb) = taken {
            cb(value);
            self.on_change.borrow_mut().get_or_insert(cb);
        }
    }
}

// ---------------------------------------------------------------------------
// Contract implementations
// ---------------------------------------------------------------------------

macro_rules! mock_backend {
    ($name:ident) => {
        struct $name(Rc<MockControl>);

        impl WidgetBackend for $name {
            fn set_visible(&self, visible: bool) {
                self.0.state.borrow_mut().visible = visible;
            }
            fn is_visible(&self) -> bool {
                self.0.state.borrow().visible
            }
            fn set_enabled(&self, enabled: bool) {
                self.0.state.borrow_mut().enabled = enabled;
            }
            fn is_enabled(&self) -> bool {
                self.0.state.borrow().enabled
            }
            fn set_label(&self, label: &str) {
                self.0.state.borrow_mut().label = label.to_owned();
            }
            fn label(&self) -> String {
                self.0.state.borrow().label.clone()
            }
            fn set_tooltip(&self, tooltip: &str) {
                self.0.state.borrow_mut().tooltip = tooltip.to_owned();
            }
            fn tooltip(&self) -> String {
                self.0.state.borrow().tooltip.clone()
            }
            fn native(&self) -> Rc<dyn Any> {
                Rc::clone(&self.0) as Rc<dyn Any>
            }
        }
    };
}

macro_rules! mock_value_impl {
    ($name:ident) => {
        impl ValueBackend for $name {
            fn value(&self) -> Value {
                self.0.state.borrow().value.clone()
            }
            fn set_value(&self, value: &Value) {
                self.0.state.borrow_mut().value = value.clone();
                if self.0.echo.get() {
                    self.0.fire_change(value);
                }
            }
            fn on_change(&self, callback: Box<dyn FnMut(&Value)>) {
                *self.0.on_change.borrow_mut() = Some(callback);
            }
        }
    };
}

macro_rules! mock_ranged_impl {
    ($name:ident) => {
        impl RangedBackend for $name {
            fn set_minimum(&self, min: f64) {
                self.0.state.borrow_mut().min = min;
            }
            fn minimum(&self) -> f64 {
                self.0.state.borrow().min
            }
            fn set_maximum(&self, max: f64) {
                self.0.state.borrow_mut().max = max;
            }
            fn maximum(&self) -> f64 {
                self.0.state.borrow().max
            }
            fn set_step(&self, step: f64) {
                self.0.state.borrow_mut().step = step;
            }
            fn step(&self) -> f64 {
                self.0.state.borrow().step
            }
        }
    };
}

mock_backend!(MockValue);
mock_value_impl!(MockValue);

mock_backend!(MockRanged);
mock_value_impl!(MockRanged);
mock_ranged_impl!(MockRanged);

mock_backend!(MockSlider);
mock_value_impl!(MockSlider);
mock_ranged_impl!(MockSlider);

impl SliderBackend for MockSlider {
    fn set_orientation(&self, orientation: Orientation) {
        self.0.state.borrow_mut().orientation = orientation;
    }
    fn orientation(&self) -> Orientation {
        self.0.state.borrow().orientation
    }
    fn set_readout_visible(&self, visible: bool) {
        self.0.state.borrow_mut().readout = visible;
    }
    fn readout_visible(&self) -> bool {
        self.0.state.borrow().readout
    }
}

mock_backend!(MockButton);

impl ButtonBackend for MockButton {
    fn set_text(&self, text: &str) {
        self.0.state.borrow_mut().text = text.to_owned();
    }
    fn text(&self) -> String {
        self.0.state.borrow().text.clone()
    }
    fn set_checked(&self, checked: bool) {
        self.0.state.borrow_mut().checked = checked;
    }
    fn is_checked(&self) -> bool {
        self.0.state.borrow().checked
    }
    fn on_click(&self, callback: Box<dyn FnMut(bool)>) {
        *self.0.on_click.borrow_mut() = Some(callback);
    }
}

mock_backend!(MockCategorical);

impl CategoricalBackend for MockCategorical {
    fn set_choices(&self, choices: &[(String, Value)]) {
        let mut state = self.0.state.borrow_mut();
        state.choices = choices.to_vec();
        if state
            .current
            .is_some_and(|index| index >= state.choices.len())
        {
            state.current = None;
        }
    }
    fn choices(&self) -> Vec<(String, Value)> {
        self.0.state.borrow().choices.clone()
    }
    fn set_current_index(&self, index: Option<usize>) {
        self.0.state.borrow_mut().current = index;
    }
    fn current_index(&self) -> Option<usize> {
        self.0.state.borrow().current
    }
    fn on_selection(&self, callback: Box<dyn FnMut(&Value)>) {
        *self.0.on_selection.borrow_mut() = Some(callback);
    }
}

mock_backend!(MockContainer);

impl ContainerBackend for MockContainer {
    fn insert_child(&self, index: usize, child: Rc<dyn Any>) {
        self.0.state.borrow_mut().children.insert(index, child);
    }
    fn remove_child(&self, index: usize) {
        self.0.state.borrow_mut().children.remove(index);
    }
    fn child_count(&self) -> usize {
        self.0.state.borrow().children.len()
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

pub fn mock_value_backend() -> (Box<dyn ValueBackend>, Rc<MockControl>) {
    let control = MockControl::new(Value::Null);
    (Box::new(MockValue(Rc::clone(&control))), control)
}

pub fn mock_ranged_backend() -> (Box<dyn RangedBackend>, Rc<MockControl>) {
    let control = MockControl::new(Value::Int(0));
    (Box::new(MockRanged(Rc::clone(&control))), control)
}

pub fn mock_slider_backend() -> (Box<dyn SliderBackend>, Rc<MockControl>) {
    let control = MockControl::new(Value::Int(0));
    (Box::new(MockSlider(Rc::clone(&control))), control)
}

pub fn mock_button_backend() -> (Box<dyn ButtonBackend>, Rc<MockControl>) {
    let control = MockControl::new(Value::Null);
    (Box::new(MockButton(Rc::clone(&control))), control)
}

pub fn mock_categorical_backend() -> (Box<dyn CategoricalBackend>, Rc<MockControl>) {
    let control = MockControl::new(Value::Null);
    (Box::new(MockCategorical(Rc::clone(&control))), control)
}

pub fn mock_container_backend() -> (Box<dyn ContainerBackend>, Rc<MockControl>) {
    let control = MockControl::new(Value::Null);
    (Box::new(MockContainer(Rc::clone(&control))), control)
}

// ---------------------------------------------------------------------------
// MockFactory
// ---------------------------------------------------------------------------

/// A [`BackendFactory`] producing mock controls for every widget kind, and
/// remembering each control it created for later inspection.
#[derive(Default)]
pub struct MockFactory {
    created: RefCell<Vec<(WidgetKind, Rc<MockControl>)>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls created so far, in creation order.
    pub fn created(&self) -> Vec<(WidgetKind, Rc<MockControl>)> {
        self.created
            .borrow()
            .iter()
            .map(|(k, c)| (*k, Rc::clone(c)))
            .collect()
    }
}

impl BackendFactory for MockFactory {
    fn name(&self) -> &str {
        "mock"
    }

    fn create(&self, kind: WidgetKind) -> Result<BackendHandle, BackendError> {
        use crate::options::WidgetFamily;
        let control = MockControl::for_kind(kind);
        self.created.borrow_mut().push((kind, Rc::clone(&control)));
        Ok(match kind.family() {
            WidgetFamily::Value => BackendHandle::Value(Box::new(MockValue(control))),
            WidgetFamily::Ranged => BackendHandle::Ranged(Box::new(MockRanged(control))),
            WidgetFamily::Slider => BackendHandle::Slider(Box::new(MockSlider(control))),
            WidgetFamily::Button => BackendHandle::Button(Box::new(MockButton(control))),
            WidgetFamily::Categorical => {
                BackendHandle::Categorical(Box::new(MockCategorical(control)))
            }
            WidgetFamily::Sequence | WidgetFamily::Container => {
                BackendHandle::Container(Box::new(MockContainer(control)))
            }
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_input_fires_the_callback() {
        let (backend, control) = mock_value_backend();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        backend.on_change(Box::new(move |v| s.borrow_mut().push(v.clone())));
        control.simulate_input(&Value::Int(5));
        assert_eq!(*seen.borrow(), vec![Value::Int(5)]);
        assert_eq!(backend.value(), Value::Int(5));
    }

    #[test]
    fn programmatic_set_is_silent_unless_echoing() {
        let (backend, control) = mock_value_backend();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        backend.on_change(Box::new(move |_| c.set(c.get() + 1)));
        backend.set_value(&Value::Int(1));
        assert_eq!(count.get(), 0);
        control.set_echo(true);
        backend.set_value(&Value::Int(2));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn native_downcasts_to_the_control() {
        let (backend, control) = mock_value_backend();
        let native = backend.native().downcast::<MockControl>().unwrap();
        assert!(Rc::ptr_eq(&native, &control));
    }

    #[test]
    fn factory_covers_every_kind() {
        let factory = MockFactory::new();
        for kind in [
            WidgetKind::CheckBox,
            WidgetKind::PushButton,
            WidgetKind::SpinBox,
            WidgetKind::FloatSpinBox,
            WidgetKind::Slider,
            WidgetKind::FloatSlider,
            WidgetKind::LineEdit,
            WidgetKind::FileEdit,
            WidgetKind::LiteralEdit,
            WidgetKind::ComboBox,
            WidgetKind::RadioButtons,
            WidgetKind::Select,
            WidgetKind::ListEdit,
            WidgetKind::TupleEdit,
            WidgetKind::Empty,
            WidgetKind::Container,
        ] {
            assert!(factory.create(kind).is_ok(), "no mock for {kind}");
        }
        assert_eq!(factory.created().len(), 16);
    }
}
