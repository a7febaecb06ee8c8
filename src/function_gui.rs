//! Signature-bound GUIs.
//!
//! A [`FunctionGui`] mirrors a callable's parameter list as a container of
//! widgets, one per parameter, resolved through the registry. The widgets
//! are the single source of truth for argument values: calling with no
//! arguments reads every widget live, and [`signature`] reports the current
//! widget values as defaults.
//!
//! [`signature`]: FunctionGui::signature

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::backend::BackendFactory;
use crate::options::{WidgetDescriptor, WidgetKind, WidgetOptions};
use crate::reactive::Signal;
use crate::resolve::{resolve, ResolveRequest, TypeResolutionError};
use crate::types::{Namespace, TypeKey};
use crate::value::Value;
use crate::widget::{ValueError, Widget};
use crate::widgets::{create_widget, Container, ContainerError, WidgetCreationError};

/// Default call-button caption.
const CALL_BUTTON_TEXT: &str = "Run";

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// One declared parameter: a name, an optional annotation, and an optional
/// default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    annotation: Option<TypeKey>,
    default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }

    pub fn with_annotation(mut self, annotation: TypeKey) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> Option<&TypeKey> {
        self.annotation.as_ref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// An ordered parameter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, returning self for chained construction.
    pub fn with(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

// ---------------------------------------------------------------------------
// Call arguments
// ---------------------------------------------------------------------------

/// Arguments for one invocation.
///
/// Positional arguments bind to parameters in declaration order and keyword
/// arguments by name; any parameter not covered reads its widget's current
/// value. The callable receives a fully resolved set where every parameter
/// is present by name and by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl CallArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    pub fn keyword(mut self, name: impl Into<String>, value: Value) -> Self {
        self.keyword.insert(name.into(), value);
        self
    }

    /// The value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    /// The value at parameter position `index`, if any.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn len(&self) -> usize {
        self.positional.len().max(self.keyword.len())
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An invocation could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// An error raised by the callable itself; propagated unmodified.
    #[error("callable failed: {0}")]
    Callable(String),
    #[error("unknown parameter {0:?}")]
    UnknownParameter(String),
    #[error("parameter {0:?} was given both positionally and by keyword")]
    DuplicateArgument(String),
    #[error("too many positional arguments: {given} given, {expected} expected")]
    TooManyArguments { given: usize, expected: usize },
    #[error("a call is already in progress")]
    Reentrant,
    #[error(transparent)]
    Widget(#[from] ValueError),
}

/// Building a [`FunctionGui`] from a signature failed.
#[derive(Debug, thiserror::Error)]
pub enum FunctionGuiError {
    #[error("duplicate parameter name {0:?}")]
    DuplicateParameter(String),
    #[error("widgets do not match the signature (missing {missing:?}, extra {extra:?})")]
    SignatureMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },
    #[error(transparent)]
    Resolution(#[from] TypeResolutionError),
    #[error(transparent)]
    Creation(#[from] WidgetCreationError),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Construction options for a [`FunctionGui`].
#[derive(Default)]
pub struct FunctionGuiOptions {
    /// Whether to append a call button. Defaults to the opposite of
    /// `auto_call`.
    pub call_button: Option<bool>,
    /// Caption for the call button; defaults to `"Run"`.
    pub call_button_text: Option<String>,
    /// Invoke on every widget change instead of on demand.
    pub auto_call: bool,
    /// Append a read-only widget showing the last result.
    pub result_widget: bool,
    /// Per-parameter resolution overrides, keyed by parameter name.
    pub param_options: BTreeMap<String, WidgetOptions>,
    /// Namespace for deferred annotations in the signature.
    pub namespace: Namespace,
}

impl FunctionGuiOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_button(mut self, call_button: bool) -> Self {
        self.call_button = Some(call_button);
        self
    }

    pub fn with_call_button_text(mut self, text: impl Into<String>) -> Self {
        self.call_button_text = Some(text.into());
        self
    }

    pub fn with_auto_call(mut self) -> Self {
        self.auto_call = true;
        self
    }

    pub fn with_result_widget(mut self) -> Self {
        self.result_widget = true;
        self
    }

    pub fn with_param_options(
        mut self,
        name: impl Into<String>,
        options: WidgetOptions,
    ) -> Self {
        self.param_options.insert(name.into(), options);
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }
}

// ---------------------------------------------------------------------------
// FunctionGui
// ---------------------------------------------------------------------------

type Callable = Box<dyn FnMut(&CallArguments) -> Result<Value, CallError>>;

struct FunctionGuiInner {
    container: Container,
    callable: RefCell<Callable>,
    /// Declared parameters, in order. Defaults here are the declared ones;
    /// live defaults come from the widgets.
    parameters: Vec<Parameter>,
    call_button: Option<Rc<Widget>>,
    result_widget: Option<Rc<Widget>>,
    call_count: Cell<usize>,
    running: Cell<bool>,
    called: Signal<Value>,
}

/// A container of widgets bound to a callable's signature.
pub struct FunctionGui {
    inner: Rc<FunctionGuiInner>,
}

impl FunctionGui {
    /// Build the GUI for `signature`, resolving one widget per parameter
    /// against the process-wide registry.
    ///
    /// A parameter with a `bind` override gets an invisible placeholder
    /// widget instead of a resolved control; its bound value still flows
    /// into every call.
    pub fn new(
        factory: &Rc<dyn BackendFactory>,
        signature: Signature,
        callable: impl FnMut(&CallArguments) -> Result<Value, CallError> + 'static,
        options: FunctionGuiOptions,
    ) -> Result<Self, FunctionGuiError> {
        let mut seen = BTreeSet::new();
        for parameter in signature.parameters() {
            if !seen.insert(parameter.name().to_owned()) {
                return Err(FunctionGuiError::DuplicateParameter(
                    parameter.name().to_owned(),
                ));
            }
        }

        let container = match create_widget(factory, &WidgetDescriptor::new(WidgetKind::Container))?
        {
            Widget::Container(container) => container,
            other => {
                // The factory honored the Container contract or creation
                // would have failed; any other variant is a factory bug.
                return Err(WidgetCreationError::ContractMismatch {
                    kind: WidgetKind::Container,
                    expected: "Container",
                    got: other.kind().name(),
                }
                .into());
            }
        };

        for parameter in signature.parameters() {
            let overrides = options
                .param_options
                .get(parameter.name())
                .cloned()
                .unwrap_or_default();
            let descriptor = if overrides.bind.is_some() {
                // Bound parameters never show a control.
                let mut opts = overrides;
                if opts.visible.is_none() {
                    opts.visible = Some(false);
                }
                WidgetDescriptor::with_options(WidgetKind::Empty, opts)
            } else {
                let mut request = ResolveRequest::new()
                    .with_overrides(overrides)
                    .with_namespace(&options.namespace);
                if let Some(annotation) = parameter.annotation() {
                    request = request.with_annotation(annotation.clone());
                }
                if let Some(default) = parameter.default() {
                    request = request.with_value(default.clone());
                }
                resolve(request)?
            };
            let widget = create_widget(factory, &descriptor)?;
            widget.set_name(parameter.name());
            widget.set_annotation(parameter.annotation().cloned());
            container.push(Rc::new(widget))?;
        }

        // Every parameter must be covered by exactly one bindable child.
        let expected: BTreeSet<String> = signature
            .parameters()
            .iter()
            .map(|p| p.name().to_owned())
            .collect();
        let actual: BTreeSet<String> = container
            .children()
            .iter()
            .filter(|w| !w.gui_only())
            .map(|w| w.name())
            .collect();
        if expected != actual {
            return Err(FunctionGuiError::SignatureMismatch {
                missing: expected.difference(&actual).cloned().collect(),
                extra: actual.difference(&expected).cloned().collect(),
            });
        }

        let call_button = if options.call_button.unwrap_or(!options.auto_call) {
            let text = options
                .call_button_text
                .clone()
                .unwrap_or_else(|| CALL_BUTTON_TEXT.to_owned());
            let descriptor = WidgetDescriptor::with_options(
                WidgetKind::PushButton,
                WidgetOptions::new().with_text(text),
            );
            let widget = Rc::new(create_widget(factory, &descriptor)?);
            widget.set_gui_only(true);
            container.push(Rc::clone(&widget))?;
            Some(widget)
        } else {
            None
        };

        let result_widget = if options.result_widget {
            let descriptor = WidgetDescriptor::with_options(
                WidgetKind::LineEdit,
                WidgetOptions::new().with_enabled(false),
            );
            let widget = Rc::new(create_widget(factory, &descriptor)?);
            widget.set_gui_only(true);
            container.push(Rc::clone(&widget))?;
            Some(widget)
        } else {
            None
        };

        let inner = Rc::new(FunctionGuiInner {
            container,
            callable: RefCell::new(Box::new(callable)),
            parameters: signature.parameters.clone(),
            call_button,
            result_widget,
            call_count: Cell::new(0),
            running: Cell::new(false),
            called: Signal::new(),
        });

        if let Some(button) = &inner.call_button {
            if let Some(button) = button.as_button() {
                let weak = Rc::downgrade(&inner);
                button.clicked().connect(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        FunctionGuiInner::triggered(&inner);
                    }
                });
            }
        }
        if options.auto_call {
            let weak = Rc::downgrade(&inner);
            inner.container.changed().connect(move |_| {
                let Some(inner) = weak.upgrade() else { return };
                if inner.running.get() {
                    return;
                }
                if let Err(error) = inner.call(&CallArguments::new()) {
                    tracing::debug!(%error, "auto-call invocation failed");
                }
            });
        }

        Ok(Self { inner })
    }

    /// The container holding the parameter widgets (and any call button or
    /// result widget, marked `gui_only`).
    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    /// The widget bound to parameter `name`.
    pub fn widget(&self, name: &str) -> Option<Rc<Widget>> {
        self.inner
            .container
            .get(name)
            .filter(|w| !w.gui_only())
    }

    pub fn call_button(&self) -> Option<Rc<Widget>> {
        self.inner.call_button.clone()
    }

    pub fn result_widget(&self) -> Option<Rc<Widget>> {
        self.inner.result_widget.clone()
    }

    /// Emitted with the result after every successful call.
    pub fn called(&self) -> &Signal<Value> {
        &self.inner.called
    }

    /// Invoke the callable. Positional and keyword arguments take priority;
    /// every other parameter reads its widget's current value.
    pub fn call(&self, arguments: &CallArguments) -> Result<Value, CallError> {
        self.inner.call(arguments)
    }

    /// Successful invocations so far.
    pub fn call_count(&self) -> usize {
        self.inner.call_count.get()
    }

    pub fn reset_call_count(&self) {
        self.inner.call_count.set(0);
    }

    /// The signature with live defaults: each parameter's default is its
    /// widget's current value.
    pub fn signature(&self) -> Signature {
        let parameters = self
            .inner
            .parameters
            .iter()
            .map(|declared| {
                let mut parameter = declared.clone();
                if let Some(widget) = self.widget(declared.name()) {
                    if let Ok(value) = widget.value() {
                        parameter.default = Some(value);
                    }
                }
                parameter
            })
            .collect();
        Signature { parameters }
    }

    /// Push values into parameter widgets by name.
    pub fn update_widgets(
        &self,
        values: &BTreeMap<String, Value>,
    ) -> Result<(), CallError> {
        for (name, value) in values {
            let widget = self
                .widget(name)
                .ok_or_else(|| CallError::UnknownParameter(name.clone()))?;
            widget.set_value(value)?;
        }
        Ok(())
    }

    /// Re-query every parameter widget's dynamic choices.
    pub fn reset_choices(&self) -> bool {
        self.inner.container.reset_choices()
    }
}

impl std::fmt::Debug for FunctionGui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionGui")
            .field("parameters", &self.inner.parameters.len())
            .field("call_count", &self.inner.call_count.get())
            .finish()
    }
}

/// Clears the running flag when an invocation ends, however it ends.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Re-enables the call button when a button-triggered invocation ends.
struct ReenableGuard<'a>(&'a Widget);

impl Drop for ReenableGuard<'_> {
    fn drop(&mut self) {
        self.0.set_enabled(true);
    }
}

impl FunctionGuiInner {
    /// Parameter widgets, in declaration order.
    fn bindable(&self) -> Vec<Rc<Widget>> {
        self.container
            .children()
            .into_iter()
            .filter(|w| !w.gui_only())
            .collect()
    }

    fn call(&self, arguments: &CallArguments) -> Result<Value, CallError> {
        if self.running.get() {
            return Err(CallError::Reentrant);
        }
        let widgets = self.bindable();
        if arguments.positional.len() > widgets.len() {
            return Err(CallError::TooManyArguments {
                given: arguments.positional.len(),
                expected: widgets.len(),
            });
        }
        for key in arguments.keyword.keys() {
            if !widgets.iter().any(|w| &w.name() == key) {
                return Err(CallError::UnknownParameter(key.clone()));
            }
        }

        let mut resolved = CallArguments::new();
        for (index, widget) in widgets.iter().enumerate() {
            let name = widget.name();
            let value = if index < arguments.positional.len() {
                if arguments.keyword.contains_key(&name) {
                    return Err(CallError::DuplicateArgument(name));
                }
                arguments.positional[index].clone()
            } else if let Some(value) = arguments.keyword.get(&name) {
                value.clone()
            } else {
                widget.value()?
            };
            resolved.positional.push(value.clone());
            resolved.keyword.insert(name, value);
        }

        self.running.set(true);
        let _running = RunningGuard(&self.running);
        let value = (self.callable.borrow_mut())(&resolved)?;
        self.call_count.set(self.call_count.get() + 1);
        self.called.emit(&value);
        if let Some(result_widget) = &self.result_widget {
            // Showing the result is not an observable change.
            let _mute = result_widget.changed().blocked();
            if let Err(error) = result_widget.set_value(&Value::Str(value.to_string())) {
                tracing::debug!(%error, "result widget rejected the call result");
            }
        }
        Ok(value)
    }

    /// Call-button path: the button is disabled for the duration and any
    /// error is logged, not surfaced.
    fn triggered(inner: &Rc<Self>) {
        let _reenable = inner.call_button.as_deref().map(|button| {
            button.set_enabled(false);
            ReenableGuard(button)
        });
        if let Err(error) = inner.call(&CallArguments::new()) {
            tracing::debug!(%error, "call-button invocation failed");
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Binding;
    use crate::testing::MockFactory;
    use pretty_assertions::assert_eq;

    fn factory() -> Rc<dyn BackendFactory> {
        Rc::new(MockFactory::new())
    }

    fn int_param(name: &str, default: i64) -> Parameter {
        Parameter::new(name)
            .with_annotation(TypeKey::int())
            .with_default(Value::Int(default))
    }

    fn adder() -> impl FnMut(&CallArguments) -> Result<Value, CallError> {
        |args: &CallArguments| {
            let x = args.get("x").and_then(Value::as_int).unwrap_or(0);
            let y = args.get("y").and_then(Value::as_int).unwrap_or(0);
            Ok(Value::Int(x + y))
        }
    }

    fn xy_signature() -> Signature {
        Signature::new().with(int_param("x", 1)).with(int_param("y", 2))
    }

    #[test]
    fn one_widget_per_parameter_in_declaration_order() {
        let f = factory();
        let sig = Signature::new()
            .with(int_param("count", 3))
            .with(
                Parameter::new("label")
                    .with_annotation(TypeKey::string())
                    .with_default(Value::Str("hi".into())),
            );
        let gui = FunctionGui::new(&f, sig, |_| Ok(Value::Null), FunctionGuiOptions::new())
            .unwrap();

        let names: Vec<String> = gui
            .container()
            .children()
            .iter()
            .filter(|w| !w.gui_only())
            .map(|w| w.name())
            .collect();
        assert_eq!(names, vec!["count", "label"]);
        assert_eq!(gui.widget("count").unwrap().kind(), WidgetKind::SpinBox);
        assert_eq!(gui.widget("label").unwrap().kind(), WidgetKind::LineEdit);
        assert!(gui.call_button().is_some());
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let f = factory();
        let sig = Signature::new().with(int_param("x", 0)).with(int_param("x", 1));
        let err = FunctionGui::new(&f, sig, |_| Ok(Value::Null), FunctionGuiOptions::new())
            .unwrap_err();
        assert!(matches!(err, FunctionGuiError::DuplicateParameter(n) if n == "x"));
    }

    #[test]
    fn call_reads_live_widget_values() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();

        assert_eq!(gui.call(&CallArguments::new()).unwrap(), Value::Int(3));
        gui.widget("x").unwrap().set_value(&Value::Int(10)).unwrap();
        assert_eq!(gui.call(&CallArguments::new()).unwrap(), Value::Int(12));
        assert_eq!(gui.call_count(), 2);
    }

    #[test]
    fn explicit_arguments_override_widget_values() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();

        let args = CallArguments::new()
            .positional(Value::Int(5))
            .keyword("y", Value::Int(7));
        assert_eq!(gui.call(&args).unwrap(), Value::Int(12));
        // The widgets themselves are untouched.
        assert_eq!(gui.widget("x").unwrap().value().unwrap(), Value::Int(1));
        assert_eq!(gui.widget("y").unwrap().value().unwrap(), Value::Int(2));
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();
        let err = gui
            .call(&CallArguments::new().keyword("z", Value::Int(1)))
            .unwrap_err();
        assert!(matches!(err, CallError::UnknownParameter(n) if n == "z"));
    }

    #[test]
    fn excess_positionals_are_rejected() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();
        let args = CallArguments::new()
            .positional(Value::Int(1))
            .positional(Value::Int(2))
            .positional(Value::Int(3));
        let err = gui.call(&args).unwrap_err();
        assert!(matches!(
            err,
            CallError::TooManyArguments { given: 3, expected: 2 }
        ));
    }

    #[test]
    fn positional_and_keyword_for_same_parameter_is_rejected() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();
        let args = CallArguments::new()
            .positional(Value::Int(1))
            .keyword("x", Value::Int(2));
        let err = gui.call(&args).unwrap_err();
        assert!(matches!(err, CallError::DuplicateArgument(n) if n == "x"));
    }

    #[test]
    fn call_count_counts_successes_only() {
        let f = factory();
        let fail = Rc::new(Cell::new(true));
        let flag = fail.clone();
        let gui = FunctionGui::new(
            &f,
            xy_signature(),
            move |_| {
                if flag.get() {
                    Err(CallError::Callable("nope".into()))
                } else {
                    Ok(Value::Null)
                }
            },
            FunctionGuiOptions::new(),
        )
        .unwrap();

        assert!(gui.call(&CallArguments::new()).is_err());
        assert_eq!(gui.call_count(), 0);
        fail.set(false);
        gui.call(&CallArguments::new()).unwrap();
        assert_eq!(gui.call_count(), 1);
        gui.reset_call_count();
        assert_eq!(gui.call_count(), 0);
    }

    #[test]
    fn bound_parameter_is_hidden_and_supplies_its_value() {
        let f = factory();
        let sig = Signature::new().with(Parameter::new("x")).with(int_param("y", 2));
        let options = FunctionGuiOptions::new().with_param_options(
            "x",
            WidgetOptions::new().with_bind(Binding::Fixed(Value::Int(40))),
        );
        let gui = FunctionGui::new(&f, sig, adder(), options).unwrap();

        let x = gui.widget("x").unwrap();
        assert_eq!(x.kind(), WidgetKind::Empty);
        assert!(!x.visible());
        assert_eq!(gui.call(&CallArguments::new()).unwrap(), Value::Int(42));
    }

    #[test]
    fn auto_call_fires_once_per_observable_change() {
        let f = factory();
        let options = FunctionGuiOptions::new().with_auto_call();
        let gui = FunctionGui::new(&f, xy_signature(), adder(), options).unwrap();
        assert!(gui.call_button().is_none());

        gui.widget("x").unwrap().set_value(&Value::Int(5)).unwrap();
        assert_eq!(gui.call_count(), 1);
        // Setting the same value again is not an observable change.
        gui.widget("x").unwrap().set_value(&Value::Int(5)).unwrap();
        assert_eq!(gui.call_count(), 1);
    }

    #[test]
    fn call_button_caption_defaults_to_run() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();
        let button = gui.call_button().unwrap();
        assert_eq!(button.as_button().unwrap().text(), "Run");

        let gui = FunctionGui::new(
            &f,
            xy_signature(),
            adder(),
            FunctionGuiOptions::new().with_call_button_text("Go"),
        )
        .unwrap();
        assert_eq!(gui.call_button().unwrap().as_button().unwrap().text(), "Go");
    }

    #[test]
    fn call_button_click_invokes_and_reenables() {
        let mock = Rc::new(MockFactory::new());
        let f: Rc<dyn BackendFactory> = mock.clone();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();

        let (_, control) = mock
            .created()
            .into_iter()
            .find(|(kind, _)| *kind == WidgetKind::PushButton)
            .unwrap();
        control.simulate_click();
        assert_eq!(gui.call_count(), 1);
        assert!(gui.call_button().unwrap().enabled());
    }

    #[test]
    fn result_widget_shows_the_last_result() {
        let f = factory();
        let options = FunctionGuiOptions::new().with_result_widget();
        let gui = FunctionGui::new(&f, xy_signature(), adder(), options).unwrap();

        gui.call(&CallArguments::new()).unwrap();
        let result = gui.result_widget().unwrap();
        assert_eq!(result.value().unwrap(), Value::Str("3".into()));
        assert!(!result.enabled());
        assert!(result.gui_only());
    }

    #[test]
    fn called_fires_before_the_result_widget_updates() {
        let f = factory();
        let options = FunctionGuiOptions::new().with_result_widget();
        let gui = FunctionGui::new(&f, xy_signature(), adder(), options).unwrap();
        gui.call(&CallArguments::new()).unwrap();
        let result = gui.result_widget().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (sink, shown) = (seen.clone(), Rc::clone(&result));
        gui.called()
            .connect(move |_| sink.borrow_mut().push(shown.value().unwrap()));
        gui.widget("x").unwrap().set_value(&Value::Int(10)).unwrap();
        gui.call(&CallArguments::new()).unwrap();

        // The handler still saw the previous result on display.
        assert_eq!(*seen.borrow(), vec![Value::Str("3".into())]);
        assert_eq!(result.value().unwrap(), Value::Str("12".into()));
    }

    #[test]
    fn called_signal_carries_the_result() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        gui.called().connect(move |v: &Value| sink.borrow_mut().push(v.clone()));
        gui.call(&CallArguments::new()).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::Int(3)]);
    }

    #[test]
    fn signature_reports_live_defaults() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();
        gui.widget("x").unwrap().set_value(&Value::Int(9)).unwrap();
        let sig = gui.signature();
        assert_eq!(sig.get("x").unwrap().default(), Some(&Value::Int(9)));
        assert_eq!(sig.get("y").unwrap().default(), Some(&Value::Int(2)));
        assert_eq!(sig.get("x").unwrap().annotation(), Some(&TypeKey::int()));
    }

    #[test]
    fn update_widgets_sets_values_by_name() {
        let f = factory();
        let gui =
            FunctionGui::new(&f, xy_signature(), adder(), FunctionGuiOptions::new()).unwrap();
        let mut values = BTreeMap::new();
        values.insert("x".to_owned(), Value::Int(7));
        gui.update_widgets(&values).unwrap();
        assert_eq!(gui.widget("x").unwrap().value().unwrap(), Value::Int(7));

        let mut bogus = BTreeMap::new();
        bogus.insert("nope".to_owned(), Value::Int(1));
        assert!(matches!(
            gui.update_widgets(&bogus),
            Err(CallError::UnknownParameter(_))
        ));
    }
}
