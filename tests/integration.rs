//! Integration tests for autoform.
//!
//! These tests exercise the public API from outside the crate: resolution,
//! widget construction over the in-memory backend, containers, registry
//! scoping, and signature-bound GUIs working together.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use autoform::function_gui::{CallArguments, FunctionGui, FunctionGuiOptions, Parameter, Signature};
use autoform::testing::MockFactory;
use autoform::{
    create_widget, resolve, Binding, ChoicesSource, RegistryRule, RegistryScope, ResolveRequest,
    TypeKey, Value, Widget, WidgetKind, WidgetOptions,
};
use autoform::{BackendFactory, WidgetDescriptor};

fn factory() -> Rc<dyn BackendFactory> {
    Rc::new(MockFactory::new())
}

// ---------------------------------------------------------------------------
// Resolution to live widgets
// ---------------------------------------------------------------------------

#[test]
fn test_annotation_value_round_trip() {
    let f = factory();
    let cases = [
        (TypeKey::boolean(), Value::Bool(true)),
        (TypeKey::int(), Value::Int(7)),
        (TypeKey::float(), Value::Float(2.5)),
        (TypeKey::string(), Value::Str("hello".into())),
    ];
    for (annotation, value) in cases {
        let descriptor = resolve(
            ResolveRequest::new()
                .with_annotation(annotation.clone())
                .with_value(value.clone()),
        )
        .unwrap();
        let widget = create_widget(&f, &descriptor).unwrap();
        assert_eq!(widget.value().unwrap(), value, "for {annotation:?}");
    }
}

#[test]
fn test_bool_value_never_resolves_as_int() {
    let f = factory();
    let descriptor = resolve(ResolveRequest::new().with_value(Value::Bool(false))).unwrap();
    let widget = create_widget(&f, &descriptor).unwrap();
    assert_eq!(widget.kind(), WidgetKind::CheckBox);
    assert_eq!(widget.value().unwrap(), Value::Bool(false));
}

#[test]
fn test_annotated_metadata_flows_into_the_widget() {
    let f = factory();
    let annotation = TypeKey::annotated(
        TypeKey::int(),
        WidgetOptions::new()
            .with_widget_type(WidgetKind::Slider)
            .with_min(0.0)
            .with_max(10.0),
    );
    let descriptor = resolve(
        ResolveRequest::new()
            .with_annotation(annotation)
            .with_value(Value::Int(50)),
    )
    .unwrap();
    let widget = create_widget(&f, &descriptor).unwrap();
    assert_eq!(widget.kind(), WidgetKind::Slider);
    // The range was installed before the value, which clamped.
    assert_eq!(widget.value().unwrap(), Value::Int(10));
}

#[test]
fn test_explicit_overrides_beat_annotated_metadata() {
    let annotation = TypeKey::annotated(
        TypeKey::int(),
        WidgetOptions::new().with_widget_type(WidgetKind::Slider),
    );
    let descriptor = resolve(
        ResolveRequest::new()
            .with_annotation(annotation)
            .with_overrides(WidgetOptions::new().with_widget_type(WidgetKind::SpinBox)),
    )
    .unwrap();
    assert_eq!(descriptor.kind, WidgetKind::SpinBox);
}

#[test]
fn test_enum_annotation_builds_a_populated_combo_box() {
    let f = factory();
    let descriptor = resolve(
        ResolveRequest::new().with_annotation(TypeKey::enumeration("Color", ["Red", "Green"])),
    )
    .unwrap();
    let widget = create_widget(&f, &descriptor).unwrap();
    assert_eq!(widget.kind(), WidgetKind::ComboBox);
    let combo = widget.as_categorical().unwrap();
    widget
        .set_value(&Value::Enum {
            type_name: "Color".into(),
            variant: "Green".into(),
        })
        .unwrap();
    assert_eq!(combo.current_choice().as_deref(), Some("Green"));
}

#[test]
fn test_optional_int_with_null_default_builds_a_nullable_spinbox() {
    let f = factory();
    let descriptor = resolve(
        ResolveRequest::new()
            .with_annotation(TypeKey::optional(TypeKey::int()))
            .with_value(Value::Null),
    )
    .unwrap();
    assert_eq!(descriptor.kind, WidgetKind::SpinBox);

    let widget = create_widget(&f, &descriptor).unwrap();
    assert!(widget.nullable());
    assert_eq!(widget.value().unwrap(), Value::Null);
    widget.set_value(&Value::Int(5)).unwrap();
    assert_eq!(widget.value().unwrap(), Value::Int(5));
    widget.set_value(&Value::Null).unwrap();
    assert_eq!(widget.value().unwrap(), Value::Null);
}

// ---------------------------------------------------------------------------
// Registry scoping
// ---------------------------------------------------------------------------

#[test]
fn test_scoped_registration_reverts_on_drop() {
    let annotation = TypeKey::named_with_bases("Radius", vec!["float".into()]);
    {
        let mut scope = RegistryScope::new();
        scope
            .register_type("Radius", RegistryRule::widget(WidgetKind::FloatSlider))
            .unwrap();
        let inside = resolve(ResolveRequest::new().with_annotation(annotation.clone())).unwrap();
        assert_eq!(inside.kind, WidgetKind::FloatSlider);
    }
    // Scope dropped: the base-type walk takes over again.
    let outside = resolve(ResolveRequest::new().with_annotation(annotation)).unwrap();
    assert_eq!(outside.kind, WidgetKind::FloatSpinBox);
}

// ---------------------------------------------------------------------------
// Widget change propagation
// ---------------------------------------------------------------------------

#[test]
fn test_cross_connected_widgets_do_not_recurse() {
    let f = factory();
    let spin = Rc::new(
        create_widget(&f, &WidgetDescriptor::new(WidgetKind::SpinBox)).unwrap(),
    );
    let slider = Rc::new(
        create_widget(&f, &WidgetDescriptor::new(WidgetKind::Slider)).unwrap(),
    );

    // Mirror each widget into the other; value equality breaks the loop.
    let (a, b) = (Rc::clone(&spin), Rc::clone(&slider));
    spin.changed().connect(move |v: &Value| {
        let _ = b.set_value(v);
    });
    slider.changed().connect(move |v: &Value| {
        let _ = a.set_value(v);
    });

    spin.set_value(&Value::Int(5)).unwrap();
    assert_eq!(spin.value().unwrap(), Value::Int(5));
    assert_eq!(slider.value().unwrap(), Value::Int(5));
}

#[test]
fn test_container_rejects_duplicate_names_and_keeps_order() {
    let f = factory();
    let container = match create_widget(&f, &WidgetDescriptor::new(WidgetKind::Container)).unwrap()
    {
        Widget::Container(c) => c,
        other => panic!("expected a container, got {other:?}"),
    };

    for name in ["first", "second"] {
        let w = create_widget(&f, &WidgetDescriptor::new(WidgetKind::LineEdit)).unwrap();
        w.set_name(name);
        container.push(Rc::new(w)).unwrap();
    }
    let dup = create_widget(&f, &WidgetDescriptor::new(WidgetKind::LineEdit)).unwrap();
    dup.set_name("first");
    assert!(container.push(Rc::new(dup)).is_err());

    let names: Vec<String> = container.children().iter().map(|w| w.name()).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(container.index_of("second"), Some(1));
}

#[test]
fn test_choices_refresh_is_idempotent_and_consolidated() {
    let f = factory();
    let counter = Rc::new(Cell::new(0));
    let c = counter.clone();
    let descriptor = WidgetDescriptor::with_options(
        WidgetKind::ComboBox,
        WidgetOptions::new().with_choices(ChoicesSource::dynamic(move || {
            c.set(c.get() + 1);
            vec![
                ("one".to_owned(), Value::Int(1)),
                ("two".to_owned(), Value::Int(2)),
            ]
        })),
    );
    let widget = Rc::new(create_widget(&f, &descriptor).unwrap());

    let emissions = Rc::new(Cell::new(0));
    let e = emissions.clone();
    widget.changed().connect(move |_| e.set(e.get() + 1));

    // The source yields the same pairs every time: re-querying must touch
    // nothing and emit nothing, however often it runs.
    assert!(!widget.reset_choices());
    assert!(!widget.reset_choices());
    assert_eq!(emissions.get(), 0);
    assert!(counter.get() >= 2);
}

// ---------------------------------------------------------------------------
// FunctionGui end to end
// ---------------------------------------------------------------------------

fn scale_signature() -> Signature {
    Signature::new()
        .with(
            Parameter::new("amount")
                .with_annotation(TypeKey::int())
                .with_default(Value::Int(2)),
        )
        .with(
            Parameter::new("factor")
                .with_annotation(TypeKey::int())
                .with_default(Value::Int(10)),
        )
}

fn scale(args: &CallArguments) -> Result<Value, autoform::CallError> {
    let amount = args.get("amount").and_then(Value::as_int).unwrap_or(0);
    let factor = args.get("factor").and_then(Value::as_int).unwrap_or(0);
    Ok(Value::Int(amount * factor))
}

#[test]
fn test_function_gui_uses_widgets_as_live_defaults() {
    let f = factory();
    let gui = FunctionGui::new(&f, scale_signature(), scale, FunctionGuiOptions::new()).unwrap();

    assert_eq!(gui.call(&CallArguments::new()).unwrap(), Value::Int(20));
    gui.widget("amount").unwrap().set_value(&Value::Int(5)).unwrap();
    assert_eq!(gui.call(&CallArguments::new()).unwrap(), Value::Int(50));
    assert_eq!(
        gui.signature().get("amount").unwrap().default(),
        Some(&Value::Int(5))
    );
}

#[test]
fn test_function_gui_arguments_override_without_touching_widgets() {
    let f = factory();
    let gui = FunctionGui::new(&f, scale_signature(), scale, FunctionGuiOptions::new()).unwrap();

    let args = CallArguments::new().keyword("factor", Value::Int(100));
    assert_eq!(gui.call(&args).unwrap(), Value::Int(200));
    assert_eq!(
        gui.widget("factor").unwrap().value().unwrap(),
        Value::Int(10)
    );
}

#[test]
fn test_function_gui_auto_call_and_result_widget() {
    let f = factory();
    let options = FunctionGuiOptions::new().with_auto_call().with_result_widget();
    let gui = FunctionGui::new(&f, scale_signature(), scale, options).unwrap();
    assert!(gui.call_button().is_none());

    gui.widget("amount").unwrap().set_value(&Value::Int(3)).unwrap();
    assert_eq!(gui.call_count(), 1);
    assert_eq!(
        gui.result_widget().unwrap().value().unwrap(),
        Value::Str("30".into())
    );
    // Updating the result widget is not itself a change: no second call.
    assert_eq!(gui.call_count(), 1);
}

#[test]
fn test_function_gui_bound_parameter_stays_hidden() {
    let f = factory();
    let options = FunctionGuiOptions::new().with_param_options(
        "factor",
        WidgetOptions::new().with_bind(Binding::Fixed(Value::Int(1000))),
    );
    let gui = FunctionGui::new(&f, scale_signature(), scale, options).unwrap();

    let factor = gui.widget("factor").unwrap();
    assert_eq!(factor.kind(), WidgetKind::Empty);
    assert!(!factor.visible());
    assert_eq!(gui.call(&CallArguments::new()).unwrap(), Value::Int(2000));
}

#[test]
fn test_function_gui_update_widgets() {
    let f = factory();
    let gui = FunctionGui::new(&f, scale_signature(), scale, FunctionGuiOptions::new()).unwrap();

    let mut values = BTreeMap::new();
    values.insert("amount".to_owned(), Value::Int(4));
    values.insert("factor".to_owned(), Value::Int(25));
    gui.update_widgets(&values).unwrap();
    assert_eq!(gui.call(&CallArguments::new()).unwrap(), Value::Int(100));
}

// ---------------------------------------------------------------------------
// Composite editors
// ---------------------------------------------------------------------------

#[test]
fn test_list_annotation_round_trips_values() {
    let f = factory();
    let descriptor = resolve(
        ResolveRequest::new()
            .with_annotation(TypeKey::sequence(TypeKey::int()))
            .with_value(Value::List(vec![Value::Int(1), Value::Int(2)])),
    )
    .unwrap();
    let widget = create_widget(&f, &descriptor).unwrap();
    assert_eq!(widget.kind(), WidgetKind::ListEdit);
    assert_eq!(
        widget.value().unwrap(),
        Value::List(vec![Value::Int(1), Value::Int(2)])
    );

    widget
        .set_value(&Value::List(vec![Value::Int(9)]))
        .unwrap();
    assert_eq!(widget.value().unwrap(), Value::List(vec![Value::Int(9)]));
}

#[test]
fn test_tuple_annotation_enforces_arity() {
    let f = factory();
    let descriptor = resolve(
        ResolveRequest::new()
            .with_annotation(TypeKey::tuple(vec![TypeKey::int(), TypeKey::string()])),
    )
    .unwrap();
    let widget = create_widget(&f, &descriptor).unwrap();
    assert_eq!(widget.kind(), WidgetKind::TupleEdit);

    widget
        .set_value(&Value::Tuple(vec![Value::Int(1), Value::Str("a".into())]))
        .unwrap();
    assert!(widget.set_value(&Value::Tuple(vec![Value::Int(1)])).is_err());
}
