//! Widget construction from resolved descriptors.

use std::rc::Rc;

use crate::backend::{BackendError, BackendFactory, BackendHandle};
use crate::options::{WidgetDescriptor, WidgetFamily, WidgetKind, WidgetOptions};
use crate::value::Value;
use crate::widget::{ValueError, Widget};
use crate::widgets::{
    ButtonWidget, CategoricalWidget, Container, ListEdit, RangedWidget, SliderWidget, TupleEdit,
    ValueWidget,
};

/// A resolved descriptor's options are invalid for the chosen widget.
/// Surfaced at construction time, never deferred.
#[derive(Debug, thiserror::Error)]
pub enum WidgetCreationError {
    #[error("unknown option {key:?} for widget {kind}")]
    UnknownOption { kind: WidgetKind, key: String },
    #[error("option {option:?} is not supported by widget {kind}")]
    UnsupportedOption {
        kind: WidgetKind,
        option: &'static str,
    },
    #[error("widget {kind} requires the {option:?} option")]
    MissingOption {
        kind: WidgetKind,
        option: &'static str,
    },
    #[error("backend supplied a {got} control where {kind} needs {expected}")]
    ContractMismatch {
        kind: WidgetKind,
        expected: &'static str,
        got: &'static str,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("initial options could not be applied: {0}")]
    Apply(#[from] ValueError),
}

/// Instantiate the widget a descriptor names and apply its options.
///
/// Unknown option keys and options the widget kind cannot honor fail here,
/// loudly: nothing is silently dropped.
pub fn create_widget(
    factory: &Rc<dyn BackendFactory>,
    descriptor: &WidgetDescriptor,
) -> Result<Widget, WidgetCreationError> {
    let kind = descriptor.kind;
    let options = &descriptor.options;
    validate_options(kind, options)?;

    tracing::debug!(widget = %kind, backend = factory.name(), "creating widget");

    let widget = match kind.family() {
        WidgetFamily::Value => {
            let backend = expect_value(kind, factory.create(kind)?)?;
            Widget::Value(ValueWidget::new(kind, backend))
        }
        WidgetFamily::Ranged => {
            let backend = expect_ranged(kind, factory.create(kind)?)?;
            Widget::Ranged(RangedWidget::new(kind, backend))
        }
        WidgetFamily::Slider => {
            let backend = expect_slider(kind, factory.create(kind)?)?;
            Widget::Slider(SliderWidget::new(kind, backend))
        }
        WidgetFamily::Button => {
            let backend = expect_button(kind, factory.create(kind)?)?;
            Widget::Button(ButtonWidget::new(kind, backend))
        }
        WidgetFamily::Categorical => {
            let backend = expect_categorical(kind, factory.create(kind)?)?;
            Widget::Categorical(CategoricalWidget::new(kind, backend))
        }
        WidgetFamily::Sequence => {
            let backend = expect_container(kind, factory.create(kind)?)?;
            match kind {
                WidgetKind::ListEdit => {
                    let element = options.element.as_deref().cloned().ok_or(
                        WidgetCreationError::MissingOption {
                            kind,
                            option: "element",
                        },
                    )?;
                    Widget::List(ListEdit::new(element, Rc::clone(factory), backend))
                }
                _ => {
                    let descriptors = options.elements.clone().ok_or(
                        WidgetCreationError::MissingOption {
                            kind,
                            option: "elements",
                        },
                    )?;
                    Widget::Tuple(TupleEdit::new(&descriptors, factory, backend)?)
                }
            }
        }
        WidgetFamily::Container => {
            let backend = expect_container(kind, factory.create(kind)?)?;
            Widget::Container(Container::new(backend))
        }
    };

    apply_options(&widget, options)?;
    Ok(widget)
}

/// Reject option keys the chosen kind cannot honor.
fn validate_options(kind: WidgetKind, options: &WidgetOptions) -> Result<(), WidgetCreationError> {
    if let Some(key) = options.extra.keys().next() {
        return Err(WidgetCreationError::UnknownOption {
            kind,
            key: key.clone(),
        });
    }
    let family = kind.family();
    let ranged = matches!(family, WidgetFamily::Ranged | WidgetFamily::Slider);
    let unsupported = |option| Err(WidgetCreationError::UnsupportedOption { kind, option });

    if options.choices.is_some() && family != WidgetFamily::Categorical {
        return unsupported("choices");
    }
    // Composite widgets compute their value from children and have no
    // null state to offer.
    if options.nullable.is_some()
        && matches!(family, WidgetFamily::Sequence | WidgetFamily::Container)
    {
        return unsupported("nullable");
    }
    if !ranged {
        if options.min.is_some() {
            return unsupported("min");
        }
        if options.max.is_some() {
            return unsupported("max");
        }
        if options.step.is_some() {
            return unsupported("step");
        }
        if options.range_policy.is_some() {
            return unsupported("range_policy");
        }
    }
    if options.orientation.is_some()
        && !matches!(family, WidgetFamily::Slider | WidgetFamily::Container)
    {
        return unsupported("orientation");
    }
    if options.readout.is_some() && family != WidgetFamily::Slider {
        return unsupported("readout");
    }
    if options.text.is_some() && family != WidgetFamily::Button {
        return unsupported("text");
    }
    if options.element.is_some() && kind != WidgetKind::ListEdit {
        return unsupported("element");
    }
    if options.elements.is_some() && kind != WidgetKind::TupleEdit {
        return unsupported("elements");
    }
    if options.value.is_some() && family == WidgetFamily::Container {
        return unsupported("value");
    }
    Ok(())
}

/// Apply constructor options. Constraints (range, choices) are installed
/// before the initial value so it is judged against them.
fn apply_options(widget: &Widget, options: &WidgetOptions) -> Result<(), WidgetCreationError> {
    if let Some(label) = &options.label {
        widget.set_label(label);
    }
    if let Some(tooltip) = &options.tooltip {
        widget.set_tooltip(tooltip);
    }
    if let Some(visible) = options.visible {
        widget.set_visible(visible);
    }
    if let Some(enabled) = options.enabled {
        widget.set_enabled(enabled);
    }
    // Before the initial value, so a Null default lands in a widget that
    // already admits it.
    if let Some(nullable) = options.nullable {
        widget.set_nullable(nullable);
    }

    match widget {
        Widget::Ranged(w) => {
            if let Some(policy) = options.range_policy {
                w.set_range_policy(policy);
            }
            if let Some(min) = options.min {
                w.set_minimum(min);
            }
            if let Some(max) = options.max {
                w.set_maximum(max);
            }
            if let Some(step) = options.step {
                w.set_step(step);
            }
        }
        Widget::Slider(w) => {
            if let Some(policy) = options.range_policy {
                w.set_range_policy(policy);
            }
            if let Some(min) = options.min {
                w.set_minimum(min);
            }
            if let Some(max) = options.max {
                w.set_maximum(max);
            }
            if let Some(step) = options.step {
                w.set_step(step);
            }
            if let Some(orientation) = options.orientation {
                w.set_orientation(orientation);
            }
            if let Some(readout) = options.readout {
                w.set_readout_visible(readout);
            }
        }
        Widget::Button(w) => {
            if let Some(text) = &options.text {
                w.set_text(text);
            }
        }
        Widget::Categorical(w) => {
            if let Some(choices) = &options.choices {
                w.set_choices(choices.clone());
            }
        }
        Widget::Container(w) => {
            if let Some(orientation) = options.orientation {
                w.set_orientation(orientation);
            }
        }
        _ => {}
    }

    if let Some(binding) = &options.bind {
        widget.set_bind(binding.clone());
    }
    if let Some(value) = &options.value {
        // A mute initial set: construction is not an observable change.
        let _guard = widget.changed().blocked();
        widget.set_value(value).map_err(WidgetCreationError::Apply)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handle matching
// ---------------------------------------------------------------------------

macro_rules! expect_handle {
    ($fn_name:ident, $variant:ident, $trait_obj:ty) => {
        fn $fn_name(
            kind: WidgetKind,
            handle: BackendHandle,
        ) -> Result<Box<$trait_obj>, WidgetCreationError> {
            match handle {
                BackendHandle::$variant(backend) => Ok(backend),
                other => Err(WidgetCreationError::ContractMismatch {
                    kind,
                    expected: stringify!($variant),
                    got: other.contract_name(),
                }),
            }
        }
    };
}

expect_handle!(expect_value, Value, dyn crate::backend::ValueBackend);
expect_handle!(expect_ranged, Ranged, dyn crate::backend::RangedBackend);
expect_handle!(expect_slider, Slider, dyn crate::backend::SliderBackend);
expect_handle!(expect_button, Button, dyn crate::backend::ButtonBackend);
expect_handle!(
    expect_categorical,
    Categorical,
    dyn crate::backend::CategoricalBackend
);
expect_handle!(
    expect_container,
    Container,
    dyn crate::backend::ContainerBackend
);

// ===========================================================================
// Tests
// ===========================================================================
