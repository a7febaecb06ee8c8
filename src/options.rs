//! Widget descriptors and constructor options.
//!
//! Resolution produces a [`WidgetDescriptor`]: the chosen [`WidgetKind`]
//! plus a [`WidgetOptions`] bag of constructor options. Options merge with
//! a fixed precedence (explicit overrides > `Annotated` metadata > registry
//! entry > kind defaults); unknown keys travel in `extra` and are rejected
//! at widget construction, never silently dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

// ---------------------------------------------------------------------------
// WidgetKind
// ---------------------------------------------------------------------------

/// The closed set of core widget types the resolver can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    CheckBox,
    PushButton,
    SpinBox,
    FloatSpinBox,
    Slider,
    FloatSlider,
    LineEdit,
    FileEdit,
    /// Raw-text fallback editor; its text is evaluated as a literal on read.
    LiteralEdit,
    ComboBox,
    RadioButtons,
    Select,
    ListEdit,
    TupleEdit,
    /// Invisible placeholder, used for bound parameters.
    Empty,
    Container,
}

/// Capability family a [`WidgetKind`] belongs to. Determines which backend
/// contract the factory must supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetFamily {
    Value,
    Ranged,
    Slider,
    Button,
    Categorical,
    Sequence,
    Container,
}

impl WidgetKind {
    /// The kind's registered name, used in `widget_type` overrides.
    pub fn name(self) -> &'static str {
        match self {
            WidgetKind::CheckBox => "CheckBox",
            WidgetKind::PushButton => "PushButton",
            WidgetKind::SpinBox => "SpinBox",
            WidgetKind::FloatSpinBox => "FloatSpinBox",
            WidgetKind::Slider => "Slider",
            WidgetKind::FloatSlider => "FloatSlider",
            WidgetKind::LineEdit => "LineEdit",
            WidgetKind::FileEdit => "FileEdit",
            WidgetKind::LiteralEdit => "LiteralEdit",
            WidgetKind::ComboBox => "ComboBox",
            WidgetKind::RadioButtons => "RadioButtons",
            WidgetKind::Select => "Select",
            WidgetKind::ListEdit => "ListEdit",
            WidgetKind::TupleEdit => "TupleEdit",
            WidgetKind::Empty => "Empty",
            WidgetKind::Container => "Container",
        }
    }

    /// Look a kind up by its registered name.
    pub fn from_name(name: &str) -> Option<WidgetKind> {
        Some(match name {
            "CheckBox" => WidgetKind::CheckBox,
            "PushButton" => WidgetKind::PushButton,
            "SpinBox" => WidgetKind::SpinBox,
            "FloatSpinBox" => WidgetKind::FloatSpinBox,
            "Slider" => WidgetKind::Slider,
            "FloatSlider" => WidgetKind::FloatSlider,
            "LineEdit" => WidgetKind::LineEdit,
            "FileEdit" => WidgetKind::FileEdit,
            "LiteralEdit" => WidgetKind::LiteralEdit,
            "ComboBox" => WidgetKind::ComboBox,
            "RadioButtons" => WidgetKind::RadioButtons,
            "Select" => WidgetKind::Select,
            "ListEdit" => WidgetKind::ListEdit,
            "TupleEdit" => WidgetKind::TupleEdit,
            "Empty" => WidgetKind::Empty,
            "Container" => WidgetKind::Container,
            _ => return None,
        })
    }

    pub fn family(self) -> WidgetFamily {
        match self {
            WidgetKind::CheckBox | WidgetKind::PushButton => WidgetFamily::Button,
            WidgetKind::SpinBox | WidgetKind::FloatSpinBox => WidgetFamily::Ranged,
            WidgetKind::Slider | WidgetKind::FloatSlider => WidgetFamily::Slider,
            WidgetKind::LineEdit
            | WidgetKind::FileEdit
            | WidgetKind::LiteralEdit
            | WidgetKind::Empty => WidgetFamily::Value,
            WidgetKind::ComboBox | WidgetKind::RadioButtons | WidgetKind::Select => {
                WidgetFamily::Categorical
            }
            WidgetKind::ListEdit | WidgetKind::TupleEdit => WidgetFamily::Sequence,
            WidgetKind::Container => WidgetFamily::Container,
        }
    }

    /// Whether this kind can host a `choices` option.
    pub fn is_categorical(self) -> bool {
        self.family() == WidgetFamily::Categorical
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// WidgetRef
// ---------------------------------------------------------------------------

/// A `widget_type` override: either a registered widget name or a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetRef {
    Name(String),
    Kind(WidgetKind),
}

impl From<WidgetKind> for WidgetRef {
    fn from(kind: WidgetKind) -> Self {
        WidgetRef::Kind(kind)
    }
}

impl From<&str> for WidgetRef {
    fn from(name: &str) -> Self {
        WidgetRef::Name(name.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Choices
// ---------------------------------------------------------------------------

/// Where a categorical widget's choices come from.
///
/// A `Dynamic` source is re-queried by `reset_choices()`; a `Static` source
/// always yields the same pairs.
#[derive(Clone)]
pub enum ChoicesSource {
    Static(Vec<(String, Value)>),
    Dynamic(Rc<dyn Fn() -> Vec<(String, Value)>>),
}

impl ChoicesSource {
    /// Build a static source from bare values; display names come from the
    /// values' `Display` impls.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        ChoicesSource::Static(
            values
                .into_iter()
                .map(|v| (v.to_string(), v))
                .collect(),
        )
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        ChoicesSource::Static(pairs.into_iter().collect())
    }

    pub fn dynamic(f: impl Fn() -> Vec<(String, Value)> + 'static) -> Self {
        ChoicesSource::Dynamic(Rc::new(f))
    }

    /// Produce the current choice pairs, querying a dynamic source.
    pub fn materialize(&self) -> Vec<(String, Value)> {
        match self {
            ChoicesSource::Static(pairs) => pairs.clone(),
            ChoicesSource::Dynamic(f) => f(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ChoicesSource::Dynamic(_))
    }
}

impl fmt::Debug for ChoicesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoicesSource::Static(pairs) => f.debug_tuple("Static").field(pairs).finish(),
            ChoicesSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl PartialEq for ChoicesSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChoicesSource::Static(a), ChoicesSource::Static(b)) => a == b,
            (ChoicesSource::Dynamic(a), ChoicesSource::Dynamic(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// A value bound to a widget, overriding whatever the control shows.
#[derive(Clone)]
pub enum Binding {
    Fixed(Value),
    Computed(Rc<dyn Fn() -> Value>),
}

impl Binding {
    pub fn computed(f: impl Fn() -> Value + 'static) -> Self {
        Binding::Computed(Rc::new(f))
    }

    pub fn resolve(&self) -> Value {
        match self {
            Binding::Fixed(v) => v.clone(),
            Binding::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            Binding::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Binding::Fixed(a), Binding::Fixed(b)) => a == b,
            (Binding::Computed(a), Binding::Computed(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for Binding {
    fn from(v: Value) -> Self {
        Binding::Fixed(v)
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What a ranged widget does with an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Clamp into `[min, max]` silently (the default).
    #[default]
    Clamp,
    /// Fail the assignment with an out-of-range error.
    Reject,
}

/// Slider orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

// ---------------------------------------------------------------------------
// WidgetOptions
// ---------------------------------------------------------------------------

/// Constructor options for a widget, produced by resolution and merging.
///
/// Every field is optional; `None` means "not specified at this precedence
/// level". `extra` carries keys no core widget understands — they are
/// forwarded so construction can reject them loudly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetOptions {
    pub widget_type: Option<WidgetRef>,
    pub label: Option<String>,
    pub tooltip: Option<String>,
    pub visible: Option<bool>,
    pub enabled: Option<bool>,
    /// Initial value to set after construction.
    pub value: Option<Value>,
    pub bind: Option<Binding>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub range_policy: Option<RangePolicy>,
    pub orientation: Option<Orientation>,
    pub readout: Option<bool>,
    pub text: Option<String>,
    pub choices: Option<ChoicesSource>,
    pub nullable: Option<bool>,
    /// Element descriptor for repeatable (list) editors.
    pub element: Option<Box<WidgetDescriptor>>,
    /// Per-position element descriptors for tuple editors.
    pub elements: Option<Vec<WidgetDescriptor>>,
    /// Unrecognized keys, rejected at construction time.
    pub extra: BTreeMap<String, Value>,
}

macro_rules! with_setter {
    ($with:ident, $field:ident, $ty:ty) => {
        pub fn $with(mut self, value: $ty) -> Self {
            self.$field = Some(value.into());
            self
        }
    };
}

impl WidgetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    with_setter!(with_widget_type, widget_type, impl Into<WidgetRef>);
    with_setter!(with_label, label, impl Into<String>);
    with_setter!(with_tooltip, tooltip, impl Into<String>);
    with_setter!(with_visible, visible, bool);
    with_setter!(with_enabled, enabled, bool);
    with_setter!(with_value, value, Value);
    with_setter!(with_bind, bind, impl Into<Binding>);
    with_setter!(with_min, min, f64);
    with_setter!(with_max, max, f64);
    with_setter!(with_step, step, f64);
    with_setter!(with_range_policy, range_policy, RangePolicy);
    with_setter!(with_orientation, orientation, Orientation);
    with_setter!(with_readout, readout, bool);
    with_setter!(with_text, text, impl Into<String>);
    with_setter!(with_choices, choices, ChoicesSource);
    with_setter!(with_nullable, nullable, bool);

    pub fn with_element(mut self, element: WidgetDescriptor) -> Self {
        self.element = Some(Box::new(element));
        self
    }

    pub fn with_elements(mut self, elements: Vec<WidgetDescriptor>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Merge `higher` over `self`: any option `higher` specifies wins;
    /// unspecified options fall through to `self`. `extra` maps union with
    /// `higher` winning on key conflicts.
    pub fn merged_with(&self, higher: &WidgetOptions) -> WidgetOptions {
        let mut extra = self.extra.clone();
        extra.extend(higher.extra.clone());
        WidgetOptions {
            widget_type: higher.widget_type.clone().or_else(|| self.widget_type.clone()),
            label: higher.label.clone().or_else(|| self.label.clone()),
            tooltip: higher.tooltip.clone().or_else(|| self.tooltip.clone()),
            visible: higher.visible.or(self.visible),
            enabled: higher.enabled.or(self.enabled),
            value: higher.value.clone().or_else(|| self.value.clone()),
            bind: higher.bind.clone().or_else(|| self.bind.clone()),
            min: higher.min.or(self.min),
            max: higher.max.or(self.max),
            step: higher.step.or(self.step),
            range_policy: higher.range_policy.or(self.range_policy),
            orientation: higher.orientation.or(self.orientation),
            readout: higher.readout.or(self.readout),
            text: higher.text.clone().or_else(|| self.text.clone()),
            choices: higher.choices.clone().or_else(|| self.choices.clone()),
            nullable: higher.nullable.or(self.nullable),
            element: higher.element.clone().or_else(|| self.element.clone()),
            elements: higher.elements.clone().or_else(|| self.elements.clone()),
            extra,
        }
    }
}

// ---------------------------------------------------------------------------
// WidgetDescriptor
// ---------------------------------------------------------------------------

/// The outcome of type resolution: which widget to build and how.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDescriptor {
    pub kind: WidgetKind,
    pub options: WidgetOptions,
}

impl WidgetDescriptor {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            options: WidgetOptions::default(),
        }
    }

    pub fn with_options(kind: WidgetKind, options: WidgetOptions) -> Self {
        Self { kind, options }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_name_round_trip() {
        for kind in [
            WidgetKind::CheckBox,
            WidgetKind::SpinBox,
            WidgetKind::Slider,
            WidgetKind::LineEdit,
            WidgetKind::ComboBox,
            WidgetKind::ListEdit,
            WidgetKind::Empty,
        ] {
            assert_eq!(WidgetKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(WidgetKind::from_name("NotAWidget"), None);
    }

    #[test]
    fn families() {
        assert_eq!(WidgetKind::CheckBox.family(), WidgetFamily::Button);
        assert_eq!(WidgetKind::SpinBox.family(), WidgetFamily::Ranged);
        assert_eq!(WidgetKind::Slider.family(), WidgetFamily::Slider);
        assert_eq!(WidgetKind::ComboBox.family(), WidgetFamily::Categorical);
        assert_eq!(WidgetKind::ListEdit.family(), WidgetFamily::Sequence);
        assert!(WidgetKind::RadioButtons.is_categorical());
        assert!(!WidgetKind::SpinBox.is_categorical());
    }

    #[test]
    fn merge_higher_wins() {
        let low = WidgetOptions::new()
            .with_min(0.0)
            .with_max(10.0)
            .with_label("low");
        let high = WidgetOptions::new().with_max(99.0);
        let merged = low.merged_with(&high);
        assert_eq!(merged.min, Some(0.0));
        assert_eq!(merged.max, Some(99.0));
        assert_eq!(merged.label.as_deref(), Some("low"));
    }

    #[test]
    fn merge_extra_union() {
        let low = WidgetOptions::new()
            .with_extra("a", Value::Int(1))
            .with_extra("b", Value::Int(2));
        let high = WidgetOptions::new().with_extra("b", Value::Int(20));
        let merged = low.merged_with(&high);
        assert_eq!(merged.extra.get("a"), Some(&Value::Int(1)));
        assert_eq!(merged.extra.get("b"), Some(&Value::Int(20)));
    }

    #[test]
    fn choices_from_values_uses_display_names() {
        let src = ChoicesSource::from_values(vec![Value::Int(1), Value::Str("two".into())]);
        let pairs = src.materialize();
        assert_eq!(pairs[0], ("1".to_owned(), Value::Int(1)));
        assert_eq!(pairs[1], ("two".to_owned(), Value::Str("two".into())));
    }

    #[test]
    fn dynamic_choices_requery() {
        use std::cell::Cell;
        let counter = Rc::new(Cell::new(0));
        let c = counter.clone();
        let src = ChoicesSource::dynamic(move || {
            c.set(c.get() + 1);
            vec![("x".to_owned(), Value::Int(c.get()))]
        });
        assert!(src.is_dynamic());
        let first = src.materialize();
        let second = src.materialize();
        assert_ne!(first, second);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn binding_resolve() {
        assert_eq!(Binding::Fixed(Value::Int(5)).resolve(), Value::Int(5));
        let computed = Binding::computed(|| Value::Str("now".into()));
        assert_eq!(computed.resolve(), Value::Str("now".into()));
    }

    #[test]
    fn range_policy_default_is_clamp() {
        assert_eq!(RangePolicy::default(), RangePolicy::Clamp);
    }
}
