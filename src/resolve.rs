//! Mapping `(value, annotation, overrides)` to a widget descriptor.

use crate::options::{
    ChoicesSource, WidgetDescriptor, WidgetKind, WidgetOptions, WidgetRef,
};
use crate::registry::{self, Registry};
use crate::types::{Namespace, TypeKey};
use crate::value::Value;

/// Deferred lookups beyond this depth are treated as cyclic.
const MAX_DEFERRED_DEPTH: usize = 32;

/// An annotation could not be mapped to any widget.
#[derive(Debug, thiserror::Error)]
pub enum TypeResolutionError {
    #[error("unresolved forward reference {0:?}")]
    UnresolvedName(String),
    #[error("forward reference {0:?} resolves through a cycle")]
    DeferredCycle(String),
    #[error("{0:?} is not a registered widget name")]
    UnknownWidgetName(String),
    #[error("no widget matches annotation {annotation}")]
    NoWidgetFound { annotation: String },
}

/// One resolution query.
///
/// `namespace` is the snapshot of names visible where the annotation was
/// written, consulted for deferred references; `strict` turns the
/// literal-editor fallback into an error.
#[derive(Debug, Default)]
pub struct ResolveRequest<'ns> {
    value: Option<Value>,
    annotation: Option<TypeKey>,
    overrides: WidgetOptions,
    namespace: Option<&'ns Namespace>,
    strict: bool,
}

impl<'ns> ResolveRequest<'ns> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_annotation(mut self, annotation: TypeKey) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn with_overrides(mut self, overrides: WidgetOptions) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_namespace(mut self, namespace: &'ns Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

/// Resolve against the process-wide default registry.
pub fn resolve(request: ResolveRequest<'_>) -> Result<WidgetDescriptor, TypeResolutionError> {
    registry::with_global(|registry| registry.resolve(request))
}

impl Registry {
    /// Map a resolution query to a widget descriptor.
    ///
    /// First match wins: `Annotated` metadata merges under explicit
    /// overrides; a `widget_type` override short-circuits; then the
    /// registry (exact name, then declared bases), literal/enum
    /// annotations, value inference, parameterized sequences and tuples,
    /// and finally the literal-editor fallback (or an error in strict
    /// mode).
    pub fn resolve(
        &self,
        request: ResolveRequest<'_>,
    ) -> Result<WidgetDescriptor, TypeResolutionError> {
        let ResolveRequest {
            value,
            annotation,
            overrides,
            namespace,
            strict,
        } = request;

        let mut descriptor = self.resolve_widget(value.as_ref(), annotation, overrides, namespace, strict)?;
        // A provided value becomes the initial value unless a higher
        // precedence level already chose one.
        if descriptor.options.value.is_none() {
            descriptor.options.value = value;
        }
        tracing::debug!(kind = %descriptor.kind, "resolved widget descriptor");
        Ok(descriptor)
    }

    fn resolve_widget(
        &self,
        value: Option<&Value>,
        annotation: Option<TypeKey>,
        overrides: WidgetOptions,
        namespace: Option<&Namespace>,
        strict: bool,
    ) -> Result<WidgetDescriptor, TypeResolutionError> {
        let mut options = overrides;
        let mut annotation = annotation.map(TypeKey::normalized);
        let mut nullable = false;
        let mut depth = 0;

        // Unwrap structure that carries information but does not pick a
        // widget by itself: metadata wrappers, optionals, deferred names.
        loop {
            match annotation {
                Some(TypeKey::Annotated { base, meta }) => {
                    // Metadata sits below everything accumulated so far.
                    options = meta.merged_with(&options);
                    annotation = Some(base.normalized());
                }
                Some(TypeKey::Optional(inner)) => {
                    nullable = true;
                    annotation = Some(inner.normalized());
                }
                Some(TypeKey::Deferred(name)) => {
                    depth += 1;
                    if depth > MAX_DEFERRED_DEPTH {
                        return Err(TypeResolutionError::DeferredCycle(name));
                    }
                    let target = namespace
                        .and_then(|ns| ns.get(&name))
                        .ok_or(TypeResolutionError::UnresolvedName(name.clone()))?;
                    annotation = Some(target.clone().normalized());
                }
                other => {
                    annotation = other;
                    break;
                }
            }
        }
        if nullable && options.nullable.is_none() {
            options.nullable = Some(true);
        }

        // Highest precedence: an explicit widget_type short-circuits.
        if let Some(widget_ref) = options.widget_type.take() {
            let kind = named_kind(widget_ref)?;
            return Ok(WidgetDescriptor::with_options(kind, options));
        }

        // Nothing to go on at all: an invisible placeholder.
        if annotation.is_none() && value.is_none() && options.choices.is_none() {
            if options.visible.is_none() {
                options.visible = Some(false);
            }
            return Ok(WidgetDescriptor::with_options(WidgetKind::Empty, options));
        }

        // Explicit choices imply a categorical widget.
        if options.choices.is_some() {
            return Ok(WidgetDescriptor::with_options(
                WidgetKind::ComboBox,
                options,
            ));
        }

        // Infer the annotation from the value when absent. A bare null has
        // no type to speak of and goes straight to the fallback editor.
        let annotation = match annotation {
            Some(key) => key,
            None => match value.and_then(infer_annotation) {
                Some(key) => key,
                None => return fallback(options, "null", strict),
            },
        };

        // Registry: exact name, then declared base order. A categorical
        // entry for an enum or literal annotation still gets its choices
        // from the annotation's members unless the entry supplied its own.
        if let Some(entry) = self.lookup(&annotation) {
            let resolved = entry.descriptor_for(&annotation);
            let mut merged = resolved.options.merged_with(&options);
            if resolved.kind.is_categorical() && merged.choices.is_none() {
                apply_member_choices(&annotation, &mut merged);
            }
            return Ok(WidgetDescriptor::with_options(resolved.kind, merged));
        }

        match annotation {
            // Literal sets and enums become categorical widgets with
            // choices in declaration order.
            key @ (TypeKey::Literal(_) | TypeKey::Enum { .. }) => {
                apply_member_choices(&key, &mut options);
                Ok(WidgetDescriptor::with_options(
                    WidgetKind::ComboBox,
                    options,
                ))
            }
            // Parameterized containers become composite editors over
            // recursively resolved element descriptors.
            TypeKey::Sequence(element) => {
                let mut request = ResolveRequest::new().with_annotation(*element);
                if let Some(ns) = namespace {
                    request = request.with_namespace(ns);
                }
                if strict {
                    request = request.strict();
                }
                let element_descriptor = self.resolve(request)?;
                options.element = Some(Box::new(element_descriptor));
                Ok(WidgetDescriptor::with_options(
                    WidgetKind::ListEdit,
                    options,
                ))
            }
            TypeKey::Tuple(elements) => {
                let mut descriptors = Vec::with_capacity(elements.len());
                for element in elements {
                    let mut request = ResolveRequest::new().with_annotation(element);
                    if let Some(ns) = namespace {
                        request = request.with_namespace(ns);
                    }
                    if strict {
                        request = request.strict();
                    }
                    descriptors.push(self.resolve(request)?);
                }
                options.elements = Some(descriptors);
                Ok(WidgetDescriptor::with_options(
                    WidgetKind::TupleEdit,
                    options,
                ))
            }
            other => fallback(options, &format!("{other:?}"), strict),
        }
    }
}

/// Fill `choices` from an enum's or literal set's members, in declaration
/// order. A null among literal values marks the widget nullable instead of
/// becoming a choice.
fn apply_member_choices(annotation: &TypeKey, options: &mut WidgetOptions) {
    match annotation {
        TypeKey::Literal(values) => {
            if values.iter().any(Value::is_null) && options.nullable.is_none() {
                options.nullable = Some(true);
            }
            let choices: Vec<Value> =
                values.iter().filter(|v| !v.is_null()).cloned().collect();
            options.choices = Some(ChoicesSource::from_values(choices));
        }
        TypeKey::Enum { name, variants } => {
            let pairs: Vec<(String, Value)> = variants
                .iter()
                .map(|variant| {
                    let value = Value::Enum {
                        type_name: name.as_str().to_owned(),
                        variant: variant.clone(),
                    };
                    (variant.clone(), value)
                })
                .collect();
            options.choices = Some(ChoicesSource::from_pairs(pairs));
        }
        _ => {}
    }
}

/// The fallback editor, or [`TypeResolutionError::NoWidgetFound`] in
/// strict mode.
fn fallback(
    options: WidgetOptions,
    annotation: &str,
    strict: bool,
) -> Result<WidgetDescriptor, TypeResolutionError> {
    if strict {
        return Err(TypeResolutionError::NoWidgetFound {
            annotation: annotation.to_owned(),
        });
    }
    Ok(WidgetDescriptor::with_options(
        WidgetKind::LiteralEdit,
        options,
    ))
}

fn named_kind(widget_ref: WidgetRef) -> Result<WidgetKind, TypeResolutionError> {
    match widget_ref {
        WidgetRef::Kind(kind) => Ok(kind),
        WidgetRef::Name(name) => WidgetKind::from_name(&name)
            .ok_or(TypeResolutionError::UnknownWidgetName(name)),
    }
}

/// The annotation a bare value implies. Booleans are their own type, never
/// integers; a null implies nothing.
fn infer_annotation(value: &Value) -> Option<TypeKey> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(TypeKey::boolean()),
        Value::Int(_) => Some(TypeKey::int()),
        Value::Float(_) => Some(TypeKey::float()),
        Value::Str(_) => Some(TypeKey::string()),
        Value::Path(_) => Some(TypeKey::path()),
        Value::Enum { type_name, variant } => Some(TypeKey::enumeration(
            type_name.as_str(),
            [variant.as_str()],
        )),
        Value::List(items) => {
            let element = items.first().and_then(infer_annotation)?;
            Some(TypeKey::sequence(element))
        }
        Value::Tuple(items) => {
            let elements: Option<Vec<TypeKey>> = items.iter().map(infer_annotation).collect();
            Some(TypeKey::tuple(elements?))
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryRule;
    use crate::types::TypeName;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        Registry::with_defaults()
    }

    #[test]
    fn builtin_annotations_resolve_to_their_widgets() {
        let r = registry();
        for (key, kind) in [
            (TypeKey::boolean(), WidgetKind::CheckBox),
            (TypeKey::int(), WidgetKind::SpinBox),
            (TypeKey::float(), WidgetKind::FloatSpinBox),
            (TypeKey::string(), WidgetKind::LineEdit),
            (TypeKey::path(), WidgetKind::FileEdit),
        ] {
            let descriptor = r
                .resolve(ResolveRequest::new().with_annotation(key.clone()))
                .unwrap();
            assert_eq!(descriptor.kind, kind, "for {key:?}");
        }
    }

    #[test]
    fn annotated_metadata_overrides_registry_choice() {
        let r = registry();
        let key = TypeKey::annotated(
            TypeKey::int(),
            WidgetOptions::new().with_widget_type(WidgetKind::Slider),
        );
        let descriptor = r
            .resolve(
                ResolveRequest::new()
                    .with_value(Value::Int(42))
                    .with_annotation(key),
            )
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::Slider);
        assert_eq!(descriptor.options.value, Some(Value::Int(42)));
    }

    #[test]
    fn explicit_overrides_outrank_annotated_metadata() {
        let r = registry();
        let key = TypeKey::annotated(
            TypeKey::int(),
            WidgetOptions::new().with_widget_type(WidgetKind::Slider),
        );
        let descriptor = r
            .resolve(
                ResolveRequest::new()
                    .with_annotation(key)
                    .with_overrides(
                        WidgetOptions::new().with_widget_type(WidgetKind::FloatSlider),
                    ),
            )
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::FloatSlider);
    }

    #[test]
    fn annotated_constructor_options_survive() {
        let r = registry();
        let key = TypeKey::annotated(
            TypeKey::int(),
            WidgetOptions::new().with_min(0.0).with_max(10.0),
        );
        let descriptor = r
            .resolve(ResolveRequest::new().with_annotation(key))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::SpinBox);
        assert_eq!(descriptor.options.min, Some(0.0));
        assert_eq!(descriptor.options.max, Some(10.0));
    }

    #[test]
    fn bool_value_is_not_an_int() {
        let r = registry();
        let from_bool = r
            .resolve(ResolveRequest::new().with_value(Value::Bool(true)))
            .unwrap();
        assert_eq!(from_bool.kind, WidgetKind::CheckBox);
        let from_int = r
            .resolve(ResolveRequest::new().with_value(Value::Int(1)))
            .unwrap();
        assert_eq!(from_int.kind, WidgetKind::SpinBox);
    }

    #[test]
    fn bare_null_value_falls_back_to_literal_editor() {
        let r = registry();
        let descriptor = r
            .resolve(ResolveRequest::new().with_value(Value::Null))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::LiteralEdit);
    }

    #[test]
    fn empty_request_yields_hidden_placeholder() {
        let r = registry();
        let descriptor = r.resolve(ResolveRequest::new()).unwrap();
        assert_eq!(descriptor.kind, WidgetKind::Empty);
        assert_eq!(descriptor.options.visible, Some(false));
    }

    #[test]
    fn optional_unwraps_and_defaults_nullable() {
        let r = registry();
        let descriptor = r
            .resolve(
                ResolveRequest::new()
                    .with_annotation(TypeKey::optional(TypeKey::int())),
            )
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::SpinBox);
        assert_eq!(descriptor.options.nullable, Some(true));
    }

    #[test]
    fn literal_set_becomes_choices_in_declaration_order() {
        let r = registry();
        let key = TypeKey::literal(vec![Value::Int(2), Value::Int(1), Value::Null]);
        let descriptor = r
            .resolve(ResolveRequest::new().with_annotation(key))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::ComboBox);
        assert_eq!(descriptor.options.nullable, Some(true));
        let pairs = descriptor.options.choices.unwrap().materialize();
        assert_eq!(
            pairs,
            vec![
                ("2".to_owned(), Value::Int(2)),
                ("1".to_owned(), Value::Int(1)),
            ]
        );
    }

    #[test]
    fn enum_members_become_choices() {
        let r = registry();
        let key = TypeKey::enumeration("Color", ["Red", "Green"]);
        let descriptor = r
            .resolve(ResolveRequest::new().with_annotation(key))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::ComboBox);
        let pairs = descriptor.options.choices.unwrap().materialize();
        assert_eq!(pairs[0].0, "Red");
        assert_eq!(
            pairs[1].1,
            Value::Enum {
                type_name: "Color".into(),
                variant: "Green".into()
            }
        );
    }

    #[test]
    fn registered_enum_name_outranks_generic_enum_handling() {
        let mut r = registry();
        r.register_type("Color", RegistryRule::widget(WidgetKind::RadioButtons))
            .unwrap();
        let key = TypeKey::enumeration("Color", ["Red", "Green"]);
        let descriptor = r
            .resolve(ResolveRequest::new().with_annotation(key))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::RadioButtons);
        // Members still supply the choices when the rule does not.
        let pairs = descriptor.options.choices.unwrap().materialize();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "Red");
    }

    #[test]
    fn explicit_choices_imply_combo_box() {
        let r = registry();
        let descriptor = r
            .resolve(ResolveRequest::new().with_overrides(
                WidgetOptions::new()
                    .with_choices(ChoicesSource::from_values(vec![Value::Int(1)])),
            ))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::ComboBox);
    }

    #[test]
    fn sequence_resolves_element_recursively() {
        let r = registry();
        let descriptor = r
            .resolve(
                ResolveRequest::new()
                    .with_annotation(TypeKey::sequence(TypeKey::path())),
            )
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::ListEdit);
        let element = descriptor.options.element.unwrap();
        assert_eq!(element.kind, WidgetKind::FileEdit);
    }

    #[test]
    fn tuple_resolves_each_position() {
        let r = registry();
        let descriptor = r
            .resolve(
                ResolveRequest::new()
                    .with_annotation(TypeKey::tuple(vec![TypeKey::int(), TypeKey::string()])),
            )
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::TupleEdit);
        let elements = descriptor.options.elements.unwrap();
        assert_eq!(elements[0].kind, WidgetKind::SpinBox);
        assert_eq!(elements[1].kind, WidgetKind::LineEdit);
    }

    #[test]
    fn subclass_walks_to_registered_base() {
        let r = registry();
        let key = TypeKey::named_with_bases("Celsius", vec![TypeName::from("float")]);
        let descriptor = r
            .resolve(ResolveRequest::new().with_annotation(key))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::FloatSpinBox);
    }

    #[test]
    fn deferred_resolves_through_namespace() {
        let r = registry();
        let ns = Namespace::new().with("ImageLike", TypeKey::sequence(TypeKey::int()));
        let descriptor = r
            .resolve(
                ResolveRequest::new()
                    .with_annotation(TypeKey::deferred("ImageLike"))
                    .with_namespace(&ns),
            )
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::ListEdit);
    }

    #[test]
    fn unresolved_deferred_is_an_error_not_a_fallback() {
        let r = registry();
        let err = r
            .resolve(ResolveRequest::new().with_annotation(TypeKey::deferred("Mystery")))
            .unwrap_err();
        assert!(matches!(
            err,
            TypeResolutionError::UnresolvedName(name) if name == "Mystery"
        ));
    }

    #[test]
    fn deferred_cycle_is_detected() {
        let r = registry();
        let ns = Namespace::new()
            .with("A", TypeKey::deferred("B"))
            .with("B", TypeKey::deferred("A"));
        let err = r
            .resolve(
                ResolveRequest::new()
                    .with_annotation(TypeKey::deferred("A"))
                    .with_namespace(&ns),
            )
            .unwrap_err();
        assert!(matches!(err, TypeResolutionError::DeferredCycle(_)));
    }

    #[test]
    fn unknown_annotation_falls_back_to_literal_editor() {
        let r = registry();
        let descriptor = r
            .resolve(ResolveRequest::new().with_annotation(TypeKey::named("Mystery")))
            .unwrap();
        assert_eq!(descriptor.kind, WidgetKind::LiteralEdit);
    }

    #[test]
    fn strict_mode_errors_instead_of_falling_back() {
        let r = registry();
        let err = r
            .resolve(
                ResolveRequest::new()
                    .with_annotation(TypeKey::named("Mystery"))
                    .strict(),
            )
            .unwrap_err();
        assert!(matches!(err, TypeResolutionError::NoWidgetFound { .. }));
    }

    #[test]
    fn unknown_widget_name_in_overrides_is_an_error() {
        let r = registry();
        let err = r
            .resolve(ResolveRequest::new().with_overrides(
                WidgetOptions::new().with_widget_type("Sparkles"),
            ))
            .unwrap_err();
        assert!(matches!(err, TypeResolutionError::UnknownWidgetName(_)));
    }

    #[test]
    fn structurally_equal_annotations_resolve_identically() {
        let r = registry();
        let a = r
            .resolve(
                ResolveRequest::new().with_annotation(TypeKey::optional(TypeKey::optional(
                    TypeKey::int(),
                ))),
            )
            .unwrap();
        let b = r
            .resolve(ResolveRequest::new().with_annotation(TypeKey::optional(TypeKey::int())))
            .unwrap();
        assert_eq!(a, b);
    }
}
