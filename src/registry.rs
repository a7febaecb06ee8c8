//! Type-to-widget resolution rules.
//!
//! A [`Registry`] maps [`TypeName`]s to resolution rules. One process-wide
//! default instance lives in a thread local (the whole system is
//! single-threaded); an injectable instance supports sandboxed resolution,
//! and [`RegistryScope`] provides reversible scoped registration for tests
//! and plugins.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::options::{ChoicesSource, WidgetDescriptor, WidgetKind, WidgetOptions, WidgetRef};
use crate::types::{TypeKey, TypeName};

/// Errors from rule registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("rule for {0} must supply a widget_type or choices")]
    MissingRule(TypeName),
    #[error("rule for {type_name} combines choices with non-categorical widget {widget}")]
    IncompatibleRule { type_name: TypeName, widget: String },
    #[error("{0:?} is not a registered widget name")]
    UnknownWidgetName(String),
}

/// One registered rule: a fixed descriptor, or a resolver callback invoked
/// with the full annotation.
#[derive(Clone)]
pub enum RegistryEntry {
    Descriptor(WidgetDescriptor),
    Resolver(Rc<dyn Fn(&TypeKey) -> WidgetDescriptor>),
}

impl RegistryEntry {
    /// The descriptor this entry yields for `key`.
    pub fn descriptor_for(&self, key: &TypeKey) -> WidgetDescriptor {
        match self {
            RegistryEntry::Descriptor(descriptor) => descriptor.clone(),
            RegistryEntry::Resolver(resolver) => resolver(key),
        }
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryEntry::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
            RegistryEntry::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// The rule shape accepted by [`Registry::register_type`]: at least one of
/// `widget_type` / `choices`, plus any constructor options to carry along.
#[derive(Debug, Clone, Default)]
pub struct RegistryRule {
    pub widget_type: Option<WidgetRef>,
    pub choices: Option<ChoicesSource>,
    pub options: WidgetOptions,
}

impl RegistryRule {
    pub fn widget(widget_type: impl Into<WidgetRef>) -> Self {
        Self {
            widget_type: Some(widget_type.into()),
            ..Self::default()
        }
    }

    pub fn choices(choices: ChoicesSource) -> Self {
        Self {
            choices: Some(choices),
            ..Self::default()
        }
    }

    pub fn with_widget(mut self, widget_type: impl Into<WidgetRef>) -> Self {
        self.widget_type = Some(widget_type.into());
        self
    }

    pub fn with_options(mut self, options: WidgetOptions) -> Self {
        self.options = options;
        self
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A mapping from type names to resolution rules. Exact-name lookup, with
/// the resolver walking an annotation's declared base order as fallback.
/// Last registration wins.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<TypeName, RegistryEntry>,
}

impl Registry {
    /// An empty registry with no rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in scalar rules.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        for (name, kind) in [
            ("bool", WidgetKind::CheckBox),
            ("int", WidgetKind::SpinBox),
            ("float", WidgetKind::FloatSpinBox),
            ("str", WidgetKind::LineEdit),
            ("path", WidgetKind::FileEdit),
        ] {
            registry.insert(
                TypeName::from(name),
                RegistryEntry::Descriptor(WidgetDescriptor::new(kind)),
            );
        }
        registry
    }

    /// Install an entry directly, replacing any previous one. Returns the
    /// replaced entry.
    pub fn insert(&mut self, type_name: TypeName, entry: RegistryEntry) -> Option<RegistryEntry> {
        tracing::debug!(type_name = %type_name, "registering resolution rule");
        self.entries.insert(type_name, entry)
    }

    /// Register a validated rule. At least one of `widget_type`/`choices`
    /// is required; `choices` implies `ComboBox` when no widget is named,
    /// and a named widget combined with choices must be categorical.
    pub fn register_type(
        &mut self,
        type_name: impl Into<TypeName>,
        rule: RegistryRule,
    ) -> Result<Option<RegistryEntry>, RegistryError> {
        let type_name = type_name.into();
        let entry = Self::entry_from_rule(&type_name, rule)?;
        Ok(self.insert(type_name, entry))
    }

    pub fn unregister(&mut self, type_name: &TypeName) -> Option<RegistryEntry> {
        self.entries.remove(type_name)
    }

    /// Restore a previously saved state for one name.
    fn restore(&mut self, type_name: TypeName, prior: Option<RegistryEntry>) {
        match prior {
            Some(entry) => {
                self.entries.insert(type_name, entry);
            }
            None => {
                self.entries.remove(&type_name);
            }
        }
    }

    pub fn get(&self, type_name: &TypeName) -> Option<&RegistryEntry> {
        self.entries.get(type_name)
    }

    /// Walk `key`'s resolution order (the type itself, then its declared
    /// bases) and return the first matching entry.
    pub fn lookup(&self, key: &TypeKey) -> Option<&RegistryEntry> {
        key.resolution_order()
            .into_iter()
            .find_map(|name| self.entries.get(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_from_rule(
        type_name: &TypeName,
        rule: RegistryRule,
    ) -> Result<RegistryEntry, RegistryError> {
        let RegistryRule {
            widget_type,
            choices,
            options,
        } = rule;
        let kind = match (&widget_type, &choices) {
            (None, None) => return Err(RegistryError::MissingRule(type_name.clone())),
            (Some(widget), _) => {
                let kind = match widget {
                    WidgetRef::Kind(kind) => *kind,
                    WidgetRef::Name(name) => WidgetKind::from_name(name)
                        .ok_or_else(|| RegistryError::UnknownWidgetName(name.clone()))?,
                };
                if choices.is_some() && !kind.is_categorical() {
                    return Err(RegistryError::IncompatibleRule {
                        type_name: type_name.clone(),
                        widget: kind.to_string(),
                    });
                }
                kind
            }
            (None, Some(_)) => WidgetKind::ComboBox,
        };
        let mut options = options;
        if let Some(choices) = choices {
            options.choices = Some(choices);
        }
        Ok(RegistryEntry::Descriptor(WidgetDescriptor::with_options(
            kind, options,
        )))
    }
}

// ---------------------------------------------------------------------------
// Global instance
// ---------------------------------------------------------------------------

thread_local! {
    static GLOBAL: RefCell<Registry> = RefCell::new(Registry::with_defaults());
}

/// Read access to the process-wide default registry.
pub fn with_global<R>(f: impl FnOnce(&Registry) -> R) -> R {
    GLOBAL.with(|global| f(&global.borrow()))
}

/// Mutating access to the process-wide default registry.
pub fn with_global_mut<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    GLOBAL.with(|global| f(&mut global.borrow_mut()))
}

/// Register a rule in the global registry, permanently.
pub fn register_type(
    type_name: impl Into<TypeName>,
    rule: RegistryRule,
) -> Result<(), RegistryError> {
    with_global_mut(|registry| registry.register_type(type_name, rule).map(|_| ()))
}

// ---------------------------------------------------------------------------
// Scoped registration
// ---------------------------------------------------------------------------

/// RAII guard for reversible registration in the global registry.
///
/// Every rule registered through the scope is undone when it drops — in
/// reverse order, and during unwinding too — restoring whatever entry (or
/// absence) preceded it.
#[derive(Default)]
pub struct RegistryScope {
    saved: Vec<(TypeName, Option<RegistryEntry>)>,
}

impl RegistryScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule globally for the lifetime of this scope.
    pub fn register_type(
        &mut self,
        type_name: impl Into<TypeName>,
        rule: RegistryRule,
    ) -> Result<(), RegistryError> {
        let type_name = type_name.into();
        let prior = with_global_mut(|registry| registry.register_type(type_name.clone(), rule))?;
        self.saved.push((type_name, prior));
        Ok(())
    }
}

/// A fresh scope over the global registry.
pub fn global_scope() -> RegistryScope {
    RegistryScope::new()
}

impl Drop for RegistryScope {
    fn drop(&mut self) {
        for (type_name, prior) in self.saved.drain(..).rev() {
            with_global_mut(|registry| registry.restore(type_name, prior));
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn defaults_cover_the_scalars() {
        let registry = Registry::with_defaults();
        for name in ["bool", "int", "float", "str", "path"] {
            assert!(registry.get(&TypeName::from(name)).is_some(), "{name}");
        }
    }

    #[test]
    fn rule_requires_widget_or_choices() {
        let mut registry = Registry::empty();
        let err = registry
            .register_type("Thing", RegistryRule::default())
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingRule(_)));
    }

    #[test]
    fn choices_alone_imply_combo_box() {
        let mut registry = Registry::empty();
        registry
            .register_type(
                "Flavor",
                RegistryRule::choices(ChoicesSource::from_values(vec![
                    Value::Str("sweet".into()),
                    Value::Str("salty".into()),
                ])),
            )
            .unwrap();
        let entry = registry.get(&TypeName::from("Flavor")).unwrap();
        let descriptor = entry.descriptor_for(&TypeKey::named("Flavor"));
        assert_eq!(descriptor.kind, WidgetKind::ComboBox);
        assert!(descriptor.options.choices.is_some());
    }

    #[test]
    fn choices_with_non_categorical_widget_are_incompatible() {
        let mut registry = Registry::empty();
        let rule = RegistryRule::choices(ChoicesSource::from_values(vec![Value::Int(1)]))
            .with_widget(WidgetKind::SpinBox);
        let err = registry.register_type("Thing", rule).unwrap_err();
        assert!(matches!(err, RegistryError::IncompatibleRule { .. }));
    }

    #[test]
    fn unknown_widget_name_is_rejected() {
        let mut registry = Registry::empty();
        let err = registry
            .register_type("Thing", RegistryRule::widget("NoSuchWidget"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownWidgetName(_)));
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = Registry::empty();
        registry
            .register_type("T", RegistryRule::widget(WidgetKind::SpinBox))
            .unwrap();
        registry
            .register_type("T", RegistryRule::widget(WidgetKind::Slider))
            .unwrap();
        let descriptor = registry
            .get(&TypeName::from("T"))
            .unwrap()
            .descriptor_for(&TypeKey::named("T"));
        assert_eq!(descriptor.kind, WidgetKind::Slider);
    }

    #[test]
    fn lookup_walks_declared_bases() {
        let mut registry = Registry::empty();
        registry
            .register_type("int", RegistryRule::widget(WidgetKind::SpinBox))
            .unwrap();
        let key = TypeKey::named_with_bases("MyInt", vec![TypeName::from("int")]);
        let entry = registry.lookup(&key).unwrap();
        assert_eq!(
            entry.descriptor_for(&key).kind,
            WidgetKind::SpinBox
        );
    }

    #[test]
    fn resolver_entries_see_the_full_key() {
        let mut registry = Registry::empty();
        registry.insert(
            TypeName::from("Image"),
            RegistryEntry::Resolver(Rc::new(|key| {
                let kind = match key {
                    TypeKey::Sequence(_) => WidgetKind::ListEdit,
                    _ => WidgetKind::LineEdit,
                };
                WidgetDescriptor::new(kind)
            })),
        );
        let entry = registry.get(&TypeName::from("Image")).unwrap();
        assert_eq!(
            entry.descriptor_for(&TypeKey::named("Image")).kind,
            WidgetKind::LineEdit
        );
    }

    #[test]
    fn scope_restores_prior_state_on_drop() {
        // A unique name so parallel tests sharing the thread local cannot
        // collide.
        let name = "ScopedThing_drop";
        {
            let mut scope = RegistryScope::new();
            scope
                .register_type(name, RegistryRule::widget(WidgetKind::Slider))
                .unwrap();
            with_global(|registry| {
                assert!(registry.get(&TypeName::from(name)).is_some());
            });
        }
        with_global(|registry| {
            assert!(registry.get(&TypeName::from(name)).is_none());
        });
    }

    #[test]
    fn scope_restores_shadowed_entry() {
        let name = "ScopedThing_shadow";
        register_type(name, RegistryRule::widget(WidgetKind::SpinBox)).unwrap();
        {
            let mut scope = RegistryScope::new();
            scope
                .register_type(name, RegistryRule::widget(WidgetKind::Slider))
                .unwrap();
            let kind = with_global(|registry| {
                registry
                    .get(&TypeName::from(name))
                    .unwrap()
                    .descriptor_for(&TypeKey::named(name))
                    .kind
            });
            assert_eq!(kind, WidgetKind::Slider);
        }
        let kind = with_global(|registry| {
            registry
                .get(&TypeName::from(name))
                .unwrap()
                .descriptor_for(&TypeKey::named(name))
                .kind
        });
        assert_eq!(kind, WidgetKind::SpinBox);
        with_global_mut(|registry| registry.unregister(&TypeName::from(name)));
    }

    #[test]
    fn scope_restores_during_unwinding() {
        let name = "ScopedThing_unwind";
        let result = std::panic::catch_unwind(|| {
            let mut scope = RegistryScope::new();
            scope
                .register_type(name, RegistryRule::widget(WidgetKind::Slider))
                .unwrap();
            panic!("boom");
        });
        assert!(result.is_err());
        with_global(|registry| {
            assert!(registry.get(&TypeName::from(name)).is_none());
        });
    }
}
