//! Normalized type annotations and forward-reference namespaces.
//!
//! Rust has no runtime reflection over annotations, so the annotation
//! language is reified as data: a [`TypeKey`] is what a host annotation
//! normalizes to before resolution. Structurally equal annotations compare
//! equal and therefore resolve identically.

use std::fmt;

use crate::options::WidgetOptions;
use crate::value::Value;

// ---------------------------------------------------------------------------
// TypeName
// ---------------------------------------------------------------------------

/// Identity of a named type. Registry entries are keyed by `TypeName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// TypeKey
// ---------------------------------------------------------------------------

/// A normalized type annotation.
///
/// Named types carry their base-type resolution order explicitly (most
/// specific first), which is what the registry's ancestor walk consults in
/// place of a reflective MRO.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKey {
    /// A plain named type, e.g. `int` or a user-registered type.
    Named {
        name: TypeName,
        /// Declared ancestors, nearest first. Not part of the registry key;
        /// consulted as fallback during resolution.
        bases: Vec<TypeName>,
    },
    /// A fixed set of admissible literal values, in declaration order.
    Literal(Vec<Value>),
    /// An enumeration with members in declaration order.
    Enum {
        name: TypeName,
        variants: Vec<String>,
    },
    /// A homogeneous, growable sequence of the element type.
    Sequence(Box<TypeKey>),
    /// A fixed-arity heterogeneous tuple.
    Tuple(Vec<TypeKey>),
    /// `T` or null.
    Optional(Box<TypeKey>),
    /// A base annotation wrapped with widget metadata.
    Annotated {
        base: Box<TypeKey>,
        meta: WidgetOptions,
    },
    /// An unresolved forward reference, resolved against a [`Namespace`].
    Deferred(String),
}

impl TypeKey {
    pub fn named(name: impl Into<TypeName>) -> Self {
        TypeKey::Named {
            name: name.into(),
            bases: Vec::new(),
        }
    }

    /// A named type with an explicit ancestor, nearest first.
    pub fn named_with_bases(
        name: impl Into<TypeName>,
        bases: impl IntoIterator<Item = TypeName>,
    ) -> Self {
        TypeKey::Named {
            name: name.into(),
            bases: bases.into_iter().collect(),
        }
    }

    pub fn boolean() -> Self {
        Self::named("bool")
    }

    pub fn int() -> Self {
        Self::named("int")
    }

    pub fn float() -> Self {
        Self::named("float")
    }

    pub fn string() -> Self {
        Self::named("str")
    }

    pub fn path() -> Self {
        Self::named("path")
    }

    pub fn literal(values: impl IntoIterator<Item = Value>) -> Self {
        TypeKey::Literal(values.into_iter().collect())
    }

    pub fn enumeration(
        name: impl Into<TypeName>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        TypeKey::Enum {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sequence(element: TypeKey) -> Self {
        TypeKey::Sequence(Box::new(element))
    }

    pub fn tuple(elements: impl IntoIterator<Item = TypeKey>) -> Self {
        TypeKey::Tuple(elements.into_iter().collect())
    }

    pub fn optional(inner: TypeKey) -> Self {
        TypeKey::Optional(Box::new(inner))
    }

    pub fn annotated(base: TypeKey, meta: WidgetOptions) -> Self {
        TypeKey::Annotated {
            base: Box::new(base),
            meta,
        }
    }

    pub fn deferred(name: impl Into<String>) -> Self {
        TypeKey::Deferred(name.into())
    }

    /// Resolution order for registry lookup: the type itself, then its
    /// declared bases, nearest first. Empty for non-named keys.
    pub fn resolution_order(&self) -> Vec<&TypeName> {
        match self {
            TypeKey::Named { name, bases } => {
                let mut order = Vec::with_capacity(1 + bases.len());
                order.push(name);
                order.extend(bases.iter());
                order
            }
            TypeKey::Enum { name, .. } => vec![name],
            _ => Vec::new(),
        }
    }

    /// Collapse redundant structure so structurally equivalent annotations
    /// compare equal: nested `Annotated` wrappers flatten (outer metadata
    /// wins over inner), nested `Optional`s collapse.
    pub fn normalized(self) -> TypeKey {
        match self {
            TypeKey::Annotated { base, meta } => match base.normalized() {
                TypeKey::Annotated {
                    base: inner_base,
                    meta: inner_meta,
                } => TypeKey::Annotated {
                    base: inner_base,
                    meta: inner_meta.merged_with(&meta),
                },
                other => TypeKey::Annotated {
                    base: Box::new(other),
                    meta,
                },
            },
            TypeKey::Optional(inner) => match inner.normalized() {
                TypeKey::Optional(deep) => TypeKey::Optional(deep),
                other => TypeKey::Optional(Box::new(other)),
            },
            TypeKey::Sequence(elem) => TypeKey::Sequence(Box::new(elem.normalized())),
            TypeKey::Tuple(elems) => {
                TypeKey::Tuple(elems.into_iter().map(TypeKey::normalized).collect())
            }
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// A snapshot of the names visible where a signature was defined.
///
/// The resolver consults this to resolve [`TypeKey::Deferred`] annotations;
/// there is deliberately no ambient global namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    bindings: std::collections::BTreeMap<String, TypeKey>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a key, returning self for chained construction.
    pub fn with(mut self, name: impl Into<String>, key: TypeKey) -> Self {
        self.bindings.insert(name.into(), key);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, key: TypeKey) {
        self.bindings.insert(name.into(), key);
    }

    pub fn get(&self, name: &str) -> Option<&TypeKey> {
        self.bindings.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        assert_eq!(TypeKey::int(), TypeKey::named("int"));
        assert_ne!(TypeKey::int(), TypeKey::float());
        assert_eq!(
            TypeKey::sequence(TypeKey::path()),
            TypeKey::sequence(TypeKey::path())
        );
    }

    #[test]
    fn resolution_order_self_then_bases() {
        let key = TypeKey::named_with_bases("MyInt", vec![TypeName::from("int")]);
        let order: Vec<&str> = key.resolution_order().iter().map(|n| n.as_str()).collect();
        assert_eq!(order, vec!["MyInt", "int"]);
    }

    #[test]
    fn resolution_order_empty_for_structured_keys() {
        assert!(TypeKey::literal(vec![Value::Int(1)]).resolution_order().is_empty());
        assert!(TypeKey::sequence(TypeKey::int()).resolution_order().is_empty());
    }

    #[test]
    fn normalize_collapses_nested_optional() {
        let key = TypeKey::optional(TypeKey::optional(TypeKey::int()));
        assert_eq!(key.normalized(), TypeKey::optional(TypeKey::int()));
    }

    #[test]
    fn normalize_flattens_nested_annotated() {
        let inner = WidgetOptions::new().with_min(0.0);
        let outer = WidgetOptions::new().with_max(10.0);
        let key = TypeKey::annotated(TypeKey::annotated(TypeKey::int(), inner), outer);
        match key.normalized() {
            TypeKey::Annotated { base, meta } => {
                assert_eq!(*base, TypeKey::int());
                assert_eq!(meta.min, Some(0.0));
                assert_eq!(meta.max, Some(10.0));
            }
            other => panic!("expected Annotated, got {other:?}"),
        }
    }

    #[test]
    fn namespace_lookup() {
        let ns = Namespace::new().with("ImageLike", TypeKey::sequence(TypeKey::int()));
        assert_eq!(ns.get("ImageLike"), Some(&TypeKey::sequence(TypeKey::int())));
        assert_eq!(ns.get("Missing"), None);
    }

    #[test]
    fn enum_key_keeps_declaration_order() {
        let key = TypeKey::enumeration("Color", ["Red", "Green", "Blue"]);
        match key {
            TypeKey::Enum { variants, .. } => {
                assert_eq!(variants, vec!["Red", "Green", "Blue"]);
            }
            other => panic!("expected Enum, got {other:?}"),
        }
    }
}
