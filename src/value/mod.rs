//! Dynamic runtime values flowing between widgets and callables.
//!
//! [`Value`] is the currency of the whole crate: widget state, function
//! defaults, call arguments, and categorical choice data are all `Value`s.
//! It deliberately covers only the shapes the resolver knows how to map to
//! widgets; anything richer belongs behind a registered resolver callback.

pub mod literal;

pub use literal::{evaluate_literal, EvaluationError};

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A dynamically typed runtime value.
///
/// `Value` implements structural equality. Numeric variants are *not*
/// cross-compared: `Value::Int(1) != Value::Float(1.0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The explicit "no value" / "no selection" sentinel.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    /// A member of a named enumeration.
    Enum {
        /// Name of the enumeration type (matches a [`TypeKey`] enum name).
        ///
        /// [`TypeKey`]: crate::types::TypeKey
        type_name: String,
        /// The member's name, as declared.
        variant: String,
    },
    List(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Short name of this value's shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Path(_) => "path",
            Value::Enum { .. } => "enum",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
        }
    }

    /// Whether this is the [`Value::Null`] sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used by ranged widgets. Integers widen losslessly for
    /// the magnitudes a spinbox or slider can express.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Render this value as a literal expression that [`evaluate_literal`]
    /// parses back to an equal value. Used by the literal-fallback editor.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "None".to_owned(),
            Value::Bool(true) => "True".to_owned(),
            Value::Bool(false) => "False".to_owned(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                // Keep a decimal point so the text round-trips as a float.
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Str(s) => format!("{:?}", s),
            Value::Path(p) => format!("{:?}", p.display().to_string()),
            Value::Enum { .. } => format!("{:?}", self.to_string()),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::to_literal).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Tuple(items) => match items.len() {
                1 => format!("({},)", items[0].to_literal()),
                _ => {
                    let inner: Vec<String> = items.iter().map(Value::to_literal).collect();
                    format!("({})", inner.join(", "))
                }
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Enum { variant, .. } => write!(f, "{variant}"),
            Value::List(items) | Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", inner.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::Path(v)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
