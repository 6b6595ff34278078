//! Values bound into a render context.
//!
//! A [`Value`] is what a `{{$name}}` reference resolves to, what a loop
//! iterates over and what a conditional tests. Values usually arrive as
//! JSON/TOML/YAML data and are converted through [`From<serde_json::Value>`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value that the interpreter passes through without looking inside.
///
/// Metadata records from the content layer implement this so they can be
/// bound into a context and printed, without the interpreter knowing their
/// structure. Opaque values are always truthy and never iterable.
pub trait OpaqueValue: fmt::Debug + fmt::Display + Send + Sync {}

/// A value visible to templates.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Opaque(Arc<dyn OpaqueValue>),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
            Self::Opaque(_) => "object",
        }
    }

    /// Whether a conditional on this value renders its body.
    ///
    /// Empty strings, zero, `false` and empty collections are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::String(s) => !s.is_empty(),
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::Bool(b) => *b,
            Self::Seq(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Opaque(_) => true,
        }
    }

    /// Look up a field of a mapping value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Elements a loop iterates over, or `None` if the value is not iterable.
    ///
    /// Mappings iterate as `[key, value]` pairs in key order so that
    /// `{{%for k, v in map:` destructures them positionally.
    #[must_use]
    pub fn iter_elements(&self) -> Option<Vec<Value>> {
        match self {
            Self::Seq(items) => Some(items.clone()),
            Self::Map(map) => Some(
                map.iter()
                    .map(|(k, v)| Value::Seq(vec![Value::String(k.clone()), v.clone()]))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Seq(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Opaque(obj) => write!(f, "{obj}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            // There is no null in the template language; it prints as nothing
            // and tests falsy.
            serde_json::Value::Null => Self::String(String::new()),
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Seq(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }
}
