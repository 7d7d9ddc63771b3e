//! Runtime value graph handed to the encoder.
//!
//! Containers are shared mutable handles so that cyclic and aliased graphs
//! can be built and logged; the encoder uses the handle address as the
//! identity key for cycle detection.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Shared handle to an array's elements.
pub type ArrayRef = Arc<RwLock<Vec<Value>>>;

/// Shared handle to a keyed object's fields.
pub type ObjectRef = Arc<RwLock<ObjectData>>;

/// Shared handle to a map's entries.
pub type MapRef = Arc<RwLock<Vec<(Value, Value)>>>;

/// Shared handle to a set's members.
pub type SetRef = Arc<RwLock<Vec<Value>>>;

/// A deferred, fallible property value. Stands in for a computed accessor
/// whose evaluation can fail; the encoder resolves it and substitutes an
/// error placeholder on failure.
pub type GetterFn = Arc<dyn Fn() -> Result<Value, String> + Send + Sync>;

/// Fields of a keyed object, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ObjectData {
    /// Constructor name for display, `None` for a plain object.
    pub class_name: Option<String>,
    pub fields: IndexMap<String, Value>,
}

/// A runtime value reachable from a console call.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    /// A symbol, carried as its description string.
    Symbol(String),
    /// An arbitrary-precision integer, carried as decimal digits.
    BigInt(String),
    Array(ArrayRef),
    Object(ObjectRef),
    Map(MapRef),
    Set(SetRef),
    /// An inert description of a callable; never invocable through the codec.
    Function { name: String },
    Error {
        name: String,
        message: String,
        stack: Option<String>,
    },
    Date(DateTime<Utc>),
    Regexp { source: String, flags: String },
    Getter(GetterFn),
}

impl Value {
    /// Build an array value.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(Arc::new(RwLock::new(items.into_iter().collect())))
    }

    /// Build a plain object value with the given fields, in order.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Object(Arc::new(RwLock::new(ObjectData {
            class_name: None,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })))
    }

    /// Build a class instance: a keyed object carrying its constructor name.
    pub fn instance<K: Into<String>>(
        class_name: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Value {
        Value::Object(Arc::new(RwLock::new(ObjectData {
            class_name: Some(class_name.into()),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })))
    }

    /// Build a map value with arbitrary keys.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        Value::Map(Arc::new(RwLock::new(entries.into_iter().collect())))
    }

    /// Build a set value.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(Arc::new(RwLock::new(items.into_iter().collect())))
    }

    /// Build an error value without a stack.
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Value {
        Value::Error {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Build a function stub.
    pub fn function(name: impl Into<String>) -> Value {
        Value::Function { name: name.into() }
    }

    /// Build a deferred property value.
    pub fn getter(f: impl Fn() -> Result<Value, String> + Send + Sync + 'static) -> Value {
        Value::Getter(Arc::new(f))
    }

    /// Runtime truthiness, the criterion used by `console.assert`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::BigInt(digits) => digits != "0" && digits != "-0",
            _ => true,
        }
    }

    /// Stable identity address for containers, used as the visited-set key.
    pub(crate) fn address(&self) -> Option<usize> {
        match self {
            Value::Array(r) => Some(Arc::as_ptr(r) as *const () as usize),
            Value::Object(r) => Some(Arc::as_ptr(r) as *const () as usize),
            Value::Map(r) => Some(Arc::as_ptr(r) as *const () as usize),
            Value::Set(r) => Some(Arc::as_ptr(r) as *const () as usize),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Num(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

// Shallow on purpose: containers may be cyclic, so Debug prints only their
// identity and length.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Num(n) => write!(f, "Num({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Symbol(d) => write!(f, "Symbol({d:?})"),
            Value::BigInt(d) => write!(f, "BigInt({d})"),
            Value::Array(r) => write!(f, "Array(len={})", r.read().len()),
            Value::Object(r) => write!(f, "Object(fields={})", r.read().fields.len()),
            Value::Map(r) => write!(f, "Map(entries={})", r.read().len()),
            Value::Set(r) => write!(f, "Set(len={})", r.read().len()),
            Value::Function { name } => write!(f, "Function({name})"),
            Value::Error { name, message, .. } => write!(f, "Error({name}: {message})"),
            Value::Date(dt) => write!(f, "Date({dt})"),
            Value::Regexp { source, flags } => write!(f, "Regexp(/{source}/{flags})"),
            Value::Getter(_) => write!(f, "Getter(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Num(0.0).is_truthy());
        assert!(!Value::Num(-0.0).is_truthy());
        assert!(!Value::Num(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::BigInt("0".into()).is_truthy());

        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Num(1.0).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::array([]).is_truthy());
        assert!(Value::object(Vec::<(&str, Value)>::new()).is_truthy());
    }

    #[test]
    fn test_container_identity_is_shared() {
        let arr = Value::array([Value::from(1)]);
        let alias = arr.clone();
        assert_eq!(arr.address(), alias.address());

        let other = Value::array([Value::from(1)]);
        assert_ne!(arr.address(), other.address());
        assert_eq!(Value::from(1).address(), None);
    }

    #[test]
    fn test_cyclic_graph_is_constructible() {
        let obj = Value::object([("name", Value::from("loop"))]);
        if let Value::Object(handle) = &obj {
            handle.write().fields.insert("own".to_string(), obj.clone());
        }
        if let Value::Object(handle) = &obj {
            let data = handle.read();
            assert_eq!(data.fields["own"].address(), obj.address());
        } else {
            unreachable!();
        }
    }
}
