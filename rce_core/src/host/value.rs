//! Runtime values of the host
//!
//! Primitives compare structurally; objects, callables and symbols compare by identity.

use super::function::Function;
use super::object::ObjectRef;
use super::subject::Subject;
use crate::config::compile_time::criteria::MAX_STRUCTURAL_MATCH_DEPTH;
use crate::criteria::Primitive;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique symbol; two symbols with the same description are still distinct
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

struct SymbolInner {
    id: u64,
    description: String,
}

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        Self(Arc::new(SymbolInner {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        }))
    }

    pub fn description(&self) -> &str {
        &self.0.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0.description)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
    Object(ObjectRef),
    Callable(Function),
}

impl Value {
    /// Runtime kind tag
    pub fn primitive(&self) -> Primitive {
        match self {
            Value::Null => Primitive::Null,
            Value::Undefined => Primitive::Undefined,
            Value::Boolean(_) => Primitive::Boolean,
            Value::Number(_) => Primitive::Number,
            Value::String(_) => Primitive::String,
            Value::Symbol(_) => Primitive::Symbol,
            Value::Object(_) => Primitive::Object,
            Value::Callable(_) => Primitive::Callable,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Callable(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// True when this value is an object whose shape is `shape` or descends from it
    pub fn is_instance_of(&self, shape: &Subject) -> bool {
        match self {
            Value::Object(object) => object
                .shape()
                .map(|own| own.id() == shape.id() || own.descends_from(shape))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Equal to `pattern`, or both are objects and every plain field of `pattern` is
    /// present on this value and matches recursively
    pub fn structurally_matches(&self, pattern: &Value) -> bool {
        self.matches_at_depth(pattern, 0)
    }

    fn matches_at_depth(&self, pattern: &Value, depth: usize) -> bool {
        if self == pattern {
            return true;
        }

        let (Value::Object(value), Value::Object(pattern)) = (self, pattern) else {
            return false;
        };

        if depth >= MAX_STRUCTURAL_MATCH_DEPTH {
            return false;
        }

        pattern.members().snapshot().iter().all(|slot| {
            match (slot.member.as_value(), value.members().get(&slot.name)) {
                (Some(expected), Some(found)) => found
                    .member
                    .as_value()
                    .map(|actual| actual.matches_at_depth(expected, depth + 1))
                    .unwrap_or(false),
                (None, found) => found.is_some(),
                (Some(_), None) => false,
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Undefined => f.write_str("undefined"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Symbol(symbol) => write!(f, "Symbol({})", symbol.description()),
            Value::Object(object) => match object.shape() {
                Some(shape) => write!(f, "[object {}]", shape.name()),
                None => f.write_str("[object]"),
            },
            Value::Callable(function) => write!(f, "[callable {}]", function.name()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Callable(function)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}
