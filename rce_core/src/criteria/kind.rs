//! Value kinds admitted by a type set

use super::call::CallCriterion;
use super::type_set::TypeSet;
use super::CheckOptions;
use crate::host::{SubjectRef, Value};
use serde::Serialize;
use std::fmt;

/// Runtime kind tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Null,
    Undefined,
    Object,
    Boolean,
    Number,
    String,
    Symbol,
    Callable,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Undefined => "undefined",
            Primitive::Object => "object",
            Primitive::Boolean => "boolean",
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::Symbol => "symbol",
            Primitive::Callable => "callable",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Primitive::Null),
            "undefined" => Some(Primitive::Undefined),
            "object" => Some(Primitive::Object),
            "boolean" => Some(Primitive::Boolean),
            "number" => Some(Primitive::Number),
            "string" => Some(Primitive::String),
            "symbol" | "symbol-like" => Some(Primitive::Symbol),
            "callable" | "function" => Some(Primitive::Callable),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a type set
#[derive(Debug, Clone)]
pub enum Kind {
    /// Wildcard; must be the only entry of its set
    Mixed,
    Primitive(Primitive),
    /// Structural "is-a" reference to a shape
    Shape(SubjectRef),
    /// Callable whose own declared contract must be compatible
    Contract(Box<CallCriterion>),
}

impl Kind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mixed" => Some(Kind::Mixed),
            other => Primitive::parse(other).map(Kind::Primitive),
        }
    }

    pub fn shape(subject: &SubjectRef) -> Self {
        Kind::Shape(subject.clone())
    }

    pub fn contract(criterion: CallCriterion) -> Self {
        Kind::Contract(Box::new(criterion))
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Kind::Mixed)
    }

    /// Whether a runtime value is of this kind.
    ///
    /// A callable without a declared contract satisfies any nested contract kind; the
    /// enforcer wraps it when it crosses a call boundary.
    pub fn matches(&self, value: &Value, options: &CheckOptions) -> bool {
        match self {
            Kind::Mixed => true,
            Kind::Primitive(primitive) => value.primitive() == *primitive,
            Kind::Shape(shape) => value.is_instance_of(shape),
            Kind::Contract(expected) => match value {
                Value::Callable(function) => match function.declared() {
                    Some(declared) => expected.compare(declared, options).is_ok(),
                    None => true,
                },
                _ => false,
            },
        }
    }

    /// Whether `set` admits every value this kind admits
    pub fn is_covered_by(&self, set: &TypeSet, options: &CheckOptions) -> bool {
        if set.is_mixed() {
            return true;
        }

        set.entries().iter().any(|cover| match (self, cover) {
            (Kind::Primitive(mine), Kind::Primitive(theirs)) => mine == theirs,
            (Kind::Shape(mine), Kind::Shape(theirs)) => {
                mine.id() == theirs.id() || mine.descends_from(theirs)
            }
            (Kind::Contract(mine), Kind::Contract(theirs)) => {
                theirs.compare(mine, options).is_ok()
            }
            _ => false,
        })
    }

    /// Depth of nested contracts under this kind
    pub fn nesting_depth(&self) -> usize {
        match self {
            Kind::Contract(criterion) => 1 + criterion.nesting_depth(),
            _ => 0,
        }
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Kind::Mixed, Kind::Mixed) => true,
            (Kind::Primitive(a), Kind::Primitive(b)) => a == b,
            (Kind::Shape(a), Kind::Shape(b)) => a.id() == b.id(),
            (Kind::Contract(a), Kind::Contract(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Mixed => f.write_str("mixed"),
            Kind::Primitive(primitive) => f.write_str(primitive.as_str()),
            Kind::Shape(shape) => write!(f, "{}", shape.name()),
            Kind::Contract(criterion) => write!(f, "{}", criterion),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::ValueCriterion;
    use crate::host::{Function, HostObject, SubjectBuilder};

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!(Kind::parse("mixed"), Some(Kind::Mixed));
        assert_eq!(
            Kind::parse("symbol-like"),
            Some(Kind::Primitive(Primitive::Symbol))
        );
        assert_eq!(
            Kind::parse("function"),
            Some(Kind::Primitive(Primitive::Callable))
        );
        assert_eq!(Kind::parse("integer"), None);
    }

    #[test]
    fn test_shape_matching_and_coverage() {
        let options = CheckOptions::default();
        let animal = SubjectBuilder::new("Animal").build();
        let dog = SubjectBuilder::new("Dog").extends(&animal).build();
        let rex = Value::Object(HostObject::of_shape(&dog));

        assert!(Kind::shape(&animal).matches(&rex, &options));
        assert!(!Kind::shape(&dog).matches(&Value::Object(HostObject::of_shape(&animal)), &options));

        let animals = TypeSet::single(Kind::shape(&animal));
        let dogs = TypeSet::single(Kind::shape(&dog));
        assert!(Kind::shape(&dog).is_covered_by(&animals, &options));
        assert!(!Kind::shape(&animal).is_covered_by(&dogs, &options));
    }

    #[test]
    fn test_nested_contract_matching() {
        let options = CheckOptions::default();
        let numeric = CallCriterion::new(
            vec![ValueCriterion::parse(&["number"]).unwrap()],
            ValueCriterion::parse(&["number"]).unwrap(),
        );
        let textual = CallCriterion::new(
            vec![ValueCriterion::parse(&["string"]).unwrap()],
            ValueCriterion::parse(&["string"]).unwrap(),
        );
        let kind = Kind::contract(numeric.clone());
        let plain = Function::new("plain", |_: &[Value]| Ok(Value::Null));

        assert!(kind.matches(&Value::Callable(plain.clone()), &options));
        assert!(kind.matches(&Value::Callable(plain.with_declared(numeric)), &options));
        assert!(!kind.matches(&Value::Callable(plain.with_declared(textual)), &options));
        assert!(!kind.matches(&Value::from(1), &options));
    }
}
