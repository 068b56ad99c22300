//! Type sets and their validating builder

use super::call::CallCriterion;
use super::kind::Kind;
use super::violation::{ContractViolation, PathSegment, ViolationKind};
use super::CheckOptions;
use crate::config::compile_time::criteria::{MAX_NESTED_CONTRACT_DEPTH, MAX_TYPE_SET_ENTRIES};
use crate::host::{SubjectRef, Value};
use std::fmt;

/// Ordered, duplicate-free, non-empty set of kinds. `mixed` is always the sole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSet {
    entries: Vec<Kind>,
}

impl TypeSet {
    pub fn builder() -> TypeSetBuilder {
        TypeSetBuilder::new()
    }

    pub fn mixed() -> Self {
        Self {
            entries: vec![Kind::Mixed],
        }
    }

    pub fn single(kind: Kind) -> Self {
        Self {
            entries: vec![kind],
        }
    }

    /// Build from kind names
    pub fn parse(names: &[&str]) -> Result<Self, ContractViolation> {
        names
            .iter()
            .fold(TypeSetBuilder::new(), |builder, name| builder.name(name))
            .build()
    }

    pub fn entries(&self) -> &[Kind] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self.entries.as_slice(), [Kind::Mixed])
    }

    pub fn contains(&self, kind: &Kind) -> bool {
        self.entries.contains(kind)
    }

    pub fn matches(&self, value: &Value, options: &CheckOptions) -> bool {
        self.entries.iter().any(|kind| kind.matches(value, options))
    }

    /// Whether a missing member satisfies this set
    pub fn admits_undefined(&self) -> bool {
        self.is_mixed() || self.matches(&Value::Undefined, &CheckOptions::default())
    }

    /// Receiver's entries first, then the other's entries not already present.
    /// Widening by `mixed` collapses the set to `mixed`.
    pub fn union(&self, other: &TypeSet) -> TypeSet {
        if self.is_mixed() || other.is_mixed() {
            return TypeSet::mixed();
        }

        let mut entries = self.entries.clone();
        for kind in &other.entries {
            if !entries.contains(kind) {
                entries.push(kind.clone());
            }
        }
        TypeSet { entries }
    }

    /// Every kind this set admits is admitted by `other`
    pub fn is_subset_of(&self, other: &TypeSet, options: &CheckOptions) -> bool {
        other.is_mixed()
            || self
                .entries
                .iter()
                .all(|kind| kind.is_covered_by(other, options))
    }

    pub(crate) fn nesting_depth(&self) -> usize {
        self.entries
            .iter()
            .map(Kind::nesting_depth)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.entries.iter().map(|k| k.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

enum RawEntry {
    Name(String),
    Kind(Kind),
}

/// Collects raw entries and validates them all at once
#[derive(Default)]
pub struct TypeSetBuilder {
    entries: Vec<RawEntry>,
}

impl TypeSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.entries.push(RawEntry::Name(name.to_string()));
        self
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.entries.push(RawEntry::Kind(kind));
        self
    }

    pub fn shape(self, subject: &SubjectRef) -> Self {
        self.kind(Kind::shape(subject))
    }

    pub fn contract(self, criterion: CallCriterion) -> Self {
        self.kind(Kind::contract(criterion))
    }

    /// Validate every entry, reporting all problems in one `MalformedTypeSet`
    pub fn build(self) -> Result<TypeSet, ContractViolation> {
        let mut problems = Vec::new();
        let mut entries: Vec<Kind> = Vec::new();

        if self.entries.is_empty() {
            problems.push(ContractViolation::new(
                ViolationKind::MalformedTypeSet,
                "type set is empty",
            ));
        }

        if self.entries.len() > MAX_TYPE_SET_ENTRIES {
            problems.push(ContractViolation::new(
                ViolationKind::MalformedTypeSet,
                format!(
                    "type set has {} entries, limit is {}",
                    self.entries.len(),
                    MAX_TYPE_SET_ENTRIES
                ),
            ));
        }

        for (position, raw) in self.entries.into_iter().enumerate() {
            let kind = match raw {
                RawEntry::Name(name) => match Kind::parse(&name) {
                    Some(kind) => kind,
                    None => {
                        problems.push(
                            ContractViolation::new(
                                ViolationKind::MalformedTypeSet,
                                format!("unknown kind '{}'", name),
                            )
                            .at(PathSegment::Position(position)),
                        );
                        continue;
                    }
                },
                RawEntry::Kind(kind) => kind,
            };

            if kind.nesting_depth() > MAX_NESTED_CONTRACT_DEPTH {
                problems.push(
                    ContractViolation::new(
                        ViolationKind::MalformedTypeSet,
                        format!(
                            "nested contracts exceed depth {}",
                            MAX_NESTED_CONTRACT_DEPTH
                        ),
                    )
                    .at(PathSegment::Position(position)),
                );
                continue;
            }

            if entries.contains(&kind) {
                problems.push(
                    ContractViolation::new(
                        ViolationKind::MalformedTypeSet,
                        format!("duplicate kind '{}'", kind),
                    )
                    .at(PathSegment::Position(position)),
                );
                continue;
            }

            entries.push(kind);
        }

        if entries.len() > 1 && entries.iter().any(Kind::is_mixed) {
            problems.push(ContractViolation::new(
                ViolationKind::MalformedTypeSet,
                "'mixed' must be the only entry of its type set",
            ));
        }

        if problems.is_empty() {
            Ok(TypeSet { entries })
        } else {
            Err(ContractViolation::aggregate(
                ViolationKind::MalformedTypeSet,
                format!("malformed type set: {} problem(s)", problems.len()),
                problems,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{Primitive, ValueCriterion};

    #[test]
    fn test_valid_set_keeps_order() {
        let set = TypeSet::parse(&["string", "number", "null"]).unwrap();
        let names: Vec<String> = set.entries().iter().map(|k| k.to_string()).collect();

        assert_eq!(names, vec!["string", "number", "null"]);
        assert_eq!(set.to_string(), "[string, number, null]");
    }

    #[test]
    fn test_build_aggregates_every_problem() {
        let error = TypeSet::parse(&["number", "integer", "number", "mixed", "text"]).unwrap_err();

        assert_eq!(error.kind, ViolationKind::MalformedTypeSet);
        // two unknown names, one duplicate, mixed not sole
        assert_eq!(error.leaf_count(), 4);
        assert_eq!(error.causes[0].path, vec![PathSegment::Position(1)]);
    }

    #[test]
    fn test_empty_set_is_malformed() {
        let error = TypeSet::builder().build().unwrap_err();
        assert_eq!(error.leaf_count(), 1);
        assert!(error.causes[0].message.contains("empty"));
    }

    #[test]
    fn test_mixed_alone_is_valid() {
        assert!(TypeSet::parse(&["mixed"]).unwrap().is_mixed());
        assert!(TypeSet::parse(&["mixed", "mixed"]).is_err());
    }

    #[test]
    fn test_union_is_receiver_first_and_duplicate_free() {
        let a = TypeSet::parse(&["number", "string"]).unwrap();
        let b = TypeSet::parse(&["boolean", "number"]).unwrap();

        assert_eq!(a.union(&b), TypeSet::parse(&["number", "string", "boolean"]).unwrap());
        assert!(a.union(&TypeSet::mixed()).is_mixed());
        assert!(TypeSet::mixed().union(&a).is_mixed());
    }

    #[test]
    fn test_subset() {
        let options = CheckOptions::default();
        let number = TypeSet::parse(&["number"]).unwrap();
        let both = TypeSet::parse(&["number", "string"]).unwrap();

        assert!(number.is_subset_of(&both, &options));
        assert!(!both.is_subset_of(&number, &options));
        assert!(both.is_subset_of(&TypeSet::mixed(), &options));
        assert!(!TypeSet::mixed().is_subset_of(&both, &options));
    }

    #[test]
    fn test_admits_undefined() {
        assert!(TypeSet::mixed().admits_undefined());
        assert!(TypeSet::parse(&["undefined", "number"]).unwrap().admits_undefined());
        assert!(!TypeSet::parse(&["number"]).unwrap().admits_undefined());
    }

    #[test]
    fn test_nested_contract_entries_dedupe_structurally() {
        let criterion = CallCriterion::new(vec![], ValueCriterion::mixed());
        let error = TypeSet::builder()
            .contract(criterion.clone())
            .contract(criterion)
            .kind(Kind::Primitive(Primitive::Callable))
            .build()
            .unwrap_err();

        assert_eq!(error.leaf_count(), 1);
    }
}
