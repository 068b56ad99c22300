//! Contracts: a criterion tagged with the provider that declared it

use super::accessor::AccessorCriterion;
use super::call::CallCriterion;
use super::value::ValueCriterion;
use super::violation::{ContractViolation, ViolationKind};
use super::CheckOptions;
use crate::host::{Subject, SubjectId};
use serde::Serialize;
use std::fmt;

/// The three contract shapes
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Value(ValueCriterion),
    Call(CallCriterion),
    Accessor(AccessorCriterion),
}

impl Criterion {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Criterion::Value(_) => "value",
            Criterion::Call(_) => "call",
            Criterion::Accessor(_) => "accessor",
        }
    }

    /// Whether an absent member satisfies this criterion
    pub fn admits_missing(&self) -> bool {
        match self {
            Criterion::Value(value) => value.type_set().admits_undefined(),
            Criterion::Call(_) | Criterion::Accessor(_) => false,
        }
    }

    pub fn expand(&self, other: &Criterion) -> Result<Criterion, ContractViolation> {
        match (self, other) {
            (Criterion::Value(mine), Criterion::Value(theirs)) => {
                Ok(Criterion::Value(mine.expand(theirs)))
            }
            (Criterion::Call(mine), Criterion::Call(theirs)) => {
                Ok(Criterion::Call(mine.expand(theirs)))
            }
            (Criterion::Accessor(mine), Criterion::Accessor(theirs)) => {
                Ok(Criterion::Accessor(mine.expand(theirs)))
            }
            _ => Err(self.shape_conflict(other)),
        }
    }

    pub fn compare(&self, other: &Criterion, options: &CheckOptions) -> Result<(), ContractViolation> {
        match (self, other) {
            (Criterion::Value(mine), Criterion::Value(theirs)) => mine.compare(theirs, options),
            (Criterion::Call(mine), Criterion::Call(theirs)) => mine.compare(theirs, options),
            (Criterion::Accessor(mine), Criterion::Accessor(theirs)) => {
                mine.compare(theirs, options)
            }
            _ => Err(self.shape_conflict(other)),
        }
    }

    fn shape_conflict(&self, other: &Criterion) -> ContractViolation {
        ContractViolation::new(
            ViolationKind::CompositionConflict,
            format!(
                "{} contract cannot be combined with a {} contract",
                self.shape_name(),
                other.shape_name()
            ),
        )
    }

    pub(crate) fn nesting_depth(&self) -> usize {
        match self {
            Criterion::Value(value) => value.nesting_depth(),
            Criterion::Call(call) => call.nesting_depth(),
            Criterion::Accessor(accessor) => accessor.nesting_depth(),
        }
    }
}

impl From<ValueCriterion> for Criterion {
    fn from(criterion: ValueCriterion) -> Self {
        Criterion::Value(criterion)
    }
}

impl From<CallCriterion> for Criterion {
    fn from(criterion: CallCriterion) -> Self {
        Criterion::Call(criterion)
    }
}

impl From<AccessorCriterion> for Criterion {
    fn from(criterion: AccessorCriterion) -> Self {
        Criterion::Accessor(criterion)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Value(value) => write!(f, "{}", value),
            Criterion::Call(call) => write!(f, "{}", call),
            Criterion::Accessor(accessor) => write!(f, "{}", accessor),
        }
    }
}

/// Declaring provider of a contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Origin {
    pub subject: SubjectId,
    pub name: String,
}

impl Origin {
    pub fn of(subject: &Subject) -> Self {
        Self {
            subject: subject.id(),
            name: subject.name().to_string(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub criterion: Criterion,
    pub origin: Origin,
}

impl Contract {
    pub fn new(criterion: impl Into<Criterion>, origin: Origin) -> Self {
        Self {
            criterion: criterion.into(),
            origin,
        }
    }

    /// Widen by `other`; the receiver's origin stays authoritative
    pub fn expand(&self, other: &Contract) -> Result<Contract, ContractViolation> {
        self.criterion
            .expand(&other.criterion)
            .map(|criterion| Contract {
                criterion,
                origin: self.origin.clone(),
            })
            .map_err(|e| self.name_origins(e, other))
    }

    /// Check `other` against this contract; failures name both origins
    pub fn compare(&self, other: &Contract, options: &CheckOptions) -> Result<(), ContractViolation> {
        self.criterion
            .compare(&other.criterion, options)
            .map_err(|e| self.name_origins(e, other))
    }

    fn name_origins(&self, violation: ContractViolation, other: &Contract) -> ContractViolation {
        violation
            .with_origin(self.origin.name.clone())
            .with_origin(other.origin.name.clone())
    }
}
