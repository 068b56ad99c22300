//! Value criteria: a type set plus inclusion and exclusion literals

use super::type_set::TypeSet;
use super::violation::{ContractViolation, PathSegment, ViolationKind};
use super::CheckOptions;
use crate::config::compile_time::criteria::MAX_MEMBERSHIP_LITERALS;
use crate::host::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ValueCriterion {
    type_set: TypeSet,
    includes: Vec<Value>,
    excludes: Vec<Value>,
}

impl ValueCriterion {
    /// Every literal must itself satisfy the type set
    pub fn new(
        type_set: TypeSet,
        includes: Vec<Value>,
        excludes: Vec<Value>,
    ) -> Result<Self, ContractViolation> {
        let options = CheckOptions::default();
        let mut problems = Vec::new();

        if includes.len() + excludes.len() > MAX_MEMBERSHIP_LITERALS {
            problems.push(ContractViolation::new(
                ViolationKind::MalformedTypeSet,
                format!(
                    "{} membership literals exceed the limit of {}",
                    includes.len() + excludes.len(),
                    MAX_MEMBERSHIP_LITERALS
                ),
            ));
        }

        for (label, literals) in [("includes", &includes), ("excludes", &excludes)] {
            for (position, literal) in literals.iter().enumerate() {
                if !type_set.matches(literal, &options) {
                    problems.push(
                        ContractViolation::new(
                            ViolationKind::MalformedTypeSet,
                            format!(
                                "{} literal {} is not admitted by {}",
                                label, literal, type_set
                            ),
                        )
                        .at(PathSegment::Position(position)),
                    );
                }
            }
        }

        if !problems.is_empty() {
            return Err(ContractViolation::aggregate(
                ViolationKind::MalformedTypeSet,
                format!("invalid value criterion: {} problem(s)", problems.len()),
                problems,
            ));
        }

        Ok(Self {
            type_set,
            includes,
            excludes,
        })
    }

    /// Criterion constrained by its type set only
    pub fn of(type_set: TypeSet) -> Self {
        Self {
            type_set,
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn mixed() -> Self {
        Self::of(TypeSet::mixed())
    }

    pub fn parse(names: &[&str]) -> Result<Self, ContractViolation> {
        TypeSet::parse(names).map(Self::of)
    }

    pub fn type_set(&self) -> &TypeSet {
        &self.type_set
    }

    pub fn includes(&self) -> &[Value] {
        &self.includes
    }

    pub fn excludes(&self) -> &[Value] {
        &self.excludes
    }

    pub fn validate(&self, value: &Value) -> Result<(), ContractViolation> {
        self.validate_with(value, &CheckOptions::default())
    }

    pub fn validate_with(
        &self,
        value: &Value,
        options: &CheckOptions,
    ) -> Result<(), ContractViolation> {
        let mut problems = Vec::new();

        if !self.type_set.matches(value, options) {
            let mismatch = ContractViolation::new(
                ViolationKind::TypeMismatch,
                format!(
                    "expected {}, got {} ({})",
                    self.type_set,
                    value.primitive(),
                    value
                ),
            );
            if options.skip_membership_on_type_mismatch {
                return Err(mismatch);
            }
            problems.push(mismatch);
        }

        if !self.includes.is_empty()
            && !self
                .includes
                .iter()
                .any(|literal| value.structurally_matches(literal))
        {
            problems.push(ContractViolation::new(
                ViolationKind::NotIncluded,
                format!("{} is not one of {}", value, render_literals(&self.includes)),
            ));
        }

        if let Some(literal) = self
            .excludes
            .iter()
            .find(|literal| value.structurally_matches(literal))
        {
            problems.push(ContractViolation::new(
                ViolationKind::Excluded,
                format!("{} matches excluded literal {}", value, literal),
            ));
        }

        match problems.len() {
            0 => Ok(()),
            1 => Err(problems.remove(0)),
            _ => {
                let kind = problems[0].kind;
                Err(ContractViolation::aggregate(
                    kind,
                    format!("{} rejected on {} counts", value, problems.len()),
                    problems,
                ))
            }
        }
    }

    /// Union growth: the other side's missing kinds and literals are appended
    pub fn expand(&self, other: &ValueCriterion) -> ValueCriterion {
        let mut includes = self.includes.clone();
        for literal in &other.includes {
            if !includes.contains(literal) {
                includes.push(literal.clone());
            }
        }

        let mut excludes = self.excludes.clone();
        for literal in &other.excludes {
            if !excludes.contains(literal) {
                excludes.push(literal.clone());
            }
        }

        ValueCriterion {
            type_set: self.type_set.union(&other.type_set),
            includes,
            excludes,
        }
    }

    /// Check `other` against this authoritative criterion
    pub fn compare(
        &self,
        other: &ValueCriterion,
        options: &CheckOptions,
    ) -> Result<(), ContractViolation> {
        let mut problems = Vec::new();

        if !other.type_set.is_subset_of(&self.type_set, options) {
            problems.push(ContractViolation::new(
                ViolationKind::CompositionConflict,
                format!(
                    "type set {} is not covered by {}",
                    other.type_set, self.type_set
                ),
            ));
        }

        // An empty include list is unconstrained and covers any other list.
        if !self.includes.is_empty() && !other.includes.is_empty() {
            let extra: Vec<Value> = other
                .includes
                .iter()
                .filter(|literal| !self.includes.contains(literal))
                .cloned()
                .collect();
            if !extra.is_empty() {
                problems.push(ContractViolation::new(
                    ViolationKind::CompositionConflict,
                    format!(
                        "includes {} are not in {}",
                        render_literals(&extra),
                        render_literals(&self.includes)
                    ),
                ));
            }
        }

        let missing: Vec<Value> = self
            .excludes
            .iter()
            .filter(|literal| !other.excludes.contains(literal))
            .cloned()
            .collect();
        if !missing.is_empty() {
            problems.push(ContractViolation::new(
                ViolationKind::CompositionConflict,
                format!("excludes {} are not excluded", render_literals(&missing)),
            ));
        }

        match problems.len() {
            0 => Ok(()),
            1 => Err(problems.remove(0)),
            n => Err(ContractViolation::aggregate(
                ViolationKind::CompositionConflict,
                format!("value criteria disagree on {} counts", n),
                problems,
            )),
        }
    }

    pub(crate) fn nesting_depth(&self) -> usize {
        self.type_set.nesting_depth()
    }
}

fn render_literals(literals: &[Value]) -> String {
    let rendered: Vec<String> = literals.iter().map(|v| v.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

impl fmt::Display for ValueCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_set)?;
        if !self.includes.is_empty() {
            write!(f, " in {}", render_literals(&self.includes))?;
        }
        if !self.excludes.is_empty() {
            write!(f, " not in {}", render_literals(&self.excludes))?;
        }
        Ok(())
    }
}
