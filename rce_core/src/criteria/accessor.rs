//! Accessor criteria: an optional read side and an optional write side

use super::call::CallCriterion;
use super::value::ValueCriterion;
use super::violation::{ContractViolation, PathSegment, ViolationKind};
use super::CheckOptions;
use crate::host::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct AccessorCriterion {
    read: Option<CallCriterion>,
    write: Option<CallCriterion>,
}

impl AccessorCriterion {
    /// At least one side must be declared
    pub fn new(
        read: Option<CallCriterion>,
        write: Option<CallCriterion>,
    ) -> Result<Self, ContractViolation> {
        if read.is_none() && write.is_none() {
            return Err(ContractViolation::new(
                ViolationKind::AccessorShapeMismatch,
                "accessor declares neither a read nor a write side",
            ));
        }
        Ok(Self { read, write })
    }

    /// Read-only accessor whose getter returns values matching `value`
    pub fn reading(value: ValueCriterion) -> Self {
        Self {
            read: Some(read_side(value)),
            write: None,
        }
    }

    /// Write-only accessor whose setter takes values matching `value`
    pub fn writing(value: ValueCriterion) -> Self {
        Self {
            read: None,
            write: Some(write_side(value)),
        }
    }

    pub fn read_write(read: ValueCriterion, write: ValueCriterion) -> Self {
        Self {
            read: Some(read_side(read)),
            write: Some(write_side(write)),
        }
    }

    pub fn read(&self) -> Option<&CallCriterion> {
        self.read.as_ref()
    }

    pub fn write(&self) -> Option<&CallCriterion> {
        self.write.as_ref()
    }

    /// Value a getter returned; only the read side's result is consulted
    pub fn validate_read(&self, value: &Value, options: &CheckOptions) -> Result<(), ContractViolation> {
        match &self.read {
            Some(read) => read
                .validate_result_with(value, options)
                .map_err(|e| e.at(PathSegment::Read)),
            None => Ok(()),
        }
    }

    /// Value passed to a setter; only the write side's first parameter is consulted
    pub fn validate_write(&self, value: &Value, options: &CheckOptions) -> Result<(), ContractViolation> {
        match &self.write {
            Some(write) => write
                .validate_call_with(std::slice::from_ref(value), options)
                .map_err(|e| e.at(PathSegment::Write)),
            None => Ok(()),
        }
    }

    fn presence(&self) -> (bool, bool) {
        (self.read.is_some(), self.write.is_some())
    }

    /// Fill whichever side is missing from the other declaration
    pub fn expand(&self, other: &AccessorCriterion) -> AccessorCriterion {
        AccessorCriterion {
            read: merge_side(&self.read, &other.read),
            write: merge_side(&self.write, &other.write),
        }
    }

    /// Presence of each side must match exactly before sides are compared
    pub fn compare(
        &self,
        other: &AccessorCriterion,
        options: &CheckOptions,
    ) -> Result<(), ContractViolation> {
        if self.presence() != other.presence() {
            return Err(ContractViolation::new(
                ViolationKind::AccessorShapeMismatch,
                format!(
                    "accessor declares {}, other declares {}",
                    describe_presence(self.presence()),
                    describe_presence(other.presence())
                ),
            ));
        }

        let mut problems = Vec::new();
        if let (Some(mine), Some(theirs)) = (&self.read, &other.read) {
            if let Err(problem) = mine.compare(theirs, options) {
                problems.push(problem.at(PathSegment::Read));
            }
        }
        if let (Some(mine), Some(theirs)) = (&self.write, &other.write) {
            if let Err(problem) = mine.compare(theirs, options) {
                problems.push(problem.at(PathSegment::Write));
            }
        }

        match problems.len() {
            0 => Ok(()),
            1 => Err(problems.remove(0)),
            _ => Err(ContractViolation::aggregate(
                ViolationKind::CompositionConflict,
                "accessor sides disagree",
                problems,
            )),
        }
    }

    pub(crate) fn nesting_depth(&self) -> usize {
        self.read
            .iter()
            .chain(self.write.iter())
            .map(CallCriterion::nesting_depth)
            .max()
            .unwrap_or(0)
    }
}

fn read_side(value: ValueCriterion) -> CallCriterion {
    CallCriterion::new(Vec::new(), value)
}

fn write_side(value: ValueCriterion) -> CallCriterion {
    CallCriterion::new(vec![value], ValueCriterion::mixed())
}

fn merge_side(mine: &Option<CallCriterion>, theirs: &Option<CallCriterion>) -> Option<CallCriterion> {
    match (mine, theirs) {
        (Some(mine), Some(theirs)) => Some(mine.expand(theirs)),
        (Some(side), None) | (None, Some(side)) => Some(side.clone()),
        (None, None) => None,
    }
}

fn describe_presence(presence: (bool, bool)) -> &'static str {
    match presence {
        (true, true) => "read and write",
        (true, false) => "read only",
        (false, true) => "write only",
        (false, false) => "nothing",
    }
}

impl fmt::Display for AccessorCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "accessor {{")?;
        if let Some(read) = &self.read {
            write!(f, " read: {}", read.result())?;
        }
        if let Some(write) = &self.write {
            match write.parameters().first() {
                Some(parameter) => write!(f, " write: {}", parameter)?,
                None => write!(f, " write: []")?,
            }
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number() -> ValueCriterion {
        ValueCriterion::parse(&["number"]).unwrap()
    }

    #[test]
    fn test_neither_side_is_rejected() {
        let error = AccessorCriterion::new(None, None).unwrap_err();
        assert_eq!(error.kind, ViolationKind::AccessorShapeMismatch);
    }

    #[test]
    fn test_sides_validate_independently() {
        let options = CheckOptions::default();
        let accessor = AccessorCriterion::read_write(number(), ValueCriterion::parse(&["string"]).unwrap());

        assert!(accessor.validate_read(&Value::from(1), &options).is_ok());
        assert!(accessor.validate_write(&Value::from("a"), &options).is_ok());

        let error = accessor.validate_write(&Value::from(1), &options).unwrap_err();
        assert_eq!(error.kind, ViolationKind::ArgumentMismatch);
        assert_eq!(error.path, vec![PathSegment::Write]);

        let read_only = AccessorCriterion::reading(number());
        assert!(read_only.validate_write(&Value::from("anything"), &options).is_ok());
    }

    #[test]
    fn test_compare_requires_identical_presence() {
        let options = CheckOptions::default();
        let read_only = AccessorCriterion::reading(number());
        let both = AccessorCriterion::read_write(number(), number());

        assert!(both.compare(&both, &options).is_ok());
        assert_eq!(
            read_only.compare(&both, &options).unwrap_err().kind,
            ViolationKind::AccessorShapeMismatch
        );
        assert_eq!(
            both.compare(&read_only, &options).unwrap_err().kind,
            ViolationKind::AccessorShapeMismatch
        );
    }

    #[test]
    fn test_expand_fills_missing_side() {
        let read_only = AccessorCriterion::reading(number());
        let write_only = AccessorCriterion::writing(ValueCriterion::parse(&["string"]).unwrap());

        let expanded = read_only.expand(&write_only);
        assert!(expanded.read().is_some());
        assert!(expanded.write().is_some());
        assert_eq!(expanded.to_string(), "accessor { read: [number] write: [string] }");
    }
}
