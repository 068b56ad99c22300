//! Call criteria: positional parameter criteria and a result criterion

use super::value::ValueCriterion;
use super::violation::{ContractViolation, PathSegment, ViolationKind};
use super::CheckOptions;
use crate::host::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct CallCriterion {
    parameters: Vec<ValueCriterion>,
    result: ValueCriterion,
}

impl CallCriterion {
    pub fn new(parameters: Vec<ValueCriterion>, result: ValueCriterion) -> Self {
        Self { parameters, result }
    }

    pub fn parameters(&self) -> &[ValueCriterion] {
        &self.parameters
    }

    pub fn result(&self) -> &ValueCriterion {
        &self.result
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Check every declared position. Missing arguments are `undefined`; arguments
    /// past the declared parameters are unconstrained.
    pub fn validate_call(&self, args: &[Value]) -> Result<(), ContractViolation> {
        self.validate_call_with(args, &CheckOptions::default())
    }

    pub fn validate_call_with(
        &self,
        args: &[Value],
        options: &CheckOptions,
    ) -> Result<(), ContractViolation> {
        let undefined = Value::Undefined;
        let causes: Vec<ContractViolation> = self
            .parameters
            .iter()
            .enumerate()
            .filter_map(|(position, parameter)| {
                let arg = args.get(position).unwrap_or(&undefined);
                parameter
                    .validate_with(arg, options)
                    .err()
                    .map(|e| e.at(PathSegment::Position(position)))
            })
            .collect();

        if causes.is_empty() {
            return Ok(());
        }

        Err(ContractViolation::aggregate(
            ViolationKind::ArgumentMismatch,
            format!(
                "{} of {} argument(s) violate the call contract",
                causes.len(),
                self.parameters.len()
            ),
            causes,
        ))
    }

    pub fn validate_result(&self, value: &Value) -> Result<(), ContractViolation> {
        self.validate_result_with(value, &CheckOptions::default())
    }

    pub fn validate_result_with(
        &self,
        value: &Value,
        options: &CheckOptions,
    ) -> Result<(), ContractViolation> {
        self.result.validate_with(value, options).map_err(|cause| {
            ContractViolation::aggregate(
                ViolationKind::ResultMismatch,
                format!("result {} violates the call contract", value),
                vec![cause.at(PathSegment::Result)],
            )
        })
    }

    /// Positional union growth; parameters only the other side declares are appended
    pub fn expand(&self, other: &CallCriterion) -> CallCriterion {
        let length = self.parameters.len().max(other.parameters.len());
        let parameters = (0..length)
            .filter_map(|i| match (self.parameters.get(i), other.parameters.get(i)) {
                (Some(mine), Some(theirs)) => Some(mine.expand(theirs)),
                (Some(mine), None) => Some(mine.clone()),
                (None, Some(theirs)) => Some(theirs.clone()),
                (None, None) => None,
            })
            .collect();

        CallCriterion {
            parameters,
            result: self.result.expand(&other.result),
        }
    }

    /// Check `other` against this authoritative criterion, position by position
    pub fn compare(
        &self,
        other: &CallCriterion,
        options: &CheckOptions,
    ) -> Result<(), ContractViolation> {
        let mut problems = Vec::new();

        if options.strict_parameter_arity && self.parameters.len() != other.parameters.len() {
            problems.push(ContractViolation::new(
                ViolationKind::CompositionConflict,
                format!(
                    "expected {} parameter(s), found {}",
                    self.parameters.len(),
                    other.parameters.len()
                ),
            ));
        }

        for (position, (mine, theirs)) in self.parameters.iter().zip(&other.parameters).enumerate()
        {
            if let Err(problem) = mine.compare(theirs, options) {
                problems.push(problem.at(PathSegment::Position(position)));
            }
        }

        if let Err(problem) = self.result.compare(&other.result, options) {
            problems.push(problem.at(PathSegment::Result));
        }

        match problems.len() {
            0 => Ok(()),
            1 => Err(problems.remove(0)),
            n => Err(ContractViolation::aggregate(
                ViolationKind::CompositionConflict,
                format!("call criteria disagree at {} place(s)", n),
                problems,
            )),
        }
    }

    pub(crate) fn nesting_depth(&self) -> usize {
        self.parameters
            .iter()
            .chain(std::iter::once(&self.result))
            .map(ValueCriterion::nesting_depth)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for CallCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "({}) -> {}", parameters.join(", "), self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn criterion(parameters: &[&[&str]], result: &[&str]) -> CallCriterion {
        CallCriterion::new(
            parameters
                .iter()
                .map(|names| ValueCriterion::parse(names).unwrap())
                .collect(),
            ValueCriterion::parse(result).unwrap(),
        )
    }

    #[test]
    fn test_validate_call_aggregates_positions() {
        let run = criterion(&[&["number"], &["string"]], &["number"]);

        assert!(run.validate_call(&[Value::from(1), Value::from("a")]).is_ok());

        let error = run
            .validate_call(&[Value::from("x"), Value::from(2)])
            .unwrap_err();
        assert_eq!(error.kind, ViolationKind::ArgumentMismatch);
        assert_eq!(error.leaf_count(), 2);
        assert_eq!(error.causes[0].path, vec![PathSegment::Position(0)]);
        assert_eq!(error.causes[1].path, vec![PathSegment::Position(1)]);
    }

    #[test]
    fn test_missing_and_extra_arguments() {
        let run = criterion(&[&["number"]], &["mixed"]);

        assert!(run
            .validate_call(&[Value::from(1), Value::from("extra")])
            .is_ok());
        let error = run.validate_call(&[]).unwrap_err();
        assert_eq!(error.causes[0].kind, ViolationKind::TypeMismatch);

        let optional = criterion(&[&["number", "undefined"]], &["mixed"]);
        assert!(optional.validate_call(&[]).is_ok());
    }

    #[test]
    fn test_result_mismatch_wraps_cause() {
        let run = criterion(&[], &["number"]);

        assert!(run.validate_result(&Value::from(4)).is_ok());
        assert_matches!(
            run.validate_result(&Value::from("y")),
            Err(ContractViolation { kind: ViolationKind::ResultMismatch, .. })
        );
        let error = run.validate_result(&Value::from("y")).unwrap_err();
        assert_eq!(error.causes[0].kind, ViolationKind::TypeMismatch);
        assert_eq!(error.causes[0].path, vec![PathSegment::Result]);
    }

    #[test]
    fn test_expand_is_permissive_on_length() {
        let short = criterion(&[&["number"]], &["number"]);
        let long = criterion(&[&["string"], &["boolean"]], &["string"]);

        let expanded = short.expand(&long);
        assert_eq!(expanded.arity(), 2);
        assert_eq!(expanded.to_string(), "([number, string], [boolean]) -> [number, string]");
    }

    #[test]
    fn test_compare_is_strict_on_length_unless_flagged() {
        let short = criterion(&[&["number"]], &["number"]);
        let long = criterion(&[&["number"], &["string"]], &["number"]);

        assert!(short.compare(&short, &CheckOptions::default()).is_ok());
        assert!(short.compare(&long, &CheckOptions::default()).is_err());

        let lenient = CheckOptions {
            strict_parameter_arity: false,
            ..CheckOptions::default()
        };
        assert!(short.compare(&long, &lenient).is_ok());
    }

    #[test]
    fn test_compare_paths_point_at_position() {
        let first = criterion(&[&["number"]], &["number"]);
        let second = criterion(&[&["number", "string"]], &["number"]);

        let error = first.compare(&second, &CheckOptions::default()).unwrap_err();
        assert_eq!(error.kind, ViolationKind::CompositionConflict);
        assert_eq!(error.path, vec![PathSegment::Position(0)]);
    }
}
