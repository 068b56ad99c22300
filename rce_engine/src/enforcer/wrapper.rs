// src/enforcer/wrapper.rs
//! Call-time guards installed around contracted members
//!
//! A guard closes over an immutable criterion and the path of the member it protects.
//! Violations it raises are prefixed with that path and surface to the caller as
//! [`HostError::Contract`]; failures of the original callable pass through untouched.

use rce_core::criteria::{
    AccessorCriterion, CallCriterion, CheckOptions, ContractViolation, Kind, PathSegment,
    ValueCriterion,
};
use rce_core::host::{Function, HostError, Value};
use rce_core::log_debug;

#[derive(Debug, Clone)]
struct CallGuard {
    criterion: CallCriterion,
    options: CheckOptions,
    path: Vec<PathSegment>,
}

impl CallGuard {
    fn invoke(&self, original: &Function, args: &[Value]) -> Result<Value, HostError> {
        log_debug!(
            "Call checked",
            "member" => render(&self.path),
            "arguments" => args.len()
        );

        self.criterion
            .validate_call_with(args, &self.options)
            .map_err(|violation| self.locate(violation))?;

        let args: Vec<Value> = args
            .iter()
            .enumerate()
            .map(|(position, arg)| match self.criterion.parameters().get(position) {
                Some(parameter) => self.guard_nested(arg, parameter, PathSegment::Position(position)),
                None => arg.clone(),
            })
            .collect();

        let result = original.call(&args)?;

        self.criterion
            .validate_result_with(&result, &self.options)
            .map_err(|violation| self.locate(violation))?;

        Ok(self.guard_nested(&result, self.criterion.result(), PathSegment::Result))
    }

    /// Wrap a callable crossing this boundary when its criterion names a nested contract
    fn guard_nested(&self, value: &Value, criterion: &ValueCriterion, segment: PathSegment) -> Value {
        let Value::Callable(function) = value else {
            return value.clone();
        };

        let nested = criterion
            .type_set()
            .entries()
            .iter()
            .find_map(|kind| match kind {
                Kind::Contract(contract) if kind.matches(value, &self.options) => {
                    Some(contract.as_ref())
                }
                _ => None,
            });

        match nested {
            Some(contract) => {
                let mut path = self.path.clone();
                path.push(segment);
                Value::Callable(guard_call(function, contract, path, self.options))
            }
            None => value.clone(),
        }
    }

    fn locate(&self, violation: ContractViolation) -> HostError {
        HostError::Contract(prefix(violation, &self.path))
    }
}

fn prefix(violation: ContractViolation, path: &[PathSegment]) -> ContractViolation {
    path.iter()
        .rev()
        .fold(violation, |violation, segment| violation.at(segment.clone()))
}

fn render(path: &[PathSegment]) -> String {
    let mut rendered = String::new();
    for segment in path {
        if !rendered.is_empty() && matches!(segment, PathSegment::Member(_)) {
            rendered.push('.');
        }
        rendered.push_str(&segment.to_string());
    }
    rendered
}

/// Callable that checks `criterion` around every invocation of `original`
pub(crate) fn guard_call(
    original: &Function,
    criterion: &CallCriterion,
    path: Vec<PathSegment>,
    options: CheckOptions,
) -> Function {
    let guard = CallGuard {
        criterion: criterion.clone(),
        options,
        path,
    };
    let inner = original.clone();

    Function::with_contract(original.name(), criterion.clone(), move |args: &[Value]| {
        guard.invoke(&inner, args)
    })
}

/// Getter that checks the value `original` returns against the read side
pub(crate) fn guard_read(
    original: &Function,
    criterion: &AccessorCriterion,
    path: Vec<PathSegment>,
    options: CheckOptions,
) -> Function {
    let accessor = criterion.clone();
    let inner = original.clone();

    let body = move |args: &[Value]| {
        log_debug!("Read checked", "member" => render(&path));
        let value = inner.call(args)?;
        accessor
            .validate_read(&value, &options)
            .map_err(|violation| HostError::Contract(prefix(violation, &path)))?;
        Ok(value)
    };

    match criterion.read() {
        Some(read) => Function::with_contract(original.name(), read.clone(), body),
        None => Function::new(original.name(), body),
    }
}

/// Setter that checks the assigned value against the write side before storing it
pub(crate) fn guard_write(
    original: &Function,
    criterion: &AccessorCriterion,
    path: Vec<PathSegment>,
    options: CheckOptions,
) -> Function {
    let accessor = criterion.clone();
    let inner = original.clone();

    let body = move |args: &[Value]| {
        log_debug!("Write checked", "member" => render(&path));
        let undefined = Value::Undefined;
        accessor
            .validate_write(args.first().unwrap_or(&undefined), &options)
            .map_err(|violation| HostError::Contract(prefix(violation, &path)))?;
        inner.call(args)
    };

    match criterion.write() {
        Some(write) => Function::with_contract(original.name(), write.clone(), body),
        None => Function::new(original.name(), body),
    }
}
