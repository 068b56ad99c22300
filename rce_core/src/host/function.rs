//! Invocable host values

use super::value::Value;
use crate::criteria::{CallCriterion, ContractViolation};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type FunctionId = u64;

/// Body of a host callable
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, HostError> + Send + Sync;

static NEXT_FUNCTION_ID: AtomicU64 = AtomicU64::new(1);

/// Failure raised by a host call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// A wrapper rejected the call
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// The business logic itself failed
    #[error("{0}")]
    Thrown(String),
}

impl HostError {
    pub fn thrown(message: impl Into<String>) -> Self {
        HostError::Thrown(message.into())
    }

    pub fn as_violation(&self) -> Option<&ContractViolation> {
        match self {
            HostError::Contract(violation) => Some(violation),
            HostError::Thrown(_) => None,
        }
    }
}

struct FunctionInner {
    id: FunctionId,
    name: String,
    declared: Option<CallCriterion>,
    body: Arc<NativeFn>,
}

/// Shared callable with a stable identity
#[derive(Clone)]
pub struct Function(Arc<FunctionInner>);

impl Function {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self::from_parts(name.into(), None, Arc::new(body))
    }

    /// Callable that carries its own declared contract
    pub fn with_contract<F>(name: impl Into<String>, criterion: CallCriterion, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self::from_parts(name.into(), Some(criterion), Arc::new(body))
    }

    fn from_parts(name: String, declared: Option<CallCriterion>, body: Arc<NativeFn>) -> Self {
        Self(Arc::new(FunctionInner {
            id: NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed),
            name,
            declared,
            body,
        }))
    }

    /// A new callable sharing this body that carries its own declared contract.
    /// The result has a fresh identity.
    pub fn with_declared(&self, criterion: CallCriterion) -> Self {
        Self::from_parts(self.0.name.clone(), Some(criterion), self.0.body.clone())
    }

    pub fn id(&self) -> FunctionId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn declared(&self) -> Option<&CallCriterion> {
        self.0.declared.as_ref()
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, HostError> {
        (self.0.body)(args)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("declared", &self.0.declared.is_some())
            .finish()
    }
}
