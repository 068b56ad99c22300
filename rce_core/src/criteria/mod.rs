//! Contract algebra
//!
//! Type sets, the three criterion shapes and their two composition primitives:
//! `expand` (union growth) and `compare` (the receiver is authoritative and the
//! argument must already fit inside it).

pub mod accessor;
pub mod call;
pub mod contract;
pub mod kind;
pub mod type_set;
pub mod value;
pub mod violation;

pub use accessor::AccessorCriterion;
pub use call::CallCriterion;
pub use contract::{Contract, Criterion, Origin};
pub use kind::{Kind, Primitive};
pub use type_set::{TypeSet, TypeSetBuilder};
pub use value::ValueCriterion;
pub use violation::{ContractViolation, PathSegment, ViolationKind};

use crate::config::EngineConfig;

/// Switches for the two behaviours callers may tune
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Stop after a type mismatch instead of also checking includes/excludes
    pub skip_membership_on_type_mismatch: bool,

    /// `compare` on call criteria requires equal parameter counts
    pub strict_parameter_arity: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            skip_membership_on_type_mismatch: true,
            strict_parameter_arity: true,
        }
    }
}

impl From<&EngineConfig> for CheckOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            skip_membership_on_type_mismatch: config.skip_membership_on_type_mismatch,
            strict_parameter_arity: config.strict_parameter_arity,
        }
    }
}
