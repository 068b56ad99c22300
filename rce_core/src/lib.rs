//! Core of the runtime contract engine
//!
//! The host object model the engine reasons about, the contract algebra (type sets,
//! value/call/accessor criteria and their `expand`/`compare` primitives), the violation
//! types every check reports, and the logging and configuration services shared with
//! `rce_engine`.

pub mod config;
pub mod criteria;
pub mod host;
#[macro_use]
pub mod logging;

pub use criteria::{
    AccessorCriterion, CallCriterion, CheckOptions, Contract, ContractViolation, Criterion, Kind,
    Origin, PathSegment, Primitive, TypeSet, TypeSetBuilder, ValueCriterion, ViolationKind,
};
pub use host::{
    Function, HostError, HostObject, HostReflector, Member, MemberReflector, SubjectBuilder,
    SubjectRef, Surface, Target, Value,
};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{EngineConfig, RuntimeConfig};
    pub use crate::criteria::{
        AccessorCriterion, CallCriterion, CheckOptions, Contract, ContractViolation, Criterion,
        Kind, Origin, PathSegment, Primitive, TypeSet, ValueCriterion, ViolationKind,
    };
    pub use crate::host::{
        Function, HostError, HostObject, HostReflector, Member, MemberReflector, ObjectRef,
        Subject, SubjectBuilder, SubjectId, SubjectRef, Surface, Target, Value,
    };
}
