//! Runtime contract enforcement engine
//!
//! Builds on the contract algebra in `rce_core`:
//!
//! - [`composer::RuleComposer`] folds provider declarations and ancestry into
//!   per-subject [`registry::ContractRegistry`] values
//! - [`enforcer::Enforcer`] installs call-time guards around contracted members
//! - [`validator::Validator`] checks current members without installing anything
//!
//! All three share one explicitly constructed [`context::EngineContext`].

pub mod composer;
pub mod context;
pub mod enforcer;
pub mod error;
pub mod registry;
pub mod validator;

pub use composer::{AttachOptions, ComposeOptions, FoldMode, RuleComposer};
pub use context::{EngineContext, WrapperTable};
pub use enforcer::{Enforcer, WrapSummary};
pub use error::EngineError;
pub use registry::{
    ContractRegistry, MemberRule, RegistryQuery, RegistryState, RegistryStatistics, ShapeCounts,
};
pub use validator::{ValidationReport, ValidationWarning, Validator, WarningKind};

/// Commonly used engine and core types
pub mod prelude {
    pub use crate::composer::{AttachOptions, ComposeOptions, RuleComposer};
    pub use crate::context::EngineContext;
    pub use crate::enforcer::{Enforcer, WrapSummary};
    pub use crate::error::EngineError;
    pub use crate::registry::{ContractRegistry, RegistryState};
    pub use crate::validator::{ValidationReport, Validator};
    pub use rce_core::prelude::*;
}
