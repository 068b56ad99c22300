//! In-process model of the dynamically-typed host
//!
//! Values, callables, subjects (named shapes with an optional ancestor) and plain
//! objects, plus the reflection interface the engine reads them through.

pub mod function;
pub mod object;
pub mod reflector;
pub mod subject;
pub mod value;

pub use function::{Function, FunctionId, HostError, NativeFn};
pub use object::{HostObject, ObjectRef};
pub use reflector::{HostReflector, MemberKind, MemberReflector, ReflectedMember, Target};
pub use subject::{
    Member, MemberSlot, MemberTable, Subject, SubjectBuilder, SubjectId, SubjectRef, SubjectRole,
    Surface,
};
pub use value::{Symbol, Value};
