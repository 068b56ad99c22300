//! Member reflection
//!
//! The engine never touches member tables directly; it asks a [`MemberReflector`]
//! for a target's own surface and goes through it to define or remove members.

use super::object::ObjectRef;
use super::subject::{Member, MemberTable, SubjectRef, Surface};
use super::value::Value;
use serde::Serialize;

/// What the engine operates on: one surface of a subject, or an object
#[derive(Debug, Clone)]
pub enum Target {
    Subject(SubjectRef, Surface),
    Object(ObjectRef),
}

impl Target {
    pub fn instance(subject: &SubjectRef) -> Self {
        Target::Subject(subject.clone(), Surface::Instance)
    }

    pub fn statics(subject: &SubjectRef) -> Self {
        Target::Subject(subject.clone(), Surface::Static)
    }

    pub fn object(object: &ObjectRef) -> Self {
        Target::Object(object.clone())
    }

    pub(crate) fn table(&self) -> &MemberTable {
        match self {
            Target::Subject(subject, surface) => subject.surface(*surface),
            Target::Object(object) => object.members(),
        }
    }

    /// Surface whose contracts apply; objects take their shape's instance contracts
    pub fn surface(&self) -> Surface {
        match self {
            Target::Subject(_, surface) => *surface,
            Target::Object(_) => Surface::Instance,
        }
    }

    /// Subject whose registry governs this target
    pub fn governing_subject(&self) -> Option<&SubjectRef> {
        match self {
            Target::Subject(subject, _) => Some(subject),
            Target::Object(object) => object.shape(),
        }
    }

    /// Display name used in reports and log context
    pub fn name(&self) -> String {
        match self {
            Target::Subject(subject, Surface::Instance) => subject.name().to_string(),
            Target::Subject(subject, Surface::Static) => format!("{} (static)", subject.name()),
            Target::Object(object) => object.origin_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Value,
    Call,
    Accessor,
    Declaration,
}

/// Reflection record for one own member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflectedMember {
    pub name: String,
    pub kind: MemberKind,
    pub readable: bool,
    pub writable: bool,
    /// Subject the member was last defined on
    pub origin: String,
}

impl ReflectedMember {
    fn describe(name: &str, member: &Member, origin: &str) -> Self {
        let (kind, readable, writable) = match member {
            Member::Value(Value::Callable(_)) => (MemberKind::Call, true, true),
            Member::Value(_) => (MemberKind::Value, true, true),
            Member::Call(_) => (MemberKind::Call, true, true),
            Member::Accessor { read, write } => {
                (MemberKind::Accessor, read.is_some(), write.is_some())
            }
            Member::Declaration(_) => (MemberKind::Declaration, false, false),
        };

        Self {
            name: name.to_string(),
            kind,
            readable,
            writable,
            origin: origin.to_string(),
        }
    }
}

/// Own-surface reflection interface consumed by the engine
pub trait MemberReflector: Send + Sync {
    /// Own members of `target`, in definition order
    fn own_members(&self, target: &Target) -> Vec<ReflectedMember>;

    fn read_member(&self, target: &Target, name: &str) -> Option<Member>;

    /// Plain value of a member, without invoking accessors
    fn read_value(&self, target: &Target, name: &str) -> Option<Value> {
        match self.read_member(target, name)? {
            Member::Value(value) => Some(value),
            Member::Call(function) => Some(Value::Callable(function)),
            _ => None,
        }
    }

    fn define_member(&self, target: &Target, name: &str, member: Member, origin: &str);

    fn remove_member(&self, target: &Target, name: &str) -> Option<Member>;

    /// Immediate ancestor of `subject`
    fn ancestor(&self, subject: &SubjectRef) -> Option<SubjectRef>;

    fn is_provider(&self, subject: &SubjectRef) -> bool;
}

/// Reflector over the in-process host model
#[derive(Debug, Default, Clone, Copy)]
pub struct HostReflector;

impl MemberReflector for HostReflector {
    fn own_members(&self, target: &Target) -> Vec<ReflectedMember> {
        target
            .table()
            .snapshot()
            .iter()
            .map(|slot| ReflectedMember::describe(&slot.name, &slot.member, &slot.origin))
            .collect()
    }

    fn read_member(&self, target: &Target, name: &str) -> Option<Member> {
        target.table().get(name).map(|slot| slot.member)
    }

    fn define_member(&self, target: &Target, name: &str, member: Member, origin: &str) {
        target.table().define(name, member, origin);
    }

    fn remove_member(&self, target: &Target, name: &str) -> Option<Member> {
        target.table().remove(name).map(|slot| slot.member)
    }

    fn ancestor(&self, subject: &SubjectRef) -> Option<SubjectRef> {
        subject.ancestor().cloned()
    }

    fn is_provider(&self, subject: &SubjectRef) -> bool {
        subject.is_provider()
    }
}
