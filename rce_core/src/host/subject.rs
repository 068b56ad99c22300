//! Subjects (named shapes) and their member surfaces

use super::function::{Function, HostError};
use super::value::Value;
use crate::config::compile_time::registry::MAX_ANCESTRY_DEPTH;
use crate::criteria::Criterion;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type SubjectId = u64;
pub type SubjectRef = Arc<Subject>;

static NEXT_SUBJECT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectRole {
    Concrete,
    /// Pure contract source; its declarations are erased once folded
    Provider,
}

/// Which member table of a subject an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Instance,
    Static,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Instance => "instance",
            Surface::Static => "static",
        }
    }
}

/// One own member of a surface
#[derive(Debug, Clone)]
pub enum Member {
    Value(Value),
    Call(Function),
    Accessor {
        read: Option<Function>,
        write: Option<Function>,
    },
    /// Contract declared by a provider
    Declaration(Criterion),
}

impl Member {
    pub fn accessor(read: Option<Function>, write: Option<Function>) -> Self {
        Member::Accessor { read, write }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Member::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Invocable members: calls, and plain values holding a callable
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Member::Call(function) => Some(function),
            Member::Value(Value::Callable(function)) => Some(function),
            _ => None,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self, Member::Declaration(_))
    }
}

#[derive(Debug, Clone)]
pub struct MemberSlot {
    pub name: String,
    pub member: Member,
    /// Name of the subject this member was last defined on
    pub origin: String,
}

/// Ordered own-member table
#[derive(Debug, Default)]
pub struct MemberTable {
    slots: RwLock<Vec<MemberSlot>>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<MemberSlot>> {
        self.slots.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<MemberSlot>> {
        self.slots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, name: &str) -> Option<MemberSlot> {
        self.read().iter().find(|slot| slot.name == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|slot| slot.name == name)
    }

    /// Define or redefine a member; redefinition keeps the original position
    pub fn define(&self, name: &str, member: Member, origin: &str) {
        let mut slots = self.write();
        let slot = MemberSlot {
            name: name.to_string(),
            member,
            origin: origin.to_string(),
        };

        match slots.iter_mut().find(|existing| existing.name == name) {
            Some(existing) => *existing = slot,
            None => slots.push(slot),
        }
    }

    pub fn remove(&self, name: &str) -> Option<MemberSlot> {
        let mut slots = self.write();
        let index = slots.iter().position(|slot| slot.name == name)?;
        Some(slots.remove(index))
    }

    pub fn snapshot(&self) -> Vec<MemberSlot> {
        self.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|slot| slot.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Named shape with an optional ancestor and two member surfaces
pub struct Subject {
    id: SubjectId,
    name: String,
    role: SubjectRole,
    ancestor: Option<SubjectRef>,
    instance: MemberTable,
    statics: MemberTable,
}

impl Subject {
    pub fn id(&self) -> SubjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> SubjectRole {
        self.role
    }

    pub fn is_provider(&self) -> bool {
        self.role == SubjectRole::Provider
    }

    pub fn ancestor(&self) -> Option<&SubjectRef> {
        self.ancestor.as_ref()
    }

    pub fn surface(&self, surface: Surface) -> &MemberTable {
        match surface {
            Surface::Instance => &self.instance,
            Surface::Static => &self.statics,
        }
    }

    pub fn instance_members(&self) -> &MemberTable {
        &self.instance
    }

    pub fn static_members(&self) -> &MemberTable {
        &self.statics
    }

    /// True when `other` appears in this subject's ancestor chain
    pub fn descends_from(&self, other: &Subject) -> bool {
        let mut current = self.ancestor.as_ref();
        let mut depth = 0;

        while let Some(ancestor) = current {
            if ancestor.id == other.id {
                return true;
            }
            depth += 1;
            if depth >= MAX_ANCESTRY_DEPTH {
                return false;
            }
            current = ancestor.ancestor.as_ref();
        }

        false
    }

    /// Resolve a member on this surface or, failing that, along the ancestor chain
    pub fn lookup(&self, surface: Surface, name: &str) -> Option<MemberSlot> {
        if let Some(slot) = self.surface(surface).get(name) {
            return Some(slot);
        }

        let mut current = self.ancestor.as_ref();
        let mut depth = 0;
        while let Some(ancestor) = current {
            if let Some(slot) = ancestor.surface(surface).get(name) {
                return Some(slot);
            }
            depth += 1;
            if depth >= MAX_ANCESTRY_DEPTH {
                break;
            }
            current = ancestor.ancestor.as_ref();
        }

        None
    }

    /// Invoke a member resolved through [`Subject::lookup`]
    pub fn invoke(&self, surface: Surface, name: &str, args: &[Value]) -> Result<Value, HostError> {
        let slot = self
            .lookup(surface, name)
            .ok_or_else(|| HostError::thrown(format!("{}.{} is not defined", self.name, name)))?;
        invoke_slot(&slot, args)
    }

    /// Read a member resolved through [`Subject::lookup`], going through its getter
    pub fn get(&self, surface: Surface, name: &str) -> Result<Value, HostError> {
        match self.lookup(surface, name) {
            Some(slot) => read_slot(&slot),
            None => Ok(Value::Undefined),
        }
    }

    /// Write a member, going through a setter when one resolves
    pub fn set(&self, surface: Surface, name: &str, value: Value) -> Result<(), HostError> {
        match self.lookup(surface, name) {
            Some(slot) if matches!(slot.member, Member::Accessor { .. }) => {
                write_slot(&slot, value)
            }
            _ => {
                self.surface(surface)
                    .define(name, Member::Value(value), &self.name);
                Ok(())
            }
        }
    }
}

pub(crate) fn invoke_slot(slot: &MemberSlot, args: &[Value]) -> Result<Value, HostError> {
    match slot.member.as_function() {
        Some(function) => function.call(args),
        None => Err(HostError::thrown(format!("{} is not a function", slot.name))),
    }
}

pub(crate) fn read_slot(slot: &MemberSlot) -> Result<Value, HostError> {
    match &slot.member {
        Member::Value(value) => Ok(value.clone()),
        Member::Call(function) => Ok(Value::Callable(function.clone())),
        Member::Accessor { read: Some(read), .. } => read.call(&[]),
        Member::Accessor { read: None, .. } => Ok(Value::Undefined),
        Member::Declaration(_) => Ok(Value::Undefined),
    }
}

pub(crate) fn write_slot(slot: &MemberSlot, value: Value) -> Result<(), HostError> {
    match &slot.member {
        Member::Accessor {
            write: Some(write), ..
        } => write.call(&[value]).map(|_| ()),
        _ => Err(HostError::thrown(format!("{} has no setter", slot.name))),
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("ancestor", &self.ancestor.as_ref().map(|a| a.name.clone()))
            .finish()
    }
}

/// Builder for subjects
pub struct SubjectBuilder {
    name: String,
    role: SubjectRole,
    ancestor: Option<SubjectRef>,
    instance: Vec<(String, Member)>,
    statics: Vec<(String, Member)>,
}

impl SubjectBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: SubjectRole::Concrete,
            ancestor: None,
            instance: Vec::new(),
            statics: Vec::new(),
        }
    }

    pub fn provider(mut self) -> Self {
        self.role = SubjectRole::Provider;
        self
    }

    pub fn extends(mut self, ancestor: &SubjectRef) -> Self {
        self.ancestor = Some(ancestor.clone());
        self
    }

    pub fn member(mut self, name: &str, member: Member) -> Self {
        self.instance.push((name.to_string(), member));
        self
    }

    pub fn static_member(mut self, name: &str, member: Member) -> Self {
        self.statics.push((name.to_string(), member));
        self
    }

    /// Shorthand for an instance-surface contract declaration
    pub fn declare(self, name: &str, criterion: impl Into<Criterion>) -> Self {
        self.member(name, Member::Declaration(criterion.into()))
    }

    pub fn declare_static(self, name: &str, criterion: impl Into<Criterion>) -> Self {
        self.static_member(name, Member::Declaration(criterion.into()))
    }

    pub fn method(self, name: &str, function: Function) -> Self {
        self.member(name, Member::Call(function))
    }

    pub fn build(self) -> SubjectRef {
        let subject = Subject {
            id: NEXT_SUBJECT_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            role: self.role,
            ancestor: self.ancestor,
            instance: MemberTable::new(),
            statics: MemberTable::new(),
        };

        for (name, member) in self.instance {
            subject.instance.define(&name, member, &subject.name);
        }
        for (name, member) in self.statics {
            subject.statics.define(&name, member, &subject.name);
        }

        Arc::new(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: i32) -> Function {
        Function::new("constant", move |_: &[Value]| Ok(Value::from(value)))
    }

    #[test]
    fn test_member_table_keeps_order_on_redefine() {
        let table = MemberTable::new();
        table.define("a", Member::Value(1.into()), "S");
        table.define("b", Member::Value(2.into()), "S");
        table.define("a", Member::Value(3.into()), "T");

        assert_eq!(table.names(), vec!["a", "b"]);
        let a = table.get("a").unwrap();
        assert_eq!(a.origin, "T");
        assert_eq!(a.member.as_value(), Some(&Value::from(3)));

        assert!(table.remove("a").is_some());
        assert!(table.remove("a").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup_walks_ancestors() {
        let base = SubjectBuilder::new("Base").method("run", constant(1)).build();
        let derived = SubjectBuilder::new("Derived").extends(&base).build();

        assert_eq!(
            derived.invoke(Surface::Instance, "run", &[]).unwrap(),
            Value::from(1)
        );
        assert!(derived.invoke(Surface::Static, "run", &[]).is_err());
        assert!(derived.descends_from(&base));
        assert!(!base.descends_from(&derived));
    }

    #[test]
    fn test_accessor_get_and_set() {
        let store = Arc::new(RwLock::new(Value::from(0)));
        let read_store = store.clone();
        let write_store = store.clone();
        let subject = SubjectBuilder::new("Counter")
            .member(
                "count",
                Member::accessor(
                    Some(Function::new("get count", move |_: &[Value]| {
                        Ok(read_store.read().unwrap().clone())
                    })),
                    Some(Function::new("set count", move |args: &[Value]| {
                        *write_store.write().unwrap() = args[0].clone();
                        Ok(Value::Undefined)
                    })),
                ),
            )
            .build();

        subject.set(Surface::Instance, "count", Value::from(5)).unwrap();
        assert_eq!(subject.get(Surface::Instance, "count").unwrap(), Value::from(5));
        assert_eq!(subject.get(Surface::Instance, "missing").unwrap(), Value::Undefined);
    }
}
