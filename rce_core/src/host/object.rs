//! Plain host objects

use super::function::HostError;
use super::subject::{
    invoke_slot, read_slot, write_slot, Member, MemberSlot, MemberTable, SubjectRef, Surface,
};
use super::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type ObjectRef = Arc<HostObject>;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Object instance; members not found on the object resolve through its shape
pub struct HostObject {
    id: u64,
    shape: Option<SubjectRef>,
    members: MemberTable,
}

impl HostObject {
    pub fn new() -> ObjectRef {
        Self::build(None)
    }

    pub fn of_shape(shape: &SubjectRef) -> ObjectRef {
        Self::build(Some(shape.clone()))
    }

    pub fn with_members(shape: Option<&SubjectRef>, members: Vec<(&str, Member)>) -> ObjectRef {
        let object = Self::build(shape.cloned());
        let origin = object.origin_name();
        for (name, member) in members {
            object.members.define(name, member, &origin);
        }
        object
    }

    fn build(shape: Option<SubjectRef>) -> ObjectRef {
        Arc::new(Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            shape,
            members: MemberTable::new(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn shape(&self) -> Option<&SubjectRef> {
        self.shape.as_ref()
    }

    pub fn members(&self) -> &MemberTable {
        &self.members
    }

    /// Name recorded as the origin of members defined directly on this object
    pub fn origin_name(&self) -> String {
        match &self.shape {
            Some(shape) => format!("{} instance", shape.name()),
            None => "object".to_string(),
        }
    }

    fn lookup(&self, name: &str) -> Option<MemberSlot> {
        self.members.get(name).or_else(|| {
            self.shape
                .as_ref()
                .and_then(|shape| shape.lookup(Surface::Instance, name))
        })
    }

    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, HostError> {
        let slot = self
            .lookup(name)
            .ok_or_else(|| HostError::thrown(format!("{} is not defined", name)))?;
        invoke_slot(&slot, args)
    }

    pub fn get(&self, name: &str) -> Result<Value, HostError> {
        match self.lookup(name) {
            Some(slot) => read_slot(&slot),
            None => Ok(Value::Undefined),
        }
    }

    pub fn set(&self, name: &str, value: Value) -> Result<(), HostError> {
        match self.lookup(name) {
            Some(slot) if matches!(slot.member, Member::Accessor { .. }) => {
                write_slot(&slot, value)
            }
            _ => {
                self.members
                    .define(name, Member::Value(value), &self.origin_name());
                Ok(())
            }
        }
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("id", &self.id)
            .field("shape", &self.shape.as_ref().map(|s| s.name().to_string()))
            .field("members", &self.members.names())
            .finish()
    }
}
