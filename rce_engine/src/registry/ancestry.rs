// src/registry/ancestry.rs
//! Bounded ancestry walk over the member reflector

use crate::context::EngineContext;
use crate::error::EngineError;
use rce_core::config::compile_time::registry::MAX_ANCESTRY_DEPTH;
use rce_core::host::{SubjectId, SubjectRef};

/// Ancestors of `subject`, nearest first.
///
/// The walk stops before any subject in the global terminator set or in
/// `extra_terminators`; a terminator itself is never returned.
pub fn ancestry(
    context: &EngineContext,
    subject: &SubjectRef,
    extra_terminators: &[SubjectId],
) -> Result<Vec<SubjectRef>, EngineError> {
    let reflector = context.reflector();
    let mut chain = Vec::new();
    let mut current = reflector.ancestor(subject);

    while let Some(ancestor) = current {
        if context.is_chain_terminator(ancestor.id()) || extra_terminators.contains(&ancestor.id())
        {
            break;
        }
        if chain.len() >= MAX_ANCESTRY_DEPTH {
            return Err(EngineError::AncestryTooDeep {
                subject: subject.name().to_string(),
                limit: MAX_ANCESTRY_DEPTH,
            });
        }

        current = reflector.ancestor(&ancestor);
        chain.push(ancestor);
    }

    Ok(chain)
}
