// src/registry/query.rs
//! Query interface for registry searches

use super::{ContractRegistry, MemberRule};
use rce_core::criteria::Criterion;
use rce_core::host::{SubjectId, Surface};

pub struct RegistryQuery<'a> {
    registry: &'a ContractRegistry,
}

impl<'a> RegistryQuery<'a> {
    pub fn new(registry: &'a ContractRegistry) -> Self {
        Self { registry }
    }

    fn select<F>(&self, surface: Surface, predicate: F) -> Vec<String>
    where
        F: Fn(&MemberRule) -> bool,
    {
        self.registry
            .rules(surface)
            .iter()
            .filter_map(|(name, rule)| {
                if predicate(rule) {
                    Some(name.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Members whose effective criterion has the given shape (`value`, `call`, `accessor`)
    pub fn find_by_shape(&self, surface: Surface, shape: &str) -> Vec<String> {
        self.select(surface, |rule| rule.criterion().shape_name() == shape)
    }

    /// Members one of whose contributing contracts came from `provider`
    pub fn find_declared_by(&self, surface: Surface, provider: SubjectId) -> Vec<String> {
        self.select(surface, |rule| {
            rule.sources
                .iter()
                .any(|source| source.origin.subject == provider)
        })
    }

    /// Members a subject may leave undefined
    pub fn find_optional(&self, surface: Surface) -> Vec<String> {
        self.select(surface, |rule| rule.criterion().admits_missing())
    }

    /// Members more than one provider contributed to
    pub fn find_shared(&self, surface: Surface) -> Vec<String> {
        self.select(surface, |rule| rule.sources.len() > 1)
    }

    /// Call members declaring at least `arity` parameters
    pub fn find_calls_with_arity(&self, surface: Surface, arity: usize) -> Vec<String> {
        self.select(surface, |rule| match rule.criterion() {
            Criterion::Call(call) => call.arity() >= arity,
            _ => false,
        })
    }
}
