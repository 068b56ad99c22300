// src/registry/mod.rs
//! Per-subject contract registries
//!
//! A registry maps member names to composed rules for both surfaces of one subject,
//! together with the providers already folded into it and any chain terminators local
//! to the subject. Registries move through three states: unregistered (absent from the
//! context), registered (composed, not yet enforced) and built.

pub mod ancestry;
pub mod query;

pub use ancestry::ancestry;
pub use query::RegistryQuery;

use chrono::{DateTime, Utc};
use rce_core::criteria::{Contract, Criterion, Origin};
use rce_core::host::{Subject, SubjectId, Surface};
use std::collections::BTreeMap;

/// Composed rule for one member
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRule {
    /// Rule checked at runtime; its origin is the authoritative declarer
    pub effective: Contract,
    /// Every contributing contract in fold order
    pub sources: Vec<Contract>,
}

impl MemberRule {
    pub fn new(contract: Contract) -> Self {
        Self {
            effective: contract.clone(),
            sources: vec![contract],
        }
    }

    pub fn criterion(&self) -> &Criterion {
        &self.effective.criterion
    }

    pub fn has_source(&self, origin: &Origin) -> bool {
        self.sources.iter().any(|source| source.origin.subject == origin.subject)
    }

    pub fn origins(&self) -> Vec<&str> {
        self.sources
            .iter()
            .map(|source| source.origin.name.as_str())
            .collect()
    }

    /// This rule without the contributions of `excluded`, or `None` when nothing is left.
    ///
    /// When the authoritative source is dropped, the remaining sources are widened
    /// into a new effective rule in fold order.
    pub(crate) fn without_origins(&self, excluded: &[SubjectId]) -> Option<MemberRule> {
        let sources: Vec<Contract> = self
            .sources
            .iter()
            .filter(|source| !excluded.contains(&source.origin.subject))
            .cloned()
            .collect();
        let (first, rest) = sources.split_first()?;

        let effective = if excluded.contains(&self.effective.origin.subject) {
            rest.iter()
                .try_fold(first.clone(), |widened, source| widened.expand(source))
                .unwrap_or_else(|_| first.clone())
        } else {
            self.effective.clone()
        };

        Some(MemberRule { effective, sources })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Unregistered,
    Registered,
    Built,
}

impl RegistryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::Built => "built",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContractRegistry {
    owner: SubjectId,
    owner_name: String,
    member_contracts: BTreeMap<String, MemberRule>,
    static_member_contracts: BTreeMap<String, MemberRule>,
    providers: Vec<Origin>,
    chain_terminators: Vec<SubjectId>,
    built: bool,
    built_at: Option<DateTime<Utc>>,
}

impl ContractRegistry {
    /// Empty registry owned by `subject`
    pub fn new(subject: &Subject) -> Self {
        Self {
            owner: subject.id(),
            owner_name: subject.name().to_string(),
            member_contracts: BTreeMap::new(),
            static_member_contracts: BTreeMap::new(),
            providers: Vec::new(),
            chain_terminators: Vec::new(),
            built: false,
            built_at: None,
        }
    }

    pub fn owner(&self) -> SubjectId {
        self.owner
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn state(&self) -> RegistryState {
        if self.built {
            RegistryState::Built
        } else {
            RegistryState::Registered
        }
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub fn rules(&self, surface: Surface) -> &BTreeMap<String, MemberRule> {
        match surface {
            Surface::Instance => &self.member_contracts,
            Surface::Static => &self.static_member_contracts,
        }
    }

    pub(crate) fn rules_mut(&mut self, surface: Surface) -> &mut BTreeMap<String, MemberRule> {
        match surface {
            Surface::Instance => &mut self.member_contracts,
            Surface::Static => &mut self.static_member_contracts,
        }
    }

    pub fn rule(&self, surface: Surface, name: &str) -> Option<&MemberRule> {
        self.rules(surface).get(name)
    }

    /// Effective contract for a member
    pub fn contract(&self, surface: Surface, name: &str) -> Option<&Contract> {
        self.rule(surface, name).map(|rule| &rule.effective)
    }

    pub fn member_names(&self, surface: Surface) -> Vec<String> {
        self.rules(surface).keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.member_contracts.is_empty() && self.static_member_contracts.is_empty()
    }

    pub fn providers(&self) -> &[Origin] {
        &self.providers
    }

    pub fn has_provider(&self, subject: SubjectId) -> bool {
        self.providers.iter().any(|origin| origin.subject == subject)
    }

    pub(crate) fn add_provider(&mut self, origin: Origin) {
        if !self.has_provider(origin.subject) {
            self.providers.push(origin);
        }
    }

    pub fn chain_terminators(&self) -> &[SubjectId] {
        &self.chain_terminators
    }

    pub(crate) fn add_chain_terminator(&mut self, subject: SubjectId) -> bool {
        if self.chain_terminators.contains(&subject) {
            return false;
        }
        self.chain_terminators.push(subject);
        true
    }

    pub(crate) fn mark_built(&mut self, at: DateTime<Utc>) {
        self.built = true;
        self.built_at = Some(at);
    }

    pub(crate) fn mark_unbuilt(&mut self) {
        self.built = false;
        self.built_at = None;
    }

    /// Copy holding only what did not come from `excluded` providers
    pub(crate) fn without_origins(&self, excluded: &[SubjectId]) -> ContractRegistry {
        let filter = |rules: &BTreeMap<String, MemberRule>| {
            rules
                .iter()
                .filter_map(|(name, rule)| {
                    rule.without_origins(excluded)
                        .map(|rule| (name.clone(), rule))
                })
                .collect()
        };

        ContractRegistry {
            member_contracts: filter(&self.member_contracts),
            static_member_contracts: filter(&self.static_member_contracts),
            providers: self
                .providers
                .iter()
                .filter(|origin| !excluded.contains(&origin.subject))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Rule tables and providers are equal, ignoring build state
    pub fn same_rules(&self, other: &ContractRegistry) -> bool {
        self.member_contracts == other.member_contracts
            && self.static_member_contracts == other.static_member_contracts
            && self.providers == other.providers
    }

    pub fn query(&self) -> RegistryQuery<'_> {
        RegistryQuery::new(self)
    }

    pub fn statistics(&self) -> RegistryStatistics {
        let mut by_shape = ShapeCounts::default();
        for rule in self
            .member_contracts
            .values()
            .chain(self.static_member_contracts.values())
        {
            match rule.criterion() {
                Criterion::Value(_) => by_shape.value += 1,
                Criterion::Call(_) => by_shape.call += 1,
                Criterion::Accessor(_) => by_shape.accessor += 1,
            }
        }

        RegistryStatistics {
            subject: self.owner_name.clone(),
            total_members: self.member_contracts.len(),
            total_static_members: self.static_member_contracts.len(),
            total_providers: self.providers.len(),
            total_chain_terminators: self.chain_terminators.len(),
            multi_source_rules: self
                .member_contracts
                .values()
                .chain(self.static_member_contracts.values())
                .filter(|rule| rule.sources.len() > 1)
                .count(),
            by_shape,
            state: self.state(),
        }
    }
}

/// Structural equality; `built_at` is bookkeeping and does not participate
impl PartialEq for ContractRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.same_rules(other)
            && self.chain_terminators == other.chain_terminators
            && self.built == other.built
    }
}

// ============================================================================
// Supporting Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeCounts {
    pub value: usize,
    pub call: usize,
    pub accessor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatistics {
    pub subject: String,
    pub total_members: usize,
    pub total_static_members: usize,
    pub total_providers: usize,
    pub total_chain_terminators: usize,
    pub multi_source_rules: usize,
    pub by_shape: ShapeCounts,
    pub state: RegistryState,
}
