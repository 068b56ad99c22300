// src/composer/fold.rs
//! Folding contracts into a working registry
//!
//! Conflicts are collected rather than returned so that one composition pass reports
//! every incompatible member at once.

use crate::registry::{ContractRegistry, MemberRule};
use rce_core::criteria::{CheckOptions, ContractViolation, PathSegment};
use rce_core::host::Surface;

/// Which side of a fold is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldMode {
    /// Existing rule is authoritative; incoming must fit inside it
    Compare,
    /// Incoming widens the existing rule
    Expand,
    /// Incoming rule becomes authoritative; existing must fit inside it
    Incoming,
}

pub(crate) struct Folder<'a> {
    options: &'a CheckOptions,
    conflicts: Vec<ContractViolation>,
}

impl<'a> Folder<'a> {
    pub(crate) fn new(options: &'a CheckOptions) -> Self {
        Self {
            options,
            conflicts: Vec::new(),
        }
    }

    pub(crate) fn into_conflicts(self) -> Vec<ContractViolation> {
        self.conflicts
    }

    /// Fold every rule and provider of `source` into `target`
    pub(crate) fn fold_registry(
        &mut self,
        target: &mut ContractRegistry,
        source: &ContractRegistry,
        mode: FoldMode,
    ) {
        for surface in [Surface::Instance, Surface::Static] {
            for (name, rule) in source.rules(surface) {
                self.fold_rule(target, surface, name, rule, mode);
            }
        }

        for provider in source.providers() {
            target.add_provider(provider.clone());
        }
    }

    pub(crate) fn fold_rule(
        &mut self,
        target: &mut ContractRegistry,
        surface: Surface,
        name: &str,
        incoming: &MemberRule,
        mode: FoldMode,
    ) {
        let rules = target.rules_mut(surface);
        let Some(existing) = rules.get(name) else {
            rules.insert(name.to_string(), incoming.clone());
            return;
        };

        // Reached along a second path: nothing new to fold.
        let fresh: Vec<_> = incoming
            .sources
            .iter()
            .filter(|source| !existing.has_source(&source.origin))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return;
        }

        let merged = match mode {
            FoldMode::Compare => existing
                .effective
                .compare(&incoming.effective, self.options)
                .map(|_| {
                    let mut sources = existing.sources.clone();
                    sources.extend(fresh);
                    MemberRule {
                        effective: existing.effective.clone(),
                        sources,
                    }
                }),
            FoldMode::Expand => existing.effective.expand(&incoming.effective).map(|effective| {
                let mut sources = existing.sources.clone();
                sources.extend(fresh);
                MemberRule { effective, sources }
            }),
            FoldMode::Incoming => incoming
                .effective
                .compare(&existing.effective, self.options)
                .map(|_| {
                    let mut sources = incoming.sources.clone();
                    sources.extend(
                        existing
                            .sources
                            .iter()
                            .filter(|source| !incoming.has_source(&source.origin))
                            .cloned(),
                    );
                    MemberRule {
                        effective: incoming.effective.clone(),
                        sources,
                    }
                }),
        };

        match merged {
            Ok(rule) => {
                rules.insert(name.to_string(), rule);
            }
            Err(conflict) => {
                let conflict = conflict.at_member(name);
                self.conflicts.push(match surface {
                    Surface::Instance => conflict,
                    Surface::Static => conflict.at(PathSegment::Member("static".to_string())),
                });
            }
        }
    }
}
