// src/composer/mod.rs
//! Rule composition
//!
//! `RuleComposer` builds a subject's registry from its ancestry and from the providers
//! attached to it. Each pass works on a copy of the stored registry and commits only
//! when every member folded cleanly; a conflict leaves the stored registry untouched.

pub mod fold;

pub use fold::FoldMode;

use crate::context::EngineContext;
use crate::error::EngineError;
use crate::registry::{ancestry, ContractRegistry, MemberRule};
use fold::Folder;
use rce_core::config::compile_time::registry::{MAX_CHAIN_TERMINATORS, MAX_PROVIDERS_PER_REGISTRY};
use rce_core::criteria::{Contract, ContractViolation, Criterion, Origin, ViolationKind};
use rce_core::host::{Member, MemberKind, SubjectId, SubjectRef, Surface, Target};
use rce_core::logging::codes;
use rce_core::logging::with_subject_context;
use rce_core::{log_debug, log_error, log_success};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Recompose even when the registry is already built
    pub force_rebuild: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachOptions {
    /// Copy inherited members that a contract covers onto the subject's own surface
    pub backfill: bool,
}

impl AttachOptions {
    pub fn from_context(context: &EngineContext) -> Self {
        Self {
            backfill: context.config().backfill_on_attach,
        }
    }
}

pub struct RuleComposer<'a> {
    context: &'a EngineContext,
}

impl<'a> RuleComposer<'a> {
    pub fn new(context: &'a EngineContext) -> Self {
        Self { context }
    }

    /// Compose `subject`'s registry, returning a snapshot of the committed result
    pub fn compose(&self, subject: &SubjectRef) -> Result<ContractRegistry, EngineError> {
        self.compose_with(subject, ComposeOptions::default())
    }

    pub fn compose_with(
        &self,
        subject: &SubjectRef,
        options: ComposeOptions,
    ) -> Result<ContractRegistry, EngineError> {
        let _writer = self.context.writer();
        self.compose_locked(subject, options)
    }

    /// Fold the composed registries of `providers` into `subject`'s registry.
    ///
    /// Whatever `subject` already holds is authoritative, and among the providers the
    /// first one to declare a member wins; later declarations must fit inside it.
    pub fn attach(
        &self,
        subject: &SubjectRef,
        providers: &[SubjectRef],
    ) -> Result<ContractRegistry, EngineError> {
        self.attach_with(subject, providers, AttachOptions::from_context(self.context))
    }

    pub fn attach_with(
        &self,
        subject: &SubjectRef,
        providers: &[SubjectRef],
        options: AttachOptions,
    ) -> Result<ContractRegistry, EngineError> {
        self.attach_in_mode(subject, providers, options, FoldMode::Compare)
    }

    /// Mirror of [`RuleComposer::attach`] for layering a provider atop others: the
    /// attached declarations take priority and what `subject` already holds is checked
    /// against them.
    pub fn attach_before(
        &self,
        subject: &SubjectRef,
        providers: &[SubjectRef],
    ) -> Result<ContractRegistry, EngineError> {
        self.attach_in_mode(
            subject,
            providers,
            AttachOptions::from_context(self.context),
            FoldMode::Incoming,
        )
    }

    /// Stop ancestry walks for `subject` before `terminator`.
    ///
    /// Rules already folded from beyond the terminator stay in place; the terminator
    /// only bounds later folds.
    pub fn terminate_chain_at(
        &self,
        subject: &SubjectRef,
        terminator: &SubjectRef,
    ) -> Result<(), EngineError> {
        let _writer = self.context.writer();
        let mut registry = self
            .context
            .registry(subject.id())
            .unwrap_or_else(|| ContractRegistry::new(subject));

        if registry.chain_terminators().len() >= MAX_CHAIN_TERMINATORS
            && !registry.chain_terminators().contains(&terminator.id())
        {
            return Err(EngineError::TerminatorLimitExceeded {
                limit: MAX_CHAIN_TERMINATORS,
            });
        }

        if registry.add_chain_terminator(terminator.id()) {
            log_debug!(
                "Chain terminator added",
                "subject" => subject.name(),
                "terminator" => terminator.name()
            );
        }
        self.context.store_registry(registry);
        Ok(())
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Compose `subject` and commit the pass. The caller holds the writer lock.
    pub(crate) fn compose_locked(
        &self,
        subject: &SubjectRef,
        options: ComposeOptions,
    ) -> Result<ContractRegistry, EngineError> {
        let mut pass = Pass::default();
        let registry = self.compose_staged(subject, options, &mut pass)?;
        self.commit(pass);
        Ok(registry)
    }

    fn compose_staged(
        &self,
        subject: &SubjectRef,
        options: ComposeOptions,
        pass: &mut Pass,
    ) -> Result<ContractRegistry, EngineError> {
        with_subject_context(subject.name(), || {
            let existing = pass.registry(self.context, subject.id());
            if let Some(registry) = &existing {
                if registry.is_built() && !options.force_rebuild {
                    return Ok(registry.clone());
                }
            }

            let mut working = existing
                .clone()
                .unwrap_or_else(|| ContractRegistry::new(subject));
            let check = self.context.options();
            let mut folder = Folder::new(&check);

            if let Some(inherited) = self.inherited(subject, &working, pass)? {
                folder.fold_registry(&mut working, &inherited, FoldMode::Compare);
            }

            let mut declarations = Vec::new();
            let folds_own =
                self.context.reflector().is_provider(subject) && !working.has_provider(subject.id());
            if folds_own {
                let origin = Origin::of(subject);
                for surface in [Surface::Instance, Surface::Static] {
                    for (name, criterion) in self.own_declarations(subject, surface) {
                        let rule = MemberRule::new(Contract::new(criterion, origin.clone()));
                        folder.fold_rule(&mut working, surface, &name, &rule, FoldMode::Expand);
                        declarations.push((surface, name));
                    }
                }
                working.add_provider(origin);
            }

            self.check_conflicts(subject, folder.into_conflicts())?;
            self.check_provider_limit(subject, &working)?;

            if let Some(previous) = &existing {
                if previous.is_built() && !previous.same_rules(&working) {
                    working.mark_unbuilt();
                }
            }

            pass.completions.push(Completion {
                subject: subject.clone(),
                folded_declarations: folds_own.then_some(declarations.len()),
                members: working.rules(Surface::Instance).len(),
                static_members: working.rules(Surface::Static).len(),
            });
            pass.erasures.extend(
                declarations
                    .into_iter()
                    .map(|(surface, name)| (subject.clone(), surface, name)),
            );
            pass.stage(working.clone());

            Ok(working)
        })
    }

    /// Rules `subject` inherits from its immediate ancestor.
    ///
    /// The ancestor is composed in full. When a terminator local to `subject` sits
    /// further up the chain, whatever the ancestor holds from the terminator and
    /// beyond is left out.
    fn inherited(
        &self,
        subject: &SubjectRef,
        working: &ContractRegistry,
        pass: &mut Pass,
    ) -> Result<Option<ContractRegistry>, EngineError> {
        let chain = ancestry(self.context, subject, working.chain_terminators())?;
        let Some(parent) = chain.first() else {
            return Ok(None);
        };
        let inherited = self.compose_staged(parent, ComposeOptions::default(), pass)?;

        let cut = chain
            .last()
            .and_then(|last| self.context.reflector().ancestor(last))
            .filter(|next| {
                working.chain_terminators().contains(&next.id())
                    && !self.context.is_chain_terminator(next.id())
            });
        let Some(terminator) = cut else {
            return Ok(Some(inherited));
        };

        let beyond = self.compose_staged(&terminator, ComposeOptions::default(), pass)?;
        let excluded: Vec<_> = beyond
            .providers()
            .iter()
            .map(|origin| origin.subject)
            .chain(std::iter::once(terminator.id()))
            .collect();

        log_debug!(
            "Inherited rules bounded by chain terminator",
            "subject" => subject.name(),
            "terminator" => terminator.name(),
            "excluded_providers" => excluded.len()
        );
        Ok(Some(inherited.without_origins(&excluded)))
    }

    /// Store every staged registry, erase folded declarations and report completions
    fn commit(&self, pass: Pass) {
        for registry in pass.registries.into_values() {
            self.context.store_registry(registry);
        }

        let reflector = self.context.reflector();
        for (subject, surface, name) in &pass.erasures {
            reflector.remove_member(&Target::Subject(subject.clone(), *surface), name);
        }

        for completion in &pass.completions {
            let subject = &completion.subject;
            with_subject_context(subject.name(), || match completion.folded_declarations {
                Some(declarations) => log_success!(
                    codes::success::PROVIDER_FOLDED,
                    "Provider declarations folded",
                    "subject" => subject.name(),
                    "declarations" => declarations
                ),
                None => log_success!(
                    codes::success::COMPOSITION_COMPLETE,
                    "Rule composition complete",
                    "subject" => subject.name(),
                    "members" => completion.members,
                    "static_members" => completion.static_members
                ),
            });
        }
    }

    fn own_declarations(&self, subject: &SubjectRef, surface: Surface) -> Vec<(String, Criterion)> {
        let reflector = self.context.reflector();
        let target = Target::Subject(subject.clone(), surface);

        reflector
            .own_members(&target)
            .into_iter()
            .filter(|member| member.kind == MemberKind::Declaration)
            .filter_map(|member| match reflector.read_member(&target, &member.name) {
                Some(Member::Declaration(criterion)) => Some((member.name, criterion)),
                _ => None,
            })
            .collect()
    }

    fn check_conflicts(
        &self,
        subject: &SubjectRef,
        mut conflicts: Vec<ContractViolation>,
    ) -> Result<(), EngineError> {
        let violation = match conflicts.len() {
            0 => return Ok(()),
            1 => conflicts.remove(0),
            n => ContractViolation::aggregate(
                ViolationKind::CompositionConflict,
                format!("{} member(s) of {} have conflicting contracts", n, subject.name()),
                conflicts,
            ),
        };

        log_error!(
            violation.code(),
            &violation.to_string(),
            "subject" => subject.name(),
            "origins" => violation.origins.join(", ")
        );
        Err(EngineError::Composition(violation))
    }

    fn check_provider_limit(
        &self,
        subject: &SubjectRef,
        registry: &ContractRegistry,
    ) -> Result<(), EngineError> {
        let count = registry.providers().len();
        if count > MAX_PROVIDERS_PER_REGISTRY {
            let error = EngineError::ProviderLimitExceeded {
                subject: subject.name().to_string(),
                count,
                limit: MAX_PROVIDERS_PER_REGISTRY,
            };
            log_error!(error.code(), &error.to_string(), "subject" => subject.name());
            return Err(error);
        }
        Ok(())
    }

    // ========================================================================
    // Attachment
    // ========================================================================

    fn attach_in_mode(
        &self,
        subject: &SubjectRef,
        providers: &[SubjectRef],
        options: AttachOptions,
        mode: FoldMode,
    ) -> Result<ContractRegistry, EngineError> {
        let _writer = self.context.writer();

        with_subject_context(subject.name(), || {
            let mut pass = Pass::default();
            let current = self.compose_staged(subject, ComposeOptions::default(), &mut pass)?;
            let mut working = current.clone();
            let check = self.context.options();
            let mut folder = Folder::new(&check);

            for provider in providers {
                if !self.context.reflector().is_provider(provider) {
                    let error = EngineError::NotAProvider(provider.name().to_string());
                    log_error!(error.code(), &error.to_string(), "subject" => subject.name());
                    return Err(error);
                }

                let registry = self.compose_staged(provider, ComposeOptions::default(), &mut pass)?;
                folder.fold_registry(&mut working, &registry, mode);
                working.add_provider(Origin::of(provider));
            }

            self.check_conflicts(subject, folder.into_conflicts())?;
            self.check_provider_limit(subject, &working)?;

            if working.is_built() && !working.same_rules(&current) {
                working.mark_unbuilt();
            }
            pass.stage(working.clone());
            self.commit(pass);

            let backfilled = if options.backfill {
                self.backfill(subject, &working)?
            } else {
                0
            };

            log_success!(
                codes::success::ATTACH_COMPLETE,
                "Providers attached",
                "subject" => subject.name(),
                "providers" => providers.len(),
                "backfilled" => backfilled
            );
            Ok(working)
        })
    }

    /// Copy the nearest inherited definition of every contracted member that
    /// `subject` does not define itself. Returns the number of members copied.
    fn backfill(
        &self,
        subject: &SubjectRef,
        registry: &ContractRegistry,
    ) -> Result<usize, EngineError> {
        let reflector = self.context.reflector();
        let chain = ancestry(self.context, subject, registry.chain_terminators())?;
        let mut copied = 0;

        for surface in [Surface::Instance, Surface::Static] {
            let own = Target::Subject(subject.clone(), surface);
            for name in registry.member_names(surface) {
                if reflector.read_member(&own, &name).is_some() {
                    continue;
                }

                let inherited = chain.iter().find_map(|ancestor| {
                    let target = Target::Subject(ancestor.clone(), surface);
                    match reflector.read_member(&target, &name) {
                        Some(member) if !member.is_declaration() => Some((ancestor, member)),
                        _ => None,
                    }
                });

                if let Some((ancestor, member)) = inherited {
                    reflector.define_member(&own, &name, member, ancestor.name());
                    copied += 1;
                }
            }
        }

        Ok(copied)
    }
}

// ============================================================================
// Supporting Data Structures
// ============================================================================

/// Writes of one compose or attach pass, held back until the whole pass succeeds
#[derive(Default)]
struct Pass {
    registries: HashMap<SubjectId, ContractRegistry>,
    erasures: Vec<(SubjectRef, Surface, String)>,
    completions: Vec<Completion>,
}

impl Pass {
    /// Staged registry for `subject`, falling back to the committed one
    fn registry(&self, context: &EngineContext, subject: SubjectId) -> Option<ContractRegistry> {
        self.registries
            .get(&subject)
            .cloned()
            .or_else(|| context.registry(subject))
    }

    fn stage(&mut self, registry: ContractRegistry) {
        self.registries.insert(registry.owner(), registry);
    }
}

struct Completion {
    subject: SubjectRef,
    /// Declarations folded when the subject is a provider composed for the first time
    folded_declarations: Option<usize>,
    members: usize,
    static_members: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryState;
    use assert_matches::assert_matches;
    use rce_core::config::EngineConfig;
    use rce_core::criteria::{CallCriterion, PathSegment, ValueCriterion};
    use rce_core::host::{Function, SubjectBuilder, Value};
    use rce_core::logging::service::create_test_logger;
    use rce_core::logging::{with_thread_logger, LogLevel, LoggingService};
    use std::sync::Arc;

    fn context() -> EngineContext {
        EngineContext::new(EngineConfig {
            strict_parameter_arity: true,
            skip_membership_on_type_mismatch: true,
            backfill_on_attach: false,
            report_uncovered_members: false,
        })
    }

    fn value(types: &[&str]) -> ValueCriterion {
        ValueCriterion::parse(types).unwrap()
    }

    fn run_contract(parameter: &[&str]) -> CallCriterion {
        CallCriterion::new(vec![value(parameter)], ValueCriterion::mixed())
    }

    #[test]
    fn test_provider_declarations_are_folded_and_erased() {
        let context = context();
        let named = SubjectBuilder::new("Named")
            .provider()
            .declare("name", value(&["string"]))
            .declare_static("count", value(&["number"]))
            .build();

        let memory = create_test_logger();
        let service = Arc::new(LoggingService::new(memory.clone(), LogLevel::Debug));
        let registry = with_thread_logger(service, || RuleComposer::new(&context).compose(&named))
            .unwrap();

        assert_eq!(registry.member_names(Surface::Instance), vec!["name"]);
        assert_eq!(registry.member_names(Surface::Static), vec!["count"]);
        assert!(registry.has_provider(named.id()));
        assert!(named.instance_members().is_empty());
        assert!(named.static_members().is_empty());
        assert_eq!(context.state_of(named.id()), RegistryState::Registered);
        assert!(memory.has_success_with_code(codes::success::PROVIDER_FOLDED));
    }

    #[test]
    fn test_inherited_rules_keep_their_origin() {
        let context = context();
        let identified = SubjectBuilder::new("Identified")
            .provider()
            .declare("id", value(&["number"]))
            .build();
        let account = SubjectBuilder::new("Account").extends(&identified).build();

        let registry = RuleComposer::new(&context).compose(&account).unwrap();
        let rule = registry.rule(Surface::Instance, "id").unwrap();

        assert_eq!(rule.effective.origin, Origin::of(&identified));
        assert!(registry.has_provider(identified.id()));
        assert!(context.has_registry(identified.id()));
    }

    #[test]
    fn test_provider_extending_provider_widens() {
        let context = context();
        let base = SubjectBuilder::new("Base")
            .provider()
            .declare("id", value(&["number"]))
            .build();
        let wider = SubjectBuilder::new("Wider")
            .provider()
            .extends(&base)
            .declare("id", value(&["string"]))
            .build();

        let registry = RuleComposer::new(&context).compose(&wider).unwrap();
        let rule = registry.rule(Surface::Instance, "id").unwrap();

        assert_eq!(rule.criterion().to_string(), "[number, string]");
        assert_eq!(rule.origins(), vec!["Base", "Wider"]);
    }

    #[test]
    fn test_conflicting_providers_fail_composition() {
        let context = context();
        let runner = SubjectBuilder::new("Runner")
            .provider()
            .declare("run", run_contract(&["number"]))
            .build();
        let sprinter = SubjectBuilder::new("Sprinter")
            .provider()
            .declare("run", run_contract(&["number", "string"]))
            .build();
        let athlete = SubjectBuilder::new("Athlete").build();

        let memory = create_test_logger();
        let service = Arc::new(LoggingService::new(memory.clone(), LogLevel::Debug));
        let result = with_thread_logger(service, || {
            RuleComposer::new(&context).attach(&athlete, &[runner.clone(), sprinter.clone()])
        });

        let error = result.unwrap_err();
        let violation = error.as_violation().unwrap();
        assert_eq!(violation.kind, ViolationKind::CompositionConflict);
        assert_eq!(
            violation.path,
            vec![PathSegment::Member("run".into()), PathSegment::Position(0)]
        );
        assert!(violation.origins.contains(&"Runner".to_string()));
        assert!(violation.origins.contains(&"Sprinter".to_string()));
        assert!(memory.has_error_with_code(codes::violations::COMPOSITION_CONFLICT));

        // Nothing from the failed attach was committed.
        assert_eq!(context.state_of(athlete.id()), RegistryState::Unregistered);
        assert_eq!(context.state_of(runner.id()), RegistryState::Unregistered);
        assert!(runner.instance_members().contains("run"));
        assert!(sprinter.instance_members().contains("run"));
        assert!(!memory.has_success_with_code(codes::success::PROVIDER_FOLDED));
    }

    #[test]
    fn test_failed_attach_keeps_existing_registry() {
        let context = context();
        let sized = SubjectBuilder::new("Sized")
            .provider()
            .declare("size", value(&["number"]))
            .build();
        let labelled = SubjectBuilder::new("Labelled")
            .provider()
            .declare("size", value(&["string"]))
            .build();
        let subject = SubjectBuilder::new("Box").build();
        let composer = RuleComposer::new(&context);

        let before = composer.attach(&subject, &[sized]).unwrap();
        assert!(composer.attach(&subject, &[labelled.clone()]).is_err());

        assert_eq!(context.registry(subject.id()).unwrap(), before);
        assert!(!context.has_registry(labelled.id()));
        assert!(labelled.instance_members().contains("size"));
    }

    #[test]
    fn test_every_conflict_is_reported() {
        let context = context();
        let first = SubjectBuilder::new("First")
            .provider()
            .declare("a", value(&["number"]))
            .declare("b", value(&["string"]))
            .build();
        let second = SubjectBuilder::new("Second")
            .provider()
            .declare("a", value(&["string"]))
            .declare("b", value(&["boolean"]))
            .build();
        let subject = SubjectBuilder::new("Both").build();

        let error = RuleComposer::new(&context)
            .attach(&subject, &[first, second])
            .unwrap_err();
        let violation = error.as_violation().unwrap();

        assert_eq!(violation.causes.len(), 2);
        assert_eq!(violation.leaf_count(), 2);
    }

    #[test]
    fn test_compatible_providers_attach() {
        let context = context();
        let wide = SubjectBuilder::new("Wide")
            .provider()
            .declare("run", run_contract(&["number", "string"]))
            .build();
        let narrow = SubjectBuilder::new("Narrow")
            .provider()
            .declare("run", run_contract(&["number"]))
            .build();
        let subject = SubjectBuilder::new("Runner").build();

        let registry = RuleComposer::new(&context)
            .attach(&subject, &[wide.clone(), narrow.clone()])
            .unwrap();

        let rule = registry.rule(Surface::Instance, "run").unwrap();
        assert_eq!(rule.effective.origin, Origin::of(&wide));
        assert_eq!(rule.sources.len(), 2);
        assert_eq!(registry.providers().len(), 2);
    }

    #[test]
    fn test_diamond_folds_shared_provider_once() {
        let context = context();
        let base = SubjectBuilder::new("Base")
            .provider()
            .declare("id", value(&["number"]))
            .build();
        let left = SubjectBuilder::new("Left")
            .provider()
            .extends(&base)
            .declare("left", value(&["string"]))
            .build();
        let right = SubjectBuilder::new("Right")
            .provider()
            .extends(&base)
            .declare("right", value(&["string"]))
            .build();
        let subject = SubjectBuilder::new("Diamond").build();

        let registry = RuleComposer::new(&context)
            .attach(&subject, &[left, right])
            .unwrap();

        assert_eq!(registry.member_names(Surface::Instance), vec!["id", "left", "right"]);
        assert_eq!(registry.rule(Surface::Instance, "id").unwrap().sources.len(), 1);
        assert_eq!(registry.providers().len(), 3);
    }

    #[test]
    fn test_recomposition_is_idempotent() {
        let context = context();
        let provider = SubjectBuilder::new("Sized")
            .provider()
            .declare("size", value(&["number"]))
            .build();
        let subject = SubjectBuilder::new("Box").extends(&provider).build();
        let composer = RuleComposer::new(&context);

        let first = composer.compose(&subject).unwrap();
        let second = composer.compose(&subject).unwrap();
        let forced = composer
            .compose_with(&subject, ComposeOptions { force_rebuild: true })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, forced);
    }

    #[test]
    fn test_forced_rebuild_keeps_built_state() {
        let context = context();
        let provider = SubjectBuilder::new("Sized")
            .provider()
            .declare("size", value(&["number"]))
            .build();
        let subject = SubjectBuilder::new("Box").extends(&provider).build();
        let composer = RuleComposer::new(&context);

        composer.compose(&subject).unwrap();
        context.update_registry(subject.id(), |registry| {
            registry.mark_built(chrono::Utc::now())
        });

        let rebuilt = composer
            .compose_with(&subject, ComposeOptions { force_rebuild: true })
            .unwrap();
        assert_eq!(rebuilt.state(), RegistryState::Built);
    }

    #[test]
    fn test_attach_before_gives_priority_to_attached() {
        let context = context();
        let wide = SubjectBuilder::new("Wide")
            .provider()
            .declare("id", value(&["number", "string"]))
            .build();
        let make_narrow = || {
            SubjectBuilder::new("Narrow")
                .provider()
                .declare("id", value(&["number"]))
                .build()
        };
        let composer = RuleComposer::new(&context);

        let narrow = make_narrow();
        assert_matches!(
            composer.attach(&narrow, &[wide.clone()]),
            Err(EngineError::Composition(_))
        );

        let narrow = make_narrow();
        let registry = composer.attach_before(&narrow, &[wide.clone()]).unwrap();
        let rule = registry.rule(Surface::Instance, "id").unwrap();
        assert_eq!(rule.effective.origin, Origin::of(&wide));
        assert_eq!(rule.origins(), vec!["Wide", "Narrow"]);
    }

    #[test]
    fn test_attach_rejects_non_providers() {
        let context = context();
        let concrete = SubjectBuilder::new("Concrete").build();
        let subject = SubjectBuilder::new("Subject").build();

        assert_matches!(
            RuleComposer::new(&context).attach(&subject, &[concrete]),
            Err(EngineError::NotAProvider(name)) if name == "Concrete"
        );
    }

    #[test]
    fn test_backfill_copies_inherited_members() {
        let context = context();
        let base = SubjectBuilder::new("Base")
            .method("run", Function::new("run", |_: &[Value]| Ok(Value::from(1))))
            .member("untouched", Member::Value(Value::from(0)))
            .build();
        let derived = SubjectBuilder::new("Derived").extends(&base).build();
        let runner = SubjectBuilder::new("Runner")
            .provider()
            .declare("run", CallCriterion::new(vec![], value(&["number"])))
            .build();

        RuleComposer::new(&context)
            .attach_with(&derived, &[runner], AttachOptions { backfill: true })
            .unwrap();

        let copied = derived.instance_members().get("run").unwrap();
        assert_eq!(copied.origin, "Base");
        assert!(!derived.instance_members().contains("untouched"));
    }

    #[test]
    fn test_chain_terminators_bound_composition() {
        let context = context();
        let root = SubjectBuilder::new("Root")
            .provider()
            .declare("hidden", value(&["number"]))
            .build();
        let global = SubjectBuilder::new("Global")
            .provider()
            .declare("global", value(&["number"]))
            .build();
        let local = SubjectBuilder::new("Local").extends(&root).build();
        let other = SubjectBuilder::new("Other").extends(&global).build();
        let composer = RuleComposer::new(&context);

        composer.terminate_chain_at(&local, &root).unwrap();
        context.register_chain_terminator(&global).unwrap();

        assert!(composer.compose(&local).unwrap().is_empty());
        assert!(composer.compose(&other).unwrap().is_empty());
        assert_eq!(
            context.registry(local.id()).unwrap().chain_terminators(),
            &[root.id()]
        );
    }

    #[test]
    fn test_chain_terminator_bounds_deeper_ancestry() {
        let context = context();
        let root = SubjectBuilder::new("Root")
            .provider()
            .declare("hidden", value(&["number"]))
            .build();
        let middle = SubjectBuilder::new("Middle")
            .provider()
            .extends(&root)
            .declare("shown", value(&["string"]))
            .declare("hidden", value(&["string"]))
            .build();
        let leaf = SubjectBuilder::new("Leaf").extends(&middle).build();
        let composer = RuleComposer::new(&context);

        composer.terminate_chain_at(&leaf, &root).unwrap();
        let registry = composer.compose(&leaf).unwrap();

        assert_eq!(registry.member_names(Surface::Instance), vec!["hidden", "shown"]);
        let hidden = registry.rule(Surface::Instance, "hidden").unwrap();
        assert_eq!(hidden.effective.origin, Origin::of(&middle));
        assert_eq!(hidden.criterion().to_string(), "[string]");
        assert!(!registry.has_provider(root.id()));
        assert!(registry.has_provider(middle.id()));

        // Middle's own registry still holds everything it inherits.
        let middle_rules = context.registry(middle.id()).unwrap();
        assert!(middle_rules.has_provider(root.id()));
        assert_eq!(
            middle_rules.rule(Surface::Instance, "hidden").unwrap().origins(),
            vec!["Root", "Middle"]
        );
    }

    #[test]
    fn test_chain_terminator_two_levels_up_hides_everything_beyond() {
        let context = context();
        let root = SubjectBuilder::new("Root")
            .provider()
            .declare("hidden", value(&["number"]))
            .build();
        let middle = SubjectBuilder::new("Middle").extends(&root).build();
        let leaf = SubjectBuilder::new("Leaf").extends(&middle).build();
        let composer = RuleComposer::new(&context);

        composer.terminate_chain_at(&leaf, &root).unwrap();

        assert!(composer.compose(&leaf).unwrap().is_empty());
        assert!(!composer.compose(&middle).unwrap().is_empty());
    }
}
