// src/enforcer/mod.rs
//! Runtime enforcement
//!
//! The enforcer replaces contracted members with guarded callables. Every wrapper is
//! recorded in the context's side table against the callable it guards, so wrapping an
//! already wrapped member starts again from the original instead of stacking guards.

pub mod wrapper;

use crate::composer::{ComposeOptions, RuleComposer};
use crate::context::EngineContext;
use crate::error::EngineError;
use crate::registry::ContractRegistry;
use chrono::Utc;
use rce_core::criteria::{AccessorCriterion, CallCriterion, Criterion, PathSegment};
use rce_core::host::{Function, Member, ObjectRef, ReflectedMember, SubjectRef, Target, Value};
use rce_core::logging::codes;
use rce_core::logging::with_subject_context;
use rce_core::{log_debug, log_error, log_success};

/// Outcome of one wrap pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapSummary {
    pub wrapped_calls: usize,
    pub wrapped_accessor_sides: usize,
    /// Members whose definition does not have the shape their contract requires
    pub skipped: Vec<String>,
}

impl WrapSummary {
    pub fn total(&self) -> usize {
        self.wrapped_calls + self.wrapped_accessor_sides
    }

    pub fn merge(&mut self, other: WrapSummary) {
        self.wrapped_calls += other.wrapped_calls;
        self.wrapped_accessor_sides += other.wrapped_accessor_sides;
        self.skipped.extend(other.skipped);
    }
}

pub struct Enforcer<'a> {
    context: &'a EngineContext,
}

impl<'a> Enforcer<'a> {
    pub fn new(context: &'a EngineContext) -> Self {
        Self { context }
    }

    /// Compose `subject`, wrap both of its surfaces and mark its registry built
    pub fn enforce(&self, subject: &SubjectRef) -> Result<WrapSummary, EngineError> {
        let _writer = self.context.writer();

        with_subject_context(subject.name(), || {
            let registry = RuleComposer::new(self.context)
                .compose_locked(subject, ComposeOptions::default())?;

            let mut summary = self.wrap_locked(&Target::instance(subject), &registry);
            summary.merge(self.wrap_locked(&Target::statics(subject), &registry));

            self.context.update_registry(subject.id(), |registry| {
                registry.mark_built(Utc::now())
            });

            log_success!(
                codes::success::ENFORCEMENT_COMPLETE,
                "Members wrapped",
                "subject" => subject.name(),
                "calls" => summary.wrapped_calls,
                "accessor_sides" => summary.wrapped_accessor_sides,
                "skipped" => summary.skipped.len()
            );
            Ok(summary)
        })
    }

    /// Wrap the own members of `target` that `registry` holds a contract for
    pub fn wrap(&self, target: &Target, registry: &ContractRegistry) -> WrapSummary {
        let _writer = self.context.writer();
        self.wrap_locked(target, registry)
    }

    /// Wrap an object's own members using its shape's instance contracts
    pub fn wrap_object(&self, object: &ObjectRef) -> Result<WrapSummary, EngineError> {
        let Some(shape) = object.shape() else {
            let error = EngineError::UnknownSubject(object.origin_name());
            log_error!(error.code(), &error.to_string());
            return Err(error);
        };

        let _writer = self.context.writer();
        let registry = RuleComposer::new(self.context)
            .compose_locked(shape, ComposeOptions::default())?;
        Ok(self.wrap_locked(&Target::object(object), &registry))
    }

    /// Original callable behind a wrapper, or the callable itself
    pub fn unwrap(&self, function: &Function) -> Function {
        self.context.wrappers().unwrap(function)
    }

    fn wrap_locked(&self, target: &Target, registry: &ContractRegistry) -> WrapSummary {
        let reflector = self.context.reflector();
        let surface = target.surface();
        let mut summary = WrapSummary::default();

        for reflected in reflector.own_members(target) {
            let Some(rule) = registry.rule(surface, &reflected.name) else {
                continue;
            };
            let Some(member) = reflector.read_member(target, &reflected.name) else {
                continue;
            };

            match rule.criterion() {
                Criterion::Call(criterion) => {
                    match self.wrap_call(&reflected, &member, criterion) {
                        Some(replacement) => {
                            reflector.define_member(target, &reflected.name, replacement, &reflected.origin);
                            summary.wrapped_calls += 1;
                        }
                        None => summary.skipped.push(reflected.name.clone()),
                    }
                }
                Criterion::Accessor(criterion) => {
                    match self.wrap_accessor(&reflected, &member, criterion) {
                        Some((replacement, sides)) => {
                            reflector.define_member(target, &reflected.name, replacement, &reflected.origin);
                            summary.wrapped_accessor_sides += sides;
                        }
                        None => summary.skipped.push(reflected.name.clone()),
                    }
                }
                // Plain values are checked by the validator
                Criterion::Value(_) => {}
            }
        }

        if !summary.skipped.is_empty() {
            log_debug!(
                "Members left unwrapped",
                "target" => target.name(),
                "members" => summary.skipped.join(", ")
            );
        }
        summary
    }

    fn wrap_call(
        &self,
        reflected: &ReflectedMember,
        member: &Member,
        criterion: &CallCriterion,
    ) -> Option<Member> {
        let current = member.as_function()?;
        let wrappers = self.context.wrappers();
        let original = wrappers.unwrap(current);

        let guarded = wrapper::guard_call(
            &original,
            criterion,
            vec![PathSegment::Member(reflected.name.clone())],
            self.context.options(),
        );
        wrappers.replace(current, &guarded, &original);

        Some(match member {
            Member::Value(_) => Member::Value(Value::Callable(guarded)),
            _ => Member::Call(guarded),
        })
    }

    /// Wrap each side the contract declares; undeclared sides stay as they are
    fn wrap_accessor(
        &self,
        reflected: &ReflectedMember,
        member: &Member,
        criterion: &AccessorCriterion,
    ) -> Option<(Member, usize)> {
        let Member::Accessor { read, write } = member else {
            return None;
        };

        let wrappers = self.context.wrappers();
        let options = self.context.options();
        let path = vec![PathSegment::Member(reflected.name.clone())];
        let mut sides = 0;

        let read = match (read, criterion.read()) {
            (Some(getter), Some(_)) => {
                let original = wrappers.unwrap(getter);
                let guarded = wrapper::guard_read(&original, criterion, path.clone(), options);
                wrappers.replace(getter, &guarded, &original);
                sides += 1;
                Some(guarded)
            }
            (getter, _) => getter.clone(),
        };

        let write = match (write, criterion.write()) {
            (Some(setter), Some(_)) => {
                let original = wrappers.unwrap(setter);
                let guarded = wrapper::guard_write(&original, criterion, path, options);
                wrappers.replace(setter, &guarded, &original);
                sides += 1;
                Some(guarded)
            }
            (setter, _) => setter.clone(),
        };

        if sides == 0 {
            return None;
        }
        Some((Member::Accessor { read, write }, sides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryState;
    use assert_matches::assert_matches;
    use rce_core::config::EngineConfig;
    use rce_core::criteria::{ValueCriterion, ViolationKind};
    use rce_core::host::{HostError, HostObject, SubjectBuilder, Surface};
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

    fn numeric_run() -> CallCriterion {
        CallCriterion::new(
            vec![ValueCriterion::parse(&["number"]).unwrap()],
            ValueCriterion::parse(&["number"]).unwrap(),
        )
    }

    /// `run(n)` returns `'y'` for 2 and `n * 2` otherwise
    fn runner(contract: &SubjectRef) -> SubjectRef {
        SubjectBuilder::new("Runner")
            .extends(contract)
            .method(
                "run",
                Function::new("run", |args: &[Value]| {
                    let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
                    if n == 2.0 {
                        Ok(Value::from("y"))
                    } else {
                        Ok(Value::Number(n * 2.0))
                    }
                }),
            )
            .build()
    }

    fn runnable() -> SubjectRef {
        SubjectBuilder::new("Runnable")
            .provider()
            .declare("run", numeric_run())
            .build()
    }

    #[test]
    fn test_wrapped_call_checks_arguments_and_result() {
        let context = context();
        let subject = runner(&runnable());

        let summary = Enforcer::new(&context).enforce(&subject).unwrap();
        assert_eq!(summary.wrapped_calls, 1);
        assert_eq!(context.state_of(subject.id()), RegistryState::Built);
        assert!(context.registry(subject.id()).unwrap().built_at().is_some());

        let error = subject
            .invoke(Surface::Instance, "run", &[Value::from("x")])
            .unwrap_err();
        assert_eq!(
            error.as_violation().map(|v| v.kind),
            Some(ViolationKind::ArgumentMismatch)
        );

        let error = subject
            .invoke(Surface::Instance, "run", &[Value::from(2)])
            .unwrap_err();
        let violation = error.as_violation().unwrap();
        assert_eq!(violation.kind, ViolationKind::ResultMismatch);
        assert_eq!(violation.causes[0].path_string(), "run<result>");

        assert_eq!(
            subject
                .invoke(Surface::Instance, "run", &[Value::from(3)])
                .unwrap(),
            Value::from(6)
        );
    }

    #[test]
    fn test_rewrapping_does_not_stack_guards() {
        let context = context();
        let subject = runner(&runnable());
        let original = subject
            .instance_members()
            .get("run")
            .and_then(|slot| slot.member.as_function().cloned())
            .unwrap();
        let enforcer = Enforcer::new(&context);

        enforcer.enforce(&subject).unwrap();
        let registry = context.registry(subject.id()).unwrap();
        enforcer.wrap(&Target::instance(&subject), &registry);

        for _ in 0..10 {
            enforcer.wrap(&Target::instance(&subject), &registry);
        }
        assert_eq!(context.wrappers().len(), 1);

        let wrapped = subject
            .instance_members()
            .get("run")
            .and_then(|slot| slot.member.as_function().cloned())
            .unwrap();
        assert_ne!(wrapped, original);
        assert_eq!(enforcer.unwrap(&wrapped), original);

        let memory = create_test_logger();
        let service = Arc::new(LoggingService::new(memory.clone(), LogLevel::Debug));
        with_thread_logger(service, || {
            subject
                .invoke(Surface::Instance, "run", &[Value::from(5)])
                .unwrap();
        });

        let checks = memory
            .get_events()
            .iter()
            .filter(|event| event.message == "Call checked")
            .count();
        assert_eq!(checks, 1);
    }

    #[test]
    fn test_thrown_errors_reach_the_caller() {
        let context = context();
        let subject = SubjectBuilder::new("Failing")
            .extends(&runnable())
            .method(
                "run",
                Function::new("run", |_: &[Value]| Err(HostError::thrown("broken"))),
            )
            .build();

        Enforcer::new(&context).enforce(&subject).unwrap();
        assert_eq!(
            subject.invoke(Surface::Instance, "run", &[Value::from(1)]),
            Err(HostError::thrown("broken"))
        );
    }

    #[test]
    fn test_accessor_sides_are_wrapped_independently() {
        let context = context();
        let sized = SubjectBuilder::new("Sized")
            .provider()
            .declare(
                "size",
                AccessorCriterion::reading(ValueCriterion::parse(&["number"]).unwrap()),
            )
            .build();
        let setter = Function::new("set size", |_: &[Value]| Ok(Value::Undefined));
        let subject = SubjectBuilder::new("Box")
            .extends(&sized)
            .member(
                "size",
                Member::accessor(
                    Some(Function::new("get size", |_: &[Value]| Ok(Value::from("big")))),
                    Some(setter.clone()),
                ),
            )
            .build();

        let summary = Enforcer::new(&context).enforce(&subject).unwrap();
        assert_eq!(summary.wrapped_accessor_sides, 1);

        let error = subject.get(Surface::Instance, "size").unwrap_err();
        assert_eq!(error.as_violation().unwrap().path_string(), "size<read>");

        match subject.instance_members().get("size").unwrap().member {
            Member::Accessor { write, .. } => assert_eq!(write, Some(setter)),
            other => panic!("unexpected member {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_members_are_skipped() {
        let context = context();
        let subject = SubjectBuilder::new("Plain")
            .extends(&runnable())
            .member("run", Member::Value(Value::from(1)))
            .build();

        let summary = Enforcer::new(&context).enforce(&subject).unwrap();
        assert_eq!(summary.skipped, vec!["run"]);
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_wrap_object_uses_shape_contracts() {
        let context = context();
        let shape = SubjectBuilder::new("Shape").extends(&runnable()).build();
        let object = HostObject::with_members(
            Some(&shape),
            vec![(
                "run",
                Member::Value(Value::Callable(Function::new("run", |_: &[Value]| {
                    Ok(Value::from(1))
                }))),
            )],
        );

        let summary = Enforcer::new(&context).wrap_object(&object).unwrap();
        assert_eq!(summary.wrapped_calls, 1);
        assert!(object.invoke("run", &[Value::from("x")]).is_err());
        assert_eq!(object.invoke("run", &[Value::from(1)]).unwrap(), Value::from(1));

        let shapeless = HostObject::new();
        assert_matches!(
            Enforcer::new(&context).wrap_object(&shapeless),
            Err(EngineError::UnknownSubject(_))
        );
    }
}
