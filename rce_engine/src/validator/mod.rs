// src/validator/mod.rs
//! Structural validation
//!
//! Checks a target's current members against a registry without installing anything.
//! Every problem lands in one [`ValidationReport`]; a check never stops at the first
//! failing member.

pub mod report;

pub use report::{ValidationReport, ValidationWarning, WarningKind};

use crate::composer::RuleComposer;
use crate::context::EngineContext;
use crate::error::EngineError;
use crate::registry::{ContractRegistry, MemberRule};
use rce_core::criteria::{
    AccessorCriterion, CheckOptions, ContractViolation, Criterion, ValueCriterion, ViolationKind,
};
use rce_core::host::{Member, MemberKind, ObjectRef, SubjectRef, Target, Value};
use rce_core::logging::codes;
use rce_core::logging::with_subject_context;
use rce_core::{log_error, log_success, log_warning};

pub struct Validator<'a> {
    context: &'a EngineContext,
}

impl<'a> Validator<'a> {
    pub fn new(context: &'a EngineContext) -> Self {
        Self { context }
    }

    /// Compose `subject` and check both of its surfaces
    pub fn check_subject(&self, subject: &SubjectRef) -> Result<ValidationReport, EngineError> {
        let registry = RuleComposer::new(self.context).compose(subject)?;

        with_subject_context(subject.name(), || {
            let mut report = self.check(&Target::instance(subject), &registry);
            report.merge(self.check(&Target::statics(subject), &registry));
            report.subject = subject.name().to_string();
            Ok(report)
        })
    }

    /// Check an object against its shape's instance contracts
    pub fn check_object(&self, object: &ObjectRef) -> Result<ValidationReport, EngineError> {
        let Some(shape) = object.shape() else {
            let error = EngineError::UnknownSubject(object.origin_name());
            log_error!(error.code(), &error.to_string());
            return Err(error);
        };

        let registry = RuleComposer::new(self.context).compose(shape)?;
        Ok(self.check(&Target::object(object), &registry))
    }

    /// Check the members of `target` against the rules `registry` holds for its surface.
    ///
    /// Subjects are checked on their own surface only. Objects also resolve members
    /// through their shape's instance chain.
    pub fn check(&self, target: &Target, registry: &ContractRegistry) -> ValidationReport {
        let options = self.context.options();
        let surface = target.surface();
        let mut report = ValidationReport::new(target.name());

        for (name, rule) in registry.rules(surface) {
            match self.resolve(target, name) {
                Some(member) => self.check_member(name, &member, rule, &options, &mut report),
                None if rule.criterion().admits_missing() => {}
                None => report.add_error(
                    ContractViolation::new(
                        ViolationKind::MemberMissing,
                        format!("{} requires {}", rule.effective.origin, name),
                    )
                    .with_origin(rule.effective.origin.name.clone())
                    .at_member(name),
                ),
            }
        }

        if self.context.config().report_uncovered_members {
            for member in self.context.reflector().own_members(target) {
                if member.kind != MemberKind::Declaration
                    && registry.rule(surface, &member.name).is_none()
                {
                    report.add_warning(ValidationWarning::new(
                        WarningKind::UncoveredMember,
                        member.name.clone(),
                        format!("no contract covers {}", member.name),
                    ));
                }
            }
        }

        if report.is_valid() {
            log_success!(
                codes::success::VALIDATION_PASSED,
                "Structural validation passed",
                "target" => report.subject,
                "warnings" => report.warning_count()
            );
        } else {
            log_warning!(
                "Structural validation failed",
                "target" => report.subject,
                "errors" => report.error_count(),
                "warnings" => report.warning_count()
            );
        }

        report
    }

    /// Own member of `target`; for objects, the nearest definition on the shape chain.
    /// Declarations are not implementations and resolve to nothing.
    fn resolve(&self, target: &Target, name: &str) -> Option<Member> {
        let reflector = self.context.reflector();
        let own = reflector.read_member(target, name);

        let member = match (own, target) {
            (Some(member), _) => Some(member),
            (None, Target::Object(object)) => {
                let mut current = object.shape().cloned();
                let mut found = None;
                while let Some(subject) = current {
                    if let Some(member) = reflector.read_member(&Target::instance(&subject), name) {
                        found = Some(member);
                        break;
                    }
                    if self.context.is_chain_terminator(subject.id()) {
                        break;
                    }
                    current = reflector.ancestor(&subject);
                }
                found
            }
            (None, Target::Subject(..)) => None,
        };

        member.filter(|member| !member.is_declaration())
    }

    fn check_member(
        &self,
        name: &str,
        member: &Member,
        rule: &MemberRule,
        options: &CheckOptions,
        report: &mut ValidationReport,
    ) {
        let origin = &rule.effective.origin.name;

        match rule.criterion() {
            Criterion::Call(_) => {
                if member.as_function().is_none() {
                    report.add_error(
                        ContractViolation::new(
                            ViolationKind::NotCallable,
                            format!("{} must be invocable", name),
                        )
                        .with_origin(origin.clone())
                        .at_member(name),
                    );
                }
            }
            Criterion::Accessor(criterion) => {
                if let Some(problem) = accessor_problem(member, criterion) {
                    report.add_error(
                        ContractViolation::new(ViolationKind::AccessorShapeMismatch, problem)
                            .with_origin(origin.clone())
                            .at_member(name),
                    );
                }
            }
            Criterion::Value(criterion) => {
                self.check_value(name, member, criterion, options, report);
            }
        }
    }

    fn check_value(
        &self,
        name: &str,
        member: &Member,
        criterion: &ValueCriterion,
        options: &CheckOptions,
        report: &mut ValidationReport,
    ) {
        let value = match member {
            Member::Value(value) => value.clone(),
            Member::Call(function) => Value::Callable(function.clone()),
            Member::Accessor { read: Some(read), .. } => match read.call(&[]) {
                Ok(value) => value,
                Err(error) => {
                    report.add_warning(ValidationWarning::new(
                        WarningKind::UnreadableMember,
                        name,
                        format!("getter failed: {}", error),
                    ));
                    return;
                }
            },
            Member::Accessor { read: None, .. } | Member::Declaration(_) => {
                report.add_warning(ValidationWarning::new(
                    WarningKind::UnreadableMember,
                    name,
                    "member has no readable value",
                ));
                return;
            }
        };

        if let Err(violation) = criterion.validate_with(&value, options) {
            report.add_error(violation.at_member(name));
        }
    }
}

/// Why `member` cannot serve as the accessor `criterion` describes
fn accessor_problem(member: &Member, criterion: &AccessorCriterion) -> Option<String> {
    let Member::Accessor { read, write } = member else {
        return Some("expected a getter/setter pair".to_string());
    };

    let mut missing = Vec::new();
    if criterion.read().is_some() && read.is_none() {
        missing.push("getter");
    }
    if criterion.write().is_some() && write.is_none() {
        missing.push("setter");
    }

    if missing.is_empty() {
        None
    } else {
        Some(format!("declared {} missing", missing.join(" and ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rce_core::config::EngineConfig;
    use rce_core::host::{Function, HostError, HostObject, SubjectBuilder};
    use rce_core::logging::service::create_test_logger;
    use rce_core::logging::{with_thread_logger, LogLevel, LoggingService};
    use std::sync::Arc;

    fn context_with(report_uncovered_members: bool) -> EngineContext {
        EngineContext::new(EngineConfig {
            strict_parameter_arity: true,
            skip_membership_on_type_mismatch: true,
            backfill_on_attach: false,
            report_uncovered_members,
        })
    }

    fn value(types: &[&str]) -> ValueCriterion {
        ValueCriterion::parse(types).unwrap()
    }

    fn person() -> SubjectRef {
        SubjectBuilder::new("PersonContract")
            .provider()
            .declare("name", value(&["string"]))
            .declare("age", value(&["number"]))
            .declare("nickname", value(&["string", "undefined"]))
            .build()
    }

    #[test]
    fn test_every_missing_member_is_reported() {
        let context = context_with(false);
        let subject = SubjectBuilder::new("Person").extends(&person()).build();

        let report = Validator::new(&context).check_subject(&subject).unwrap();
        let missing = report.errors_of(ViolationKind::MemberMissing);

        assert_eq!(missing.len(), 2);
        let paths: Vec<String> = missing.iter().map(|v| v.path_string()).collect();
        assert_eq!(paths, vec!["age", "name"]);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_values_are_validated() {
        let context = context_with(false);
        let subject = SubjectBuilder::new("Person")
            .extends(&person())
            .member("name", Member::Value(Value::from("Ada")))
            .member("age", Member::Value(Value::from("old")))
            .build();

        let report = Validator::new(&context).check_subject(&subject).unwrap();

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].kind, ViolationKind::TypeMismatch);
        assert_eq!(report.errors[0].path_string(), "age");
    }

    #[test]
    fn test_call_and_accessor_shapes() {
        let context = context_with(false);
        let contract = SubjectBuilder::new("Shaped")
            .provider()
            .declare("run", rce_core::criteria::CallCriterion::new(vec![], ValueCriterion::mixed()))
            .declare(
                "size",
                AccessorCriterion::read_write(value(&["number"]), value(&["number"])),
            )
            .build();
        let subject = SubjectBuilder::new("Thing")
            .extends(&contract)
            .member("run", Member::Value(Value::from(1)))
            .member(
                "size",
                Member::accessor(
                    Some(Function::new("get size", |_: &[Value]| Ok(Value::from(1)))),
                    None,
                ),
            )
            .build();

        let report = Validator::new(&context).check_subject(&subject).unwrap();

        assert_eq!(report.errors_of(ViolationKind::NotCallable).len(), 1);
        let shape = report.errors_of(ViolationKind::AccessorShapeMismatch);
        assert_eq!(shape.len(), 1);
        assert!(shape[0].message.contains("setter"));
    }

    #[test]
    fn test_failing_getter_is_a_warning() {
        let context = context_with(false);
        let contract = SubjectBuilder::new("Labelled")
            .provider()
            .declare("label", value(&["string"]))
            .build();
        let subject = SubjectBuilder::new("Thing")
            .extends(&contract)
            .member(
                "label",
                Member::accessor(
                    Some(Function::new("get label", |_: &[Value]| {
                        Err(HostError::thrown("not ready"))
                    })),
                    None,
                ),
            )
            .build();

        let report = Validator::new(&context).check_subject(&subject).unwrap();

        assert!(report.is_valid());
        assert_eq!(report.warnings[0].kind, WarningKind::UnreadableMember);
    }

    #[test]
    fn test_uncovered_members_when_enabled() {
        let context = context_with(true);
        let subject = SubjectBuilder::new("Person")
            .extends(&person())
            .member("name", Member::Value(Value::from("Ada")))
            .member("age", Member::Value(Value::from(36)))
            .member("extra", Member::Value(Value::from(true)))
            .build();

        let memory = create_test_logger();
        let service = Arc::new(LoggingService::new(memory.clone(), LogLevel::Debug));
        let report = with_thread_logger(service, || {
            Validator::new(&context).check_subject(&subject).unwrap()
        });

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].member, "extra");
        assert!(memory.has_success_with_code(codes::success::VALIDATION_PASSED));
    }

    #[test]
    fn test_objects_resolve_through_their_shape() {
        let context = context_with(false);
        let shape = SubjectBuilder::new("Person")
            .extends(&person())
            .member("name", Member::Value(Value::from("Ada")))
            .build();
        let object = HostObject::with_members(
            Some(&shape),
            vec![("age", Member::Value(Value::from(36)))],
        );

        let report = Validator::new(&context).check_object(&object).unwrap();
        assert!(report.is_valid(), "{:?}", report.errors);
        assert_eq!(report.subject, "Person instance");
    }
}
