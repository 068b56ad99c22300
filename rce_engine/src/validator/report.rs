// src/validator/report.rs
//! Structural validation results

use chrono::{DateTime, Utc};
use rce_core::config::compile_time::diagnostics::MAX_VIOLATIONS_PER_REPORT;
use rce_core::criteria::{ContractViolation, ViolationKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningKind {
    /// A value contract exists but the member's value could not be read
    UnreadableMember,
    /// An own member no contract covers
    UncoveredMember,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub member: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(kind: WarningKind, member: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            member: member.into(),
            message: message.into(),
        }
    }
}

/// Every failure found by one validation pass
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{subject} failed structural validation with {} error(s)", .errors.len())]
pub struct ValidationReport {
    pub subject: String,
    pub errors: Vec<ContractViolation>,
    pub warnings: Vec<ValidationWarning>,
    pub checked_at: DateTime<Utc>,
    /// Errors past the report limit were dropped
    pub truncated: bool,
}

impl ValidationReport {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            checked_at: Utc::now(),
            truncated: false,
        }
    }

    pub fn add_error(&mut self, violation: ContractViolation) {
        if self.errors.len() >= MAX_VIOLATIONS_PER_REPORT {
            self.truncated = true;
            return;
        }
        self.errors.push(violation);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors of one kind, in discovery order
    pub fn errors_of(&self, kind: ViolationKind) -> Vec<&ContractViolation> {
        self.errors.iter().filter(|error| error.kind == kind).collect()
    }

    /// Fold another pass into this one; the earlier timestamp is kept
    pub fn merge(&mut self, other: ValidationReport) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
        self.truncated |= other.truncated;
    }

    pub fn into_result(self) -> Result<Self, Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(self)
        }
    }

    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
