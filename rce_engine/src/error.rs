// src/error.rs
//! Engine error types
//!
//! Contract failures are [`ContractViolation`]s; `EngineError` adds the ways a caller can
//! misuse the engine itself.

use rce_core::config::runtime::ConfigError;
use rce_core::criteria::ContractViolation;
use rce_core::logging::codes::{self, Code};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Subject '{0}' has no contract registry")]
    UnknownSubject(String),

    #[error("Ancestry of '{subject}' exceeds {limit} levels")]
    AncestryTooDeep { subject: String, limit: usize },

    #[error("Registry of '{subject}' would fold {count} providers, limit is {limit}")]
    ProviderLimitExceeded {
        subject: String,
        count: usize,
        limit: usize,
    },

    #[error("Chain terminator limit of {limit} reached")]
    TerminatorLimitExceeded { limit: usize },

    #[error("'{0}' is not a contract provider")]
    NotAProvider(String),

    #[error("Composition failed: {0}")]
    Composition(#[from] ContractViolation),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn code(&self) -> Code {
        match self {
            EngineError::UnknownSubject(_) => codes::registry::UNKNOWN_SUBJECT,
            EngineError::AncestryTooDeep { .. } => codes::registry::ANCESTRY_TOO_DEEP,
            EngineError::ProviderLimitExceeded { .. } => codes::registry::PROVIDER_LIMIT_EXCEEDED,
            EngineError::TerminatorLimitExceeded { .. } => {
                codes::registry::TERMINATOR_LIMIT_EXCEEDED
            }
            EngineError::NotAProvider(_) => codes::registry::NOT_A_PROVIDER,
            EngineError::Composition(violation) => violation.code(),
            EngineError::Config(_) => codes::system::CONFIGURATION_ERROR,
        }
    }

    /// Contract violation behind a composition failure
    pub fn as_violation(&self) -> Option<&ContractViolation> {
        match self {
            EngineError::Composition(violation) => Some(violation),
            _ => None,
        }
    }
}
