//! Consolidated event codes and classification system
//!
//! Single source of truth for every code the engine emits, together with its
//! behavioural metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
}

impl ErrorMetadata {
    const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        description: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            description,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// Contract violation codes, one per violation kind
pub mod violations {
    use super::Code;

    pub const MALFORMED_TYPE_SET: Code = Code::new("V001");
    pub const TYPE_MISMATCH: Code = Code::new("V002");
    pub const NOT_INCLUDED: Code = Code::new("V003");
    pub const EXCLUDED: Code = Code::new("V004");
    pub const COMPOSITION_CONFLICT: Code = Code::new("V010");
    pub const ACCESSOR_SHAPE_MISMATCH: Code = Code::new("V011");
    pub const MEMBER_MISSING: Code = Code::new("V020");
    pub const NOT_CALLABLE: Code = Code::new("V021");
    pub const ARGUMENT_MISMATCH: Code = Code::new("V030");
    pub const RESULT_MISMATCH: Code = Code::new("V031");
}

/// Registry and ancestry codes
pub mod registry {
    use super::Code;

    pub const UNKNOWN_SUBJECT: Code = Code::new("R001");
    pub const ANCESTRY_TOO_DEEP: Code = Code::new("R002");
    pub const PROVIDER_LIMIT_EXCEEDED: Code = Code::new("R003");
    pub const TERMINATOR_LIMIT_EXCEEDED: Code = Code::new("R004");
    pub const NOT_A_PROVIDER: Code = Code::new("R005");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const COMPOSITION_COMPLETE: Code = Code::new("I010");
    pub const PROVIDER_FOLDED: Code = Code::new("I011");
    pub const ATTACH_COMPLETE: Code = Code::new("I012");
    pub const ENFORCEMENT_COMPLETE: Code = Code::new("I020");
    pub const VALIDATION_PASSED: Code = Code::new("I030");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        use Severity::*;

        let entries = [
            ErrorMetadata::new("ERR001", "System", Critical, false, "Internal engine error"),
            ErrorMetadata::new("ERR002", "System", Critical, false, "Engine initialization failed"),
            ErrorMetadata::new("ERR003", "System", High, true, "Invalid runtime configuration"),
            ErrorMetadata::new("V001", "Criteria", High, true, "Type set is empty, duplicated or names unknown kinds"),
            ErrorMetadata::new("V002", "Value", Medium, true, "Value kind is not admitted by the type set"),
            ErrorMetadata::new("V003", "Value", Medium, true, "Value is not one of the included literals"),
            ErrorMetadata::new("V004", "Value", Medium, true, "Value matches an excluded literal"),
            ErrorMetadata::new("V010", "Composition", High, true, "Providers declare incompatible contracts for one member"),
            ErrorMetadata::new("V011", "Composition", High, true, "Accessor read/write presence differs"),
            ErrorMetadata::new("V020", "Structure", Medium, true, "Required member is missing"),
            ErrorMetadata::new("V021", "Structure", Medium, true, "Member must be invocable"),
            ErrorMetadata::new("V030", "Call", Medium, true, "Arguments violate the call contract"),
            ErrorMetadata::new("V031", "Call", Medium, true, "Result violates the call contract"),
            ErrorMetadata::new("R001", "Registry", High, true, "Subject has no registry"),
            ErrorMetadata::new("R002", "Registry", High, false, "Ancestry walk exceeded the depth limit"),
            ErrorMetadata::new("R003", "Registry", High, false, "Too many providers folded into one registry"),
            ErrorMetadata::new("R004", "Registry", Medium, false, "Too many chain terminators registered"),
            ErrorMetadata::new("R005", "Registry", Medium, true, "Subject is not a contract provider"),
            ErrorMetadata::new("I001", "Success", Low, true, "Logging initialized"),
            ErrorMetadata::new("I010", "Success", Low, true, "Rule composition complete"),
            ErrorMetadata::new("I011", "Success", Low, true, "Provider declarations folded"),
            ErrorMetadata::new("I012", "Success", Low, true, "Providers attached"),
            ErrorMetadata::new("I020", "Success", Low, true, "Members wrapped"),
            ErrorMetadata::new("I030", "Success", Low, true, "Structural validation passed"),
        ];

        entries.into_iter().map(|meta| (meta.code, meta)).collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Look up metadata for a code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Severity for a code (unknown codes are treated as medium)
pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|meta| meta.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if the condition behind a code can be corrected and retried
pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|meta| meta.recoverable)
        .unwrap_or(true)
}

/// Critical codes halt the current operation
pub fn requires_halt(code: &str) -> bool {
    get_severity(code) == Severity::Critical
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|meta| meta.description)
        .unwrap_or("Unknown error")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|meta| meta.category)
        .unwrap_or("Unknown")
}
