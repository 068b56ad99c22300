//! Contract violations
//!
//! Every failure the engine reports is a [`ContractViolation`]: a stable kind tag, a path
//! of member names and positions, and the sibling failures it aggregates. Leaf checks
//! collect their siblings before returning, so a caller sees one violation per
//! operation no matter how many positions failed.

use crate::config::compile_time::diagnostics::{
    MAX_ERROR_MESSAGE_LENGTH, MAX_MEMBER_NAME_LENGTH, MAX_VIOLATIONS_PER_REPORT,
};
use crate::logging::codes::{self, Code};
use serde::Serialize;
use std::fmt;

/// Stable violation tags exposed to diagnostics consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    MalformedTypeSet,
    TypeMismatch,
    NotIncluded,
    Excluded,
    CompositionConflict,
    AccessorShapeMismatch,
    MemberMissing,
    NotCallable,
    ArgumentMismatch,
    ResultMismatch,
}

impl ViolationKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ViolationKind::MalformedTypeSet => "MalformedTypeSet",
            ViolationKind::TypeMismatch => "TypeMismatch",
            ViolationKind::NotIncluded => "NotIncluded",
            ViolationKind::Excluded => "Excluded",
            ViolationKind::CompositionConflict => "CompositionConflict",
            ViolationKind::AccessorShapeMismatch => "AccessorShapeMismatch",
            ViolationKind::MemberMissing => "MemberMissing",
            ViolationKind::NotCallable => "NotCallable",
            ViolationKind::ArgumentMismatch => "ArgumentMismatch",
            ViolationKind::ResultMismatch => "ResultMismatch",
        }
    }

    /// Log code emitted alongside this kind
    pub fn code(&self) -> Code {
        match self {
            ViolationKind::MalformedTypeSet => codes::violations::MALFORMED_TYPE_SET,
            ViolationKind::TypeMismatch => codes::violations::TYPE_MISMATCH,
            ViolationKind::NotIncluded => codes::violations::NOT_INCLUDED,
            ViolationKind::Excluded => codes::violations::EXCLUDED,
            ViolationKind::CompositionConflict => codes::violations::COMPOSITION_CONFLICT,
            ViolationKind::AccessorShapeMismatch => codes::violations::ACCESSOR_SHAPE_MISMATCH,
            ViolationKind::MemberMissing => codes::violations::MEMBER_MISSING,
            ViolationKind::NotCallable => codes::violations::NOT_CALLABLE,
            ViolationKind::ArgumentMismatch => codes::violations::ARGUMENT_MISMATCH,
            ViolationKind::ResultMismatch => codes::violations::RESULT_MISMATCH,
        }
    }

    /// Value-level kinds are the ones a single literal check can produce
    pub fn is_value_level(&self) -> bool {
        matches!(
            self,
            ViolationKind::TypeMismatch | ViolationKind::NotIncluded | ViolationKind::Excluded
        )
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One step of a violation path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    Member(String),
    Position(usize),
    Result,
    Read,
    Write,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Member(name) => f.write_str(name),
            PathSegment::Position(index) => write!(f, "[{}]", index),
            PathSegment::Result => f.write_str("<result>"),
            PathSegment::Read => f.write_str("<read>"),
            PathSegment::Write => f.write_str("<write>"),
        }
    }
}

fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return String::new();
    }

    let mut rendered = String::from(" at ");
    for (index, segment) in path.iter().enumerate() {
        if index > 0 && matches!(segment, PathSegment::Member(_)) {
            rendered.push('.');
        }
        rendered.push_str(&segment.to_string());
    }
    rendered
}

/// Aggregate contract failure
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind}{}: {message}", render_path(.path))]
pub struct ContractViolation {
    pub kind: ViolationKind,
    pub path: Vec<PathSegment>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub origins: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<ContractViolation>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl ContractViolation {
    /// Leaf violation with no path and no causes
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: Vec::new(),
            message: bound_message(message.into()),
            origins: Vec::new(),
            causes: Vec::new(),
            truncated: false,
        }
    }

    /// Fold sibling failures into one parent. Causes beyond the report limit are dropped
    /// and the parent is flagged as truncated.
    pub fn aggregate(
        kind: ViolationKind,
        message: impl Into<String>,
        mut causes: Vec<ContractViolation>,
    ) -> Self {
        let truncated = causes.len() > MAX_VIOLATIONS_PER_REPORT;
        causes.truncate(MAX_VIOLATIONS_PER_REPORT);

        let mut origins: Vec<String> = Vec::new();
        for cause in &causes {
            for origin in &cause.origins {
                if !origins.contains(origin) {
                    origins.push(origin.clone());
                }
            }
        }

        Self {
            kind,
            path: Vec::new(),
            message: bound_message(message.into()),
            origins,
            causes,
            truncated,
        }
    }

    /// Prefix the path of this violation and every nested cause with `segment`
    pub fn at(mut self, segment: PathSegment) -> Self {
        self.prefix(&segment);
        self
    }

    fn prefix(&mut self, segment: &PathSegment) {
        self.path.insert(0, segment.clone());
        for cause in &mut self.causes {
            cause.prefix(segment);
        }
    }

    /// Prefix with a member segment; overlong names are cut
    pub fn at_member(self, name: &str) -> Self {
        self.at(PathSegment::Member(truncate(name.to_string(), MAX_MEMBER_NAME_LENGTH)))
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        if !self.origins.contains(&origin) {
            self.origins.push(origin);
        }
        self
    }

    pub fn code(&self) -> Code {
        self.kind.code()
    }

    /// Number of leaf failures under this violation (a leaf counts itself)
    pub fn leaf_count(&self) -> usize {
        if self.causes.is_empty() {
            1
        } else {
            self.causes.iter().map(ContractViolation::leaf_count).sum()
        }
    }

    pub fn leaves(&self) -> Vec<&ContractViolation> {
        if self.causes.is_empty() {
            return vec![self];
        }
        self.causes.iter().flat_map(|cause| cause.leaves()).collect()
    }

    /// Depth-first search for the first violation of `kind`, including this one
    pub fn find(&self, kind: ViolationKind) -> Option<&ContractViolation> {
        if self.kind == kind {
            return Some(self);
        }
        self.causes.iter().find_map(|cause| cause.find(kind))
    }

    /// Number of nodes of `kind` in this tree, aggregates and this one included
    pub fn count(&self, kind: ViolationKind) -> usize {
        let own = usize::from(self.kind == kind);
        own + self.causes.iter().map(|c| c.count(kind)).sum::<usize>()
    }

    /// Path rendered as `member.member[0]<result>`
    pub fn path_string(&self) -> String {
        render_path(&self.path)
            .trim_start_matches(" at ")
            .to_string()
    }

    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn bound_message(message: String) -> String {
    truncate(message, MAX_ERROR_MESSAGE_LENGTH)
}

fn truncate(text: String, limit: usize) -> String {
    if text.len() <= limit {
        return text;
    }

    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_prefix_every_cause() {
        let leaf = ContractViolation::new(ViolationKind::TypeMismatch, "expected number");
        let parent = ContractViolation::aggregate(
            ViolationKind::ArgumentMismatch,
            "1 argument rejected",
            vec![leaf.at(PathSegment::Position(0))],
        )
        .at_member("run");

        assert_eq!(parent.path_string(), "run");
        assert_eq!(parent.causes[0].path_string(), "run[0]");
        assert_eq!(
            parent.to_string(),
            "ArgumentMismatch at run: 1 argument rejected"
        );
    }

    #[test]
    fn test_leaf_count_and_find() {
        let violation = ContractViolation::aggregate(
            ViolationKind::CompositionConflict,
            "conflicts",
            vec![
                ContractViolation::new(ViolationKind::CompositionConflict, "a"),
                ContractViolation::aggregate(
                    ViolationKind::CompositionConflict,
                    "nested",
                    vec![
                        ContractViolation::new(ViolationKind::AccessorShapeMismatch, "b"),
                        ContractViolation::new(ViolationKind::CompositionConflict, "c"),
                    ],
                ),
            ],
        );

        assert_eq!(violation.leaf_count(), 3);
        assert!(violation.find(ViolationKind::AccessorShapeMismatch).is_some());
        assert!(violation.find(ViolationKind::NotCallable).is_none());
        assert_eq!(violation.count(ViolationKind::CompositionConflict), 4);
        assert_eq!(violation.count(ViolationKind::AccessorShapeMismatch), 1);
    }

    #[test]
    fn test_long_member_names_are_cut() {
        let name = "m".repeat(MAX_MEMBER_NAME_LENGTH + 10);
        let violation =
            ContractViolation::new(ViolationKind::MemberMissing, "required").at_member(&name);

        let PathSegment::Member(segment) = &violation.path[0] else {
            panic!("expected a member segment");
        };
        assert_eq!(segment.len(), MAX_MEMBER_NAME_LENGTH + 3);
        assert!(segment.ends_with("..."));
    }

    #[test]
    fn test_aggregate_collects_origins() {
        let violation = ContractViolation::aggregate(
            ViolationKind::CompositionConflict,
            "conflict",
            vec![ContractViolation::new(ViolationKind::CompositionConflict, "x")
                .with_origin("Runner")
                .with_origin("Walker")],
        );

        assert_eq!(violation.origins, vec!["Runner", "Walker"]);
    }

    #[test]
    fn test_aggregate_is_bounded() {
        let causes = (0..MAX_VIOLATIONS_PER_REPORT + 5)
            .map(|i| ContractViolation::new(ViolationKind::MemberMissing, format!("m{}", i)))
            .collect();
        let violation = ContractViolation::aggregate(ViolationKind::MemberMissing, "many", causes);

        assert!(violation.truncated);
        assert_eq!(violation.causes.len(), MAX_VIOLATIONS_PER_REPORT);
    }

    #[test]
    fn test_json_carries_stable_tags() {
        let violation = ContractViolation::new(ViolationKind::NotCallable, "not invocable")
            .at_member("run");
        let json = violation.format_json().unwrap();

        assert!(json.contains("\"kind\":\"NotCallable\""));
        assert!(json.contains("\"member\":\"run\""));
        assert!(!json.contains("truncated"));
    }

    #[test]
    fn test_kinds_map_to_codes() {
        assert_eq!(ViolationKind::ResultMismatch.code().as_str(), "V031");
        assert!(ViolationKind::Excluded.is_value_level());
        assert!(!ViolationKind::MemberMissing.is_value_level());
    }
}
