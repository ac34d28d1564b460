//! Diagnostics accumulated by the pipeline stages.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Machine-readable message codes.
pub mod codes {
    pub const FRAMEWORK_MISSING: &str = "framework.missing";
    pub const AVATAR_MISSING: &str = "avatar.missing";
    pub const CLOSET_INVALID: &str = "closet.invalid";
    pub const SET_ORPHAN: &str = "hierarchy.set_orphan";
    pub const PART_ORPHAN: &str = "hierarchy.part_orphan";
    pub const ROOT_EMPTY: &str = "hierarchy.root_empty";
    pub const DUPLICATE_SET_INDEX: &str = "hierarchy.duplicate_index";
    pub const NOTHING_TO_GENERATE: &str = "source.empty";
    pub const TARGET_MISSING: &str = "outfit.target_missing";
    pub const TARGET_OUTSIDE_AVATAR: &str = "outfit.outside_avatar";
    pub const TARGET_NOT_IN_CLOSET: &str = "outfit.not_in_closet";
    pub const KEY_COLLISION: &str = "key.collision";
    pub const DUPLICATE_MODULE: &str = "drift.duplicate_module";
    pub const METADATA_MISSING: &str = "drift.metadata_missing";
    pub const SCHEMA_OUTDATED: &str = "drift.schema_outdated";
    pub const MARKER_MISMATCH: &str = "drift.marker_mismatch";
    pub const STRUCTURE_DRIFT: &str = "drift.structure";
    pub const STORE_UNHEALTHY: &str = "drift.store_unhealthy";
    pub const VALIDATION_PASSED: &str = "validation.passed";
    pub const REPAIR_SKIPPED: &str = "repair.skipped";
    pub const REPAIR_DONE: &str = "repair.done";
    pub const REPAIR_FAILED: &str = "repair.failed";
    pub const APPLY_DONE: &str = "apply.done";
    pub const APPLY_FAILED: &str = "apply.failed";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineMessage {
    pub severity: Severity,
    pub code: &'static str,
    pub text: String,
}

impl fmt::Display for PipelineMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.text)
    }
}

/// Ordered message list with severity helpers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageLog(Vec<PipelineMessage>);

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, code: &'static str, text: impl Into<String>) {
        self.0.push(PipelineMessage {
            severity,
            code,
            text: text.into(),
        });
    }

    pub fn info(&mut self, code: &'static str, text: impl Into<String>) {
        self.push(Severity::Info, code, text);
    }

    pub fn warning(&mut self, code: &'static str, text: impl Into<String>) {
        self.push(Severity::Warning, code, text);
    }

    pub fn error(&mut self, code: &'static str, text: impl Into<String>) {
        self.push(Severity::Error, code, text);
    }

    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.0.iter().filter(|m| m.severity == severity).count()
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn has_warning(&self) -> bool {
        self.0.iter().any(|m| m.severity == Severity::Warning)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.0.iter().any(|m| m.code == code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PipelineMessage> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[PipelineMessage] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<PipelineMessage> {
        self.0
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a PipelineMessage;
    type IntoIter = std::slice::Iter<'a, PipelineMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let mut log = MessageLog::new();
        log.info(codes::VALIDATION_PASSED, "ok");
        log.warning(codes::STRUCTURE_DRIFT, "drift");
        log.error(codes::KEY_COLLISION, "dup");
        log.error(codes::KEY_COLLISION, "dup again");

        assert_eq!(log.count(Severity::Info), 1);
        assert_eq!(log.count(Severity::Warning), 1);
        assert_eq!(log.count(Severity::Error), 2);
        assert!(log.has_error());
        assert!(log.has_code(codes::STRUCTURE_DRIFT));
        assert_eq!(
            log.as_slice()[2].to_string(),
            "[key.collision] dup"
        );
    }
}
