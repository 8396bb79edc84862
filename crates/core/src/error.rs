// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain-level error taxonomy and validation-error classification.
//!
//! Tracker-specific conflict/timeout errors (`AlreadyRunningInMemory`,
//! `ConfirmationTimeout`, ...) live in `quorum-engine` next to the
//! component that raises them; this module only carries the errors that
//! belong to the domain types themselves (workflow/task shape validation).

use crate::workflow::TaskId;
use thiserror::Error;

/// Errors raised while constructing or mutating a [`crate::workflow::WorkflowState`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DomainError {
    #[error("task {0} depends on unknown task {1}")]
    UnknownDependency(TaskId, TaskId),

    #[error("adding task {0} would introduce a dependency cycle")]
    DependencyCycle(TaskId),

    #[error("unknown kanban column: {0}")]
    UnknownColumn(String),

    #[error("workflow is not in a mutable state (status={0})")]
    NotInMutableState(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Machine-readable classification of a [`ValidationError`].
///
/// Inferred from the error's `message` the way the teacher's
/// `monitor::agent_failure_to_error_type` infers a coarse category from
/// an underlying failure shape, rather than being threaded through as a
/// separate parameter at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    Required,
    InvalidEnum,
    InvalidRange,
    InvalidDuration,
    InvalidPath,
    DependencyChain,
    MutualExclusion,
    AgentNotEnabled,
    UnknownAgent,
    UnknownPhase,
}

crate::simple_display! {
    ValidationCode {
        Required => "required",
        InvalidEnum => "invalid_enum",
        InvalidRange => "invalid_range",
        InvalidDuration => "invalid_duration",
        InvalidPath => "invalid_path",
        DependencyChain => "dependency_chain",
        MutualExclusion => "mutual_exclusion",
        AgentNotEnabled => "agent_not_enabled",
        UnknownAgent => "unknown_agent",
        UnknownPhase => "unknown_phase",
    }
}

/// A structured, field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub value: String,
    pub message: String,
    pub code: ValidationCode,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} (value={:?}, code={})", self.field, self.message, self.value, self.code)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Build a validation error, inferring `code` from the message text.
    ///
    /// Mirrors the teacher's shape-based classification: callers write a
    /// human-readable message, and the coarse machine code falls out of it
    /// instead of being duplicated at every call site.
    pub fn new(field: impl Into<String>, value: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let code = classify(&message);
        Self { field: field.into(), value: value.into(), message, code }
    }
}

/// Infer a [`ValidationCode`] from free-text error message content.
fn classify(message: &str) -> ValidationCode {
    let m = message.to_ascii_lowercase();
    if m.contains("required") || m.contains("must be present") || m.contains("missing") {
        ValidationCode::Required
    } else if m.contains("enum") || m.contains("one of") {
        ValidationCode::InvalidEnum
    } else if m.contains("range") || m.contains("between") || m.contains("must be at least") || m.contains("must be at most")
    {
        ValidationCode::InvalidRange
    } else if m.contains("duration") {
        ValidationCode::InvalidDuration
    } else if m.contains("path") {
        ValidationCode::InvalidPath
    } else if m.contains("depend") || m.contains("cycle") || m.contains("chain") {
        ValidationCode::DependencyChain
    } else if m.contains("mutually exclusive") || m.contains("cannot be set together") {
        ValidationCode::MutualExclusion
    } else if m.contains("not enabled") {
        ValidationCode::AgentNotEnabled
    } else if m.contains("unknown agent") {
        ValidationCode::UnknownAgent
    } else if m.contains("unknown phase") || m.contains("phase") {
        ValidationCode::UnknownPhase
    } else {
        ValidationCode::Required
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
