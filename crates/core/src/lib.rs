// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! quorum-core: domain types for the Quorum workflow execution core.
//!
//! This crate has no async runtime dependency and no knowledge of
//! storage backends — it owns the shapes (`WorkflowState`, `Event`,
//! `Project`, ...) that `quorum-storage` persists and `quorum-engine`
//! orchestrates.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod macros;

pub mod clock;
pub mod env;
pub mod error;
pub mod event;
pub mod id;
pub mod project;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{DomainError, ValidationCode, ValidationError};
pub use event::{Event, EventKind, LogLevel};
pub use id::short;
pub use project::{ConfigMode, Project, ProjectId, ProjectStatus};
#[cfg(any(test, feature = "test-support"))]
pub use workflow::WorkflowStateBuilder;
pub use workflow::{
    AttachmentId, AttachmentMeta, Checkpoint, CheckpointId, CheckpointKind, KanbanColumn,
    KanbanEngineState, Phase, RunningWorkflowRecord, TaskId, TaskState, TaskStatus, WorkflowId,
    WorkflowState, WorkflowStatus,
};
