// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{Event, LogLevel};
use crate::project::ProjectId;
use crate::workflow::{Phase, WorkflowId};
use chrono::Utc;

/// Proptest strategies for core state machine types.
#[cfg(feature = "proptest")]
pub mod strategies {
    use crate::workflow::{Phase, WorkflowStatus};
    use proptest::prelude::*;

    pub fn arb_workflow_status() -> impl Strategy<Value = WorkflowStatus> {
        prop_oneof![
            Just(WorkflowStatus::Pending),
            Just(WorkflowStatus::Running),
            Just(WorkflowStatus::Paused),
            Just(WorkflowStatus::AwaitingReview),
            Just(WorkflowStatus::Completed),
            Just(WorkflowStatus::Failed),
        ]
    }

    pub fn arb_phase() -> impl Strategy<Value = Phase> {
        prop_oneof![
            Just(Phase::Refine),
            Just(Phase::Analyze),
            Just(Phase::Plan),
            Just(Phase::Execute),
            Just(Phase::Synthesize),
            Just(Phase::Done),
        ]
    }
}

pub fn workflow_started_event(workflow_id: WorkflowId, project_id: ProjectId) -> Event {
    Event::WorkflowStarted { workflow_id, project_id, timestamp: Utc::now() }
}

pub fn workflow_failed_event(workflow_id: WorkflowId, project_id: ProjectId, error: &str) -> Event {
    Event::WorkflowFailed { workflow_id, project_id, timestamp: Utc::now(), error: error.to_string() }
}

pub fn phase_started_event(workflow_id: WorkflowId, project_id: ProjectId, phase: Phase) -> Event {
    Event::PhaseStarted { workflow_id, project_id, timestamp: Utc::now(), phase }
}

pub fn phase_completed_event(workflow_id: WorkflowId, project_id: ProjectId, phase: Phase) -> Event {
    Event::PhaseCompleted { workflow_id, project_id, timestamp: Utc::now(), phase, duration_ms: Some(42) }
}

pub fn log_event(workflow_id: WorkflowId, project_id: ProjectId, message: &str) -> Event {
    Event::Log {
        workflow_id,
        project_id,
        timestamp: Utc::now(),
        level: LogLevel::Info,
        message: message.to_string(),
        fields: Default::default(),
    }
}
