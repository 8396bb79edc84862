// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle event taxonomy for the event bus (spec.md S4.1, S6 wire contract).
//!
//! `Event` carries the full per-type payload; [`EventKind`] is the
//! tag-only projection used for subscriber filtering (set membership,
//! no associated data), the same split `oj-core::job` uses between
//! `StepStatus` and `StepStatusKind`.

use crate::project::ProjectId;
use crate::workflow::{KanbanColumn, Phase, TaskId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Log severity carried by [`Event::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

/// A lifecycle event published on the event bus.
///
/// Serializes with `{"event_type": "phase_started", ...}` per spec.md S6.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    PhaseStarted { workflow_id: WorkflowId, project_id: ProjectId, timestamp: DateTime<Utc>, phase: Phase },
    PhaseCompleted {
        workflow_id: WorkflowId,
        project_id: ProjectId,
        timestamp: DateTime<Utc>,
        phase: Phase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },
    PhaseAwaitingReview { workflow_id: WorkflowId, project_id: ProjectId, timestamp: DateTime<Utc>, phase: Phase },
    PhaseReviewApproved { workflow_id: WorkflowId, project_id: ProjectId, timestamp: DateTime<Utc>, phase: Phase },
    PhaseReviewRejected {
        workflow_id: WorkflowId,
        project_id: ProjectId,
        timestamp: DateTime<Utc>,
        phase: Phase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
    Log {
        workflow_id: WorkflowId,
        project_id: ProjectId,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        message: String,
        #[serde(default)]
        fields: HashMap<String, String>,
    },
    WorkflowStarted { workflow_id: WorkflowId, project_id: ProjectId, timestamp: DateTime<Utc> },
    WorkflowFinished { workflow_id: WorkflowId, project_id: ProjectId, timestamp: DateTime<Utc> },
    WorkflowFailed { workflow_id: WorkflowId, project_id: ProjectId, timestamp: DateTime<Utc>, error: String },
    KanbanWorkflowMoved {
        workflow_id: WorkflowId,
        project_id: ProjectId,
        timestamp: DateTime<Utc>,
        from_column: KanbanColumn,
        to_column: KanbanColumn,
        position: u32,
        manual: bool,
    },
    IssuesGenerationProgress {
        workflow_id: WorkflowId,
        project_id: ProjectId,
        timestamp: DateTime<Utc>,
        stage: String,
        current: u32,
        total: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_main_issue: Option<bool>,
    },
    IssuesPublishingProgress {
        workflow_id: WorkflowId,
        project_id: ProjectId,
        timestamp: DateTime<Utc>,
        stage: String,
        current: u32,
        total: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_number: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dry_run: Option<bool>,
    },
}

/// Tag-only projection of [`Event`] for subscriber filter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PhaseStarted,
    PhaseCompleted,
    PhaseAwaitingReview,
    PhaseReviewApproved,
    PhaseReviewRejected,
    Log,
    WorkflowStarted,
    WorkflowFinished,
    WorkflowFailed,
    KanbanWorkflowMoved,
    IssuesGenerationProgress,
    IssuesPublishingProgress,
}

crate::simple_display! {
    EventKind {
        PhaseStarted => "phase_started",
        PhaseCompleted => "phase_completed",
        PhaseAwaitingReview => "phase_awaiting_review",
        PhaseReviewApproved => "phase_review_approved",
        PhaseReviewRejected => "phase_review_rejected",
        Log => "log",
        WorkflowStarted => "workflow_started",
        WorkflowFinished => "workflow_finished",
        WorkflowFailed => "workflow_failed",
        KanbanWorkflowMoved => "kanban_workflow_moved",
        IssuesGenerationProgress => "issues_generation_progress",
        IssuesPublishingProgress => "issues_publishing_progress",
    }
}

impl From<&Event> for EventKind {
    fn from(e: &Event) -> Self {
        match e {
            Event::PhaseStarted { .. } => EventKind::PhaseStarted,
            Event::PhaseCompleted { .. } => EventKind::PhaseCompleted,
            Event::PhaseAwaitingReview { .. } => EventKind::PhaseAwaitingReview,
            Event::PhaseReviewApproved { .. } => EventKind::PhaseReviewApproved,
            Event::PhaseReviewRejected { .. } => EventKind::PhaseReviewRejected,
            Event::Log { .. } => EventKind::Log,
            Event::WorkflowStarted { .. } => EventKind::WorkflowStarted,
            Event::WorkflowFinished { .. } => EventKind::WorkflowFinished,
            Event::WorkflowFailed { .. } => EventKind::WorkflowFailed,
            Event::KanbanWorkflowMoved { .. } => EventKind::KanbanWorkflowMoved,
            Event::IssuesGenerationProgress { .. } => EventKind::IssuesGenerationProgress,
            Event::IssuesPublishingProgress { .. } => EventKind::IssuesPublishingProgress,
        }
    }
}

impl Event {
    /// Tag-only kind, for filter-set membership tests.
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }

    /// The workflow this event concerns.
    pub fn workflow_id(&self) -> WorkflowId {
        match self {
            Event::PhaseStarted { workflow_id, .. }
            | Event::PhaseCompleted { workflow_id, .. }
            | Event::PhaseAwaitingReview { workflow_id, .. }
            | Event::PhaseReviewApproved { workflow_id, .. }
            | Event::PhaseReviewRejected { workflow_id, .. }
            | Event::Log { workflow_id, .. }
            | Event::WorkflowStarted { workflow_id, .. }
            | Event::WorkflowFinished { workflow_id, .. }
            | Event::WorkflowFailed { workflow_id, .. }
            | Event::KanbanWorkflowMoved { workflow_id, .. }
            | Event::IssuesGenerationProgress { workflow_id, .. }
            | Event::IssuesPublishingProgress { workflow_id, .. } => *workflow_id,
        }
    }

    /// The project this event concerns.
    pub fn project_id(&self) -> ProjectId {
        match self {
            Event::PhaseStarted { project_id, .. }
            | Event::PhaseCompleted { project_id, .. }
            | Event::PhaseAwaitingReview { project_id, .. }
            | Event::PhaseReviewApproved { project_id, .. }
            | Event::PhaseReviewRejected { project_id, .. }
            | Event::Log { project_id, .. }
            | Event::WorkflowStarted { project_id, .. }
            | Event::WorkflowFinished { project_id, .. }
            | Event::WorkflowFailed { project_id, .. }
            | Event::KanbanWorkflowMoved { project_id, .. }
            | Event::IssuesGenerationProgress { project_id, .. }
            | Event::IssuesPublishingProgress { project_id, .. } => *project_id,
        }
    }

    /// When this event was published.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::PhaseStarted { timestamp, .. }
            | Event::PhaseCompleted { timestamp, .. }
            | Event::PhaseAwaitingReview { timestamp, .. }
            | Event::PhaseReviewApproved { timestamp, .. }
            | Event::PhaseReviewRejected { timestamp, .. }
            | Event::Log { timestamp, .. }
            | Event::WorkflowStarted { timestamp, .. }
            | Event::WorkflowFinished { timestamp, .. }
            | Event::WorkflowFailed { timestamp, .. }
            | Event::KanbanWorkflowMoved { timestamp, .. }
            | Event::IssuesGenerationProgress { timestamp, .. }
            | Event::IssuesPublishingProgress { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
