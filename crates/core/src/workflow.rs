// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow identifiers and the authoritative [`WorkflowState`] record.

use crate::error::DomainError;
use crate::project::ProjectId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

crate::define_id! {
    /// Unique identifier for a workflow, opaque and unique within a project.
    pub struct WorkflowId("wf--");
}

crate::define_id! {
    /// Unique identifier for a task within a workflow.
    pub struct TaskId("tsk-");
}

crate::define_id! {
    /// Unique identifier for an attachment on a workflow.
    pub struct AttachmentId("att-");
}

crate::define_id! {
    /// Unique identifier for a checkpoint entry.
    pub struct CheckpointId("ckp-");
}

/// Authoritative workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Paused,
    AwaitingReview,
    Completed,
    Failed,
}

crate::simple_display! {
    WorkflowStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        AwaitingReview => "awaiting_review",
        Completed => "completed",
        Failed => "failed",
    }
}

impl WorkflowStatus {
    /// Terminal statuses forbid membership in the running-set (spec.md S3 invariant).
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

/// Current phase of the analyze -> plan -> execute -> synthesize pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Refine,
    Analyze,
    Plan,
    Execute,
    Synthesize,
    Done,
}

crate::simple_display! {
    Phase {
        Refine => "refine",
        Analyze => "analyze",
        Plan => "plan",
        Execute => "execute",
        Synthesize => "synthesize",
        Done => "done",
    }
}

/// Kanban board column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanColumn {
    Refinement,
    Todo,
    InProgress,
    ToVerify,
    Done,
}

crate::simple_display! {
    KanbanColumn {
        Refinement => "refinement",
        Todo => "todo",
        InProgress => "in_progress",
        ToVerify => "to_verify",
        Done => "done",
    }
}

impl KanbanColumn {
    pub fn from_str_loose(s: &str) -> Result<Self, DomainError> {
        match s {
            "refinement" => Ok(Self::Refinement),
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "to_verify" => Ok(Self::ToVerify),
            "done" => Ok(Self::Done),
            other => Err(DomainError::UnknownColumn(other.to_string())),
        }
    }
}

/// Status of an individual task within a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Blocked,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Blocked => "blocked",
    }
}

/// A single task within a workflow's task graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    /// Tasks that must complete before this one may start.
    #[serde(default)]
    pub depends_on: Vec<TaskId>,
    pub error: Option<String>,
}

impl TaskState {
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self { id, title: title.into(), status: TaskStatus::Pending, depends_on: Vec::new(), error: None }
    }
}

/// An uploaded attachment's metadata (byte storage is out of scope, see spec.md S1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub id: AttachmentId,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Checkpoint kind recorded in [`WorkflowState::checkpoints`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    PhaseTransition,
    ManualSave,
    ForceStop,
    Orphaned,
}

crate::simple_display! {
    CheckpointKind {
        PhaseTransition => "phase_transition",
        ManualSave => "manual_save",
        ForceStop => "force_stop",
        Orphaned => "orphaned",
    }
}

/// A single checkpoint entry appended to a workflow's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    #[serde(rename = "type")]
    pub kind: CheckpointKind,
    pub phase: Phase,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// The authoritative, durable record for one workflow (spec.md S3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: WorkflowId,
    pub project_id: ProjectId,
    pub title: String,
    pub prompt: String,
    pub optimized_prompt: Option<String>,
    pub report_path: Option<String>,
    pub status: WorkflowStatus,
    pub current_phase: Phase,
    tasks: IndexMap<TaskId, TaskState>,
    task_order: Vec<TaskId>,
    pub attachments: Vec<AttachmentMeta>,
    pub checkpoints: Vec<Checkpoint>,
    pub kanban_column: KanbanColumn,
    pub kanban_position: u32,
    pub kanban_execution_count: u32,
    pub kanban_last_error: Option<String>,
    pub kanban_started_at: Option<DateTime<Utc>>,
    pub kanban_completed_at: Option<DateTime<Utc>>,
    pub pr_url: Option<String>,
    pub pr_number: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub heartbeat_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl WorkflowState {
    /// Create a brand new, `pending` workflow with no tasks.
    pub fn new(
        workflow_id: WorkflowId,
        project_id: ProjectId,
        title: impl Into<String>,
        prompt: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            workflow_id,
            project_id,
            title: title.into(),
            prompt: prompt.into(),
            optimized_prompt: None,
            report_path: None,
            status: WorkflowStatus::Pending,
            current_phase: Phase::Refine,
            tasks: IndexMap::new(),
            task_order: Vec::new(),
            attachments: Vec::new(),
            checkpoints: Vec::new(),
            kanban_column: KanbanColumn::Refinement,
            kanban_position: 0,
            kanban_execution_count: 0,
            kanban_last_error: None,
            kanban_started_at: None,
            kanban_completed_at: None,
            pr_url: None,
            pr_number: None,
            created_at: now,
            updated_at: now,
            heartbeat_at: None,
            error: None,
        }
    }

    /// Read-only view of the task map.
    pub fn tasks(&self) -> &IndexMap<TaskId, TaskState> {
        &self.tasks
    }

    /// Read-only view of the task ordering.
    pub fn task_order(&self) -> &[TaskId] {
        &self.task_order
    }

    /// Insert or replace a task, appending it to `task_order` the first time it is
    /// seen. Rejects unknown dependencies and dependency cycles (spec.md S8 "DAG guard"):
    /// on error the task map and order are left completely unchanged.
    pub fn upsert_task(&mut self, task: TaskState) -> Result<(), DomainError> {
        for dep in &task.depends_on {
            if *dep != task.id && !self.tasks.contains_key(dep) {
                return Err(DomainError::UnknownDependency(task.id, *dep));
            }
        }

        let mut probe = self.tasks.clone();
        probe.insert(task.id, task.clone());
        if has_cycle(&probe) {
            return Err(DomainError::DependencyCycle(task.id));
        }

        let is_new = !self.tasks.contains_key(&task.id);
        self.tasks.insert(task.id, task.clone());
        if is_new {
            self.task_order.push(task.id);
        }
        debug_assert_eq!(self.tasks.len(), self.task_order.len());
        Ok(())
    }

    /// Remove a task from both the map and the ordering.
    pub fn remove_task(&mut self, id: &TaskId) {
        self.tasks.shift_remove(id);
        self.task_order.retain(|t| t != id);
    }

    /// Invariant check: `len(tasks) == len(task_order)` and identical key sets.
    pub fn task_invariant_holds(&self) -> bool {
        self.tasks.len() == self.task_order.len()
            && self.task_order.iter().collect::<HashSet<_>>() == self.tasks.keys().collect::<HashSet<_>>()
    }

    /// Append a checkpoint to the workflow's history.
    pub fn push_checkpoint(&mut self, kind: CheckpointKind, message: impl Into<String>, now: DateTime<Utc>) {
        self.checkpoints.push(Checkpoint {
            id: CheckpointId::new(),
            kind,
            phase: self.current_phase,
            timestamp: now,
            message: message.into(),
        });
    }

    /// True when the workflow may still be mutated by the request path
    /// (not already in a status the tracker has exclusive ownership of).
    pub fn is_mutable(&self) -> bool {
        !matches!(self.status, WorkflowStatus::Running)
    }
}

/// Depth-first cycle detection over the task dependency graph.
fn has_cycle(tasks: &IndexMap<TaskId, TaskState>) -> bool {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }
    use std::collections::HashMap;

    fn visit(id: TaskId, tasks: &IndexMap<TaskId, TaskState>, marks: &mut HashMap<TaskId, Mark>) -> bool {
        match marks.get(&id) {
            Some(Mark::Done) => return false,
            Some(Mark::Visiting) => return true,
            None => {}
        }
        marks.insert(id, Mark::Visiting);
        if let Some(task) = tasks.get(&id) {
            for dep in &task.depends_on {
                if visit(*dep, tasks, marks) {
                    return true;
                }
            }
        }
        marks.insert(id, Mark::Done);
        false
    }

    let mut marks = HashMap::new();
    tasks.keys().any(|id| visit(*id, tasks, &mut marks))
}

/// Durable running-set row: one per workflow currently claimed by a process
/// (spec.md S3 `RunningWorkflowRecord`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningWorkflowRecord {
    pub workflow_id: WorkflowId,
    pub lock_holder_host: String,
    pub lock_holder_pid: i32,
    pub acquired_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
}

/// Durable state for the Kanban engine, persisted alongside workflow state
/// (spec.md S3 `KanbanEngineState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanEngineState {
    pub enabled: bool,
    pub current_workflow_id: Option<WorkflowId>,
    pub consecutive_failures: u32,
    pub circuit_breaker_open: bool,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl Default for KanbanEngineState {
    fn default() -> Self {
        Self {
            enabled: false,
            current_workflow_id: None,
            consecutive_failures: 0,
            circuit_breaker_open: false,
            last_failure_at: None,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct WorkflowStateBuilder {
    workflow_id: WorkflowId,
    project_id: ProjectId,
    title: String,
    prompt: String,
    status: WorkflowStatus,
    current_phase: Phase,
    kanban_column: KanbanColumn,
    now: DateTime<Utc>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for WorkflowStateBuilder {
    fn default() -> Self {
        Self {
            workflow_id: WorkflowId::new(),
            project_id: ProjectId::new(),
            title: "test workflow".to_string(),
            prompt: "do the thing".to_string(),
            status: WorkflowStatus::Pending,
            current_phase: Phase::Refine,
            kanban_column: KanbanColumn::Refinement,
            now: Utc::now(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl WorkflowStateBuilder {
    crate::setters! {
        into {
            title: String,
            prompt: String,
        }
        set {
            status: WorkflowStatus,
            current_phase: Phase,
            kanban_column: KanbanColumn,
            workflow_id: WorkflowId,
            project_id: ProjectId,
            now: DateTime<Utc>,
        }
    }

    pub fn build(self) -> WorkflowState {
        let mut state = WorkflowState::new(self.workflow_id, self.project_id, self.title, self.prompt, self.now);
        state.status = self.status;
        state.current_phase = self.current_phase;
        state.kanban_column = self.kanban_column;
        state
    }
}

#[cfg(any(test, feature = "test-support"))]
impl WorkflowState {
    pub fn builder() -> WorkflowStateBuilder {
        WorkflowStateBuilder::default()
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
