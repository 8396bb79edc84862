// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state store contract the execution core consumes (spec.md S6).
//!
//! Expressed as two capability traits rather than one god-trait, following
//! the design note that dynamic dispatch here should be the smallest set of
//! capabilities: every backend must provide [`WorkflowStore`]; [`KanbanStore`]
//! is optional and probed at the call site, failing with
//! `StorageError::ServiceUnavailable` when a backend doesn't implement it.

use crate::error::StorageError;
use async_trait::async_trait;
use quorum_core::{KanbanColumn, KanbanEngineState, RunningWorkflowRecord, WorkflowId, WorkflowState};
use std::collections::BTreeMap;

/// Mutation surface exposed inside a single [`WorkflowStore::execute_atomically`]
/// transaction. Synchronous by design: the backend has already paid the cost
/// of acquiring its serialization lock before the caller's closure runs.
pub trait AtomicCtx {
    fn is_workflow_running(&self, id: &WorkflowId) -> bool;
    fn set_workflow_running(&mut self, record: RunningWorkflowRecord);
    fn load_by_id(&self, id: &WorkflowId) -> Option<WorkflowState>;
    fn save(&mut self, state: WorkflowState);
}

/// Durable workflow state and running-set, with a single-transaction
/// primitive strong enough to make `StartExecution` linearizable.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn load_by_id(&self, id: &WorkflowId) -> Result<Option<WorkflowState>, StorageError>;

    async fn save(&self, state: WorkflowState) -> Result<(), StorageError>;

    /// Run `f` inside a serialized transaction. Any error returned by `f`
    /// aborts the transaction; partial writes made through the passed
    /// [`AtomicCtx`] before the error must not be observable afterwards.
    async fn execute_atomically(
        &self,
        f: Box<dyn FnOnce(&mut dyn AtomicCtx) -> Result<(), StorageError> + Send + '_>,
    ) -> Result<(), StorageError>;

    async fn is_workflow_running(&self, id: &WorkflowId) -> Result<bool, StorageError>;

    async fn clear_workflow_running(&self, id: &WorkflowId) -> Result<(), StorageError>;

    async fn list_running_workflows(&self) -> Result<Vec<RunningWorkflowRecord>, StorageError>;
}

/// Optional capability: Kanban board persistence. Backends that don't
/// support board-driven scheduling simply don't implement this trait; the
/// Kanban engine probes for it at construction and refuses to start without
/// surfacing a clear error instead of panicking deep in the scheduler loop.
#[async_trait]
pub trait KanbanStore: Send + Sync {
    async fn load_kanban_state(&self) -> Result<KanbanEngineState, StorageError>;

    async fn save_kanban_state(&self, state: &KanbanEngineState) -> Result<(), StorageError>;

    /// Next candidate from `todo`: lowest `kanban_position`, ties broken by
    /// `updated_at` ascending.
    async fn next_queued_workflow(&self) -> Result<Option<WorkflowId>, StorageError>;

    /// Snapshot of the board grouped by column, ordered by `kanban_position`
    /// within each column.
    async fn board(&self) -> Result<BTreeMap<KanbanColumn, Vec<WorkflowId>>, StorageError>;
}
