// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference state store: an in-memory backend behind a single serialization
//! lock per store instance, mirroring the "one internal mutex guards every
//! write" shape of the teacher's WAL-backed store without the WAL itself
//! (durability here is left to whatever wraps this with snapshot export).

use crate::error::StorageError;
use crate::traits::{AtomicCtx, KanbanStore, WorkflowStore};
use async_trait::async_trait;
use indexmap::IndexMap;
use quorum_core::{KanbanColumn, KanbanEngineState, RunningWorkflowRecord, WorkflowId, WorkflowState};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    workflows: IndexMap<WorkflowId, WorkflowState>,
    running: IndexMap<WorkflowId, RunningWorkflowRecord>,
    kanban: KanbanEngineState,
}

/// In-memory reference implementation of [`WorkflowStore`] and [`KanbanStore`].
///
/// Cheap to clone: all state lives behind a shared `Arc<Mutex<..>>`, so
/// cloning an `InMemoryStore` hands out another handle to the same data,
/// the way the teacher's project-scoped collaborators are shared by `Arc`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn export_all(&self) -> (Vec<WorkflowState>, Vec<RunningWorkflowRecord>, KanbanEngineState) {
        let inner = self.inner.lock().await;
        (
            inner.workflows.values().cloned().collect(),
            inner.running.values().cloned().collect(),
            inner.kanban.clone(),
        )
    }

    pub(crate) async fn import_workflow_if_absent(&self, state: WorkflowState) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.workflows.contains_key(&state.workflow_id) {
            false
        } else {
            inner.workflows.insert(state.workflow_id, state);
            true
        }
    }

    pub(crate) async fn import_running_if_absent(&self, record: RunningWorkflowRecord) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.running.contains_key(&record.workflow_id) {
            false
        } else {
            inner.running.insert(record.workflow_id, record);
            true
        }
    }

    /// Unconditionally inserts, returning whether a prior row was replaced.
    pub(crate) async fn import_workflow_overwrite(&self, state: WorkflowState) -> bool {
        let mut inner = self.inner.lock().await;
        inner.workflows.insert(state.workflow_id, state).is_some()
    }

    /// Unconditionally inserts, returning whether a prior row was replaced.
    pub(crate) async fn import_running_overwrite(&self, record: RunningWorkflowRecord) -> bool {
        let mut inner = self.inner.lock().await;
        inner.running.insert(record.workflow_id, record).is_some()
    }

    pub(crate) async fn overwrite_kanban(&self, state: KanbanEngineState) {
        self.inner.lock().await.kanban = state;
    }
}

struct InnerCtx<'a> {
    inner: &'a mut Inner,
}

impl AtomicCtx for InnerCtx<'_> {
    fn is_workflow_running(&self, id: &WorkflowId) -> bool {
        self.inner.running.contains_key(id)
    }

    fn set_workflow_running(&mut self, record: RunningWorkflowRecord) {
        self.inner.running.insert(record.workflow_id, record);
    }

    fn load_by_id(&self, id: &WorkflowId) -> Option<WorkflowState> {
        self.inner.workflows.get(id).cloned()
    }

    fn save(&mut self, state: WorkflowState) {
        self.inner.workflows.insert(state.workflow_id, state);
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn load_by_id(&self, id: &WorkflowId) -> Result<Option<WorkflowState>, StorageError> {
        Ok(self.inner.lock().await.workflows.get(id).cloned())
    }

    async fn save(&self, state: WorkflowState) -> Result<(), StorageError> {
        self.inner.lock().await.workflows.insert(state.workflow_id, state);
        Ok(())
    }

    async fn execute_atomically(
        &self,
        f: Box<dyn FnOnce(&mut dyn AtomicCtx) -> Result<(), StorageError> + Send + '_>,
    ) -> Result<(), StorageError> {
        let mut guard = self.inner.lock().await;
        let mut ctx = InnerCtx { inner: &mut guard };
        f(&mut ctx)
    }

    async fn is_workflow_running(&self, id: &WorkflowId) -> Result<bool, StorageError> {
        Ok(self.inner.lock().await.running.contains_key(id))
    }

    async fn clear_workflow_running(&self, id: &WorkflowId) -> Result<(), StorageError> {
        self.inner.lock().await.running.shift_remove(id);
        Ok(())
    }

    async fn list_running_workflows(&self) -> Result<Vec<RunningWorkflowRecord>, StorageError> {
        Ok(self.inner.lock().await.running.values().cloned().collect())
    }
}

#[async_trait]
impl KanbanStore for InMemoryStore {
    async fn load_kanban_state(&self) -> Result<KanbanEngineState, StorageError> {
        Ok(self.inner.lock().await.kanban.clone())
    }

    async fn save_kanban_state(&self, state: &KanbanEngineState) -> Result<(), StorageError> {
        self.inner.lock().await.kanban = state.clone();
        Ok(())
    }

    async fn next_queued_workflow(&self) -> Result<Option<WorkflowId>, StorageError> {
        let inner = self.inner.lock().await;
        let mut candidates: Vec<&WorkflowState> =
            inner.workflows.values().filter(|w| w.kanban_column == KanbanColumn::Todo).collect();
        candidates.sort_by(|a, b| a.kanban_position.cmp(&b.kanban_position).then(a.updated_at.cmp(&b.updated_at)));
        Ok(candidates.first().map(|w| w.workflow_id))
    }

    async fn board(&self) -> Result<BTreeMap<KanbanColumn, Vec<WorkflowId>>, StorageError> {
        let inner = self.inner.lock().await;
        let mut board: BTreeMap<KanbanColumn, Vec<(u32, WorkflowId)>> = BTreeMap::new();
        for w in inner.workflows.values() {
            board.entry(w.kanban_column).or_default().push((w.kanban_position, w.workflow_id));
        }
        let mut result = BTreeMap::new();
        for (column, mut entries) in board {
            entries.sort_by_key(|(position, _)| *position);
            result.insert(column, entries.into_iter().map(|(_, id)| id).collect());
        }
        Ok(result)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
