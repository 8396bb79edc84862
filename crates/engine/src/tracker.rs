// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unified execution tracker (spec.md S4.4): the only place that moves a
//! workflow into or out of the running state.

use crate::error::EngineError;
use crate::handle::{ConfirmOutcome, ExecutionHandle};
use crate::heartbeat::HeartbeatManager;
use crate::orphan::{is_local_host, process_exists};
use parking_lot::{Mutex, RwLock};
use quorum_core::{CheckpointKind, Clock, RunningWorkflowRecord, WorkflowId, WorkflowStatus};
use quorum_storage::{StorageError, WorkflowStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// `WorkflowID -> ExecutionHandle`, guarded by a reader-writer lock (spec.md
/// S5 "shared-resource policy"): reads take the read side, writes the write
/// side. Cooperates with the durable running-set via the store's
/// `execute_atomically` primitive.
pub struct UnifiedTracker<C: Clock> {
    handles: RwLock<HashMap<WorkflowId, Arc<ExecutionHandle>>>,
    store: Arc<dyn WorkflowStore>,
    heartbeats: Arc<HeartbeatManager<C>>,
    clock: C,
    local_host: String,
    local_pid: i32,
    confirm_timeout: Duration,
}

impl<C: Clock + 'static> UnifiedTracker<C> {
    pub fn new(store: Arc<dyn WorkflowStore>, clock: C, heartbeat_interval: Duration, stale_threshold: Duration, confirm_timeout: Duration) -> Self {
        let local_host = nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());
        Self {
            handles: RwLock::new(HashMap::new()),
            store,
            heartbeats: Arc::new(HeartbeatManager::new(clock.clone(), heartbeat_interval, stale_threshold)),
            clock,
            local_host,
            local_pid: std::process::id() as i32,
            confirm_timeout,
        }
    }

    /// Convenience constructor reading the heartbeat/stale/confirm intervals
    /// from the environment (spec.md S7's configuration surface; see
    /// `quorum_core::env`) instead of requiring the caller to thread them
    /// through explicitly.
    pub fn from_env(store: Arc<dyn WorkflowStore>, clock: C) -> Self {
        Self::new(
            store,
            clock,
            quorum_core::env::heartbeat_interval(),
            quorum_core::env::stale_threshold(),
            quorum_core::env::confirm_timeout(),
        )
    }

    /// spec.md S4.4.1.
    pub async fn start_execution(&self, id: WorkflowId) -> Result<Arc<ExecutionHandle>, EngineError> {
        if self.handles.read().contains_key(&id) {
            return Err(EngineError::AlreadyRunningInMemory(id));
        }

        let now = self.clock.now_utc();
        let local_host = self.local_host.clone();
        let local_pid = self.local_pid;
        let outcome: Arc<Mutex<Option<EngineError>>> = Arc::new(Mutex::new(None));
        let outcome_inner = outcome.clone();

        let txn = self
            .store
            .execute_atomically(Box::new(move |ctx| {
                if ctx.is_workflow_running(&id) {
                    *outcome_inner.lock() = Some(EngineError::AlreadyRunningInDatabase(id));
                    return Err(StorageError::ServiceUnavailable("already_running_in_database"));
                }
                let Some(mut state) = ctx.load_by_id(&id) else {
                    *outcome_inner.lock() = Some(EngineError::WorkflowNotFound(id));
                    return Err(StorageError::NotFound(id));
                };
                ctx.set_workflow_running(RunningWorkflowRecord {
                    workflow_id: id,
                    lock_holder_host: local_host.clone(),
                    lock_holder_pid: local_pid,
                    acquired_at: now,
                    last_heartbeat_at: now,
                });
                state.status = WorkflowStatus::Running;
                state.error = None;
                state.updated_at = now;
                state.heartbeat_at = Some(now);
                ctx.save(state);
                Ok(())
            }))
            .await;

        if let Err(storage_err) = txn {
            return Err(outcome.lock().take().unwrap_or_else(|| EngineError::Storage(storage_err)));
        }

        let handle = Arc::new(ExecutionHandle::new(id, now));
        self.handles.write().insert(id, handle.clone());
        self.heartbeats.start(id, self.store.clone());
        Ok(handle)
    }

    /// spec.md S4.4.2: blocks on `confirm`, short-circuits on `error`, times
    /// out after `confirm_timeout`.
    pub async fn wait_for_confirmation(&self, id: WorkflowId) -> Result<Result<(), ConfirmOutcome>, EngineError> {
        let handle = self.get_handle(id).ok_or(EngineError::NotRunning(id))?;
        Ok(handle.wait_for_confirmation(self.confirm_timeout).await)
    }

    /// spec.md S4.4.2: undo a `StartExecution` whose confirmation failed.
    pub async fn rollback_execution(&self, id: WorkflowId, reason: impl Into<String>) -> Result<(), EngineError> {
        let reason = reason.into();
        self.handles.write().remove(&id);
        self.heartbeats.stop(id);

        if let Err(e) = self.store.clear_workflow_running(&id).await {
            warn!(workflow_id = %id, error = %e, "rollback: failed to clear running-set row");
        }

        let now = self.clock.now_utc();
        if let Some(mut state) = self.store.load_by_id(&id).await? {
            state.status = WorkflowStatus::Failed;
            state.error = Some(reason);
            state.updated_at = now;
            self.store.save(state).await?;
        }
        Ok(())
    }

    /// spec.md S4.4.3. Idempotent: finishing an untracked id is a no-op.
    pub async fn finish_execution(&self, id: WorkflowId) {
        if let Some(handle) = self.handles.write().remove(&id) {
            handle.mark_done();
        }
        self.heartbeats.stop(id);
        if let Err(e) = self.store.clear_workflow_running(&id).await {
            warn!(workflow_id = %id, error = %e, "finish: failed to clear running-set row");
        }
    }

    /// spec.md S4.4.4.
    pub fn cancel(&self, id: WorkflowId) -> Result<(), EngineError> {
        let handle = self.get_handle(id).ok_or(EngineError::NotRunning(id))?;
        handle.control_plane.cancel();
        handle.fire_cancel();
        Ok(())
    }

    pub fn pause(&self, id: WorkflowId) -> Result<(), EngineError> {
        let handle = self.get_handle(id).ok_or(EngineError::NotRunning(id))?;
        if handle.control_plane.is_paused() {
            return Err(EngineError::AlreadyPaused(id));
        }
        handle.control_plane.pause();
        Ok(())
    }

    pub fn resume(&self, id: WorkflowId) -> Result<(), EngineError> {
        let handle = self.get_handle(id).ok_or(EngineError::NotRunning(id))?;
        handle.control_plane.resume()
    }

    /// spec.md S4.4.5.
    pub async fn is_running(&self, id: WorkflowId) -> Result<bool, EngineError> {
        if self.get_handle(id).is_some() {
            let heartbeat_absent = !self.heartbeats.is_tracking(id);
            return Ok(heartbeat_absent || self.heartbeats.is_healthy(id));
        }
        Ok(self.store.is_workflow_running(&id).await?)
    }

    pub fn is_running_in_memory(&self, id: WorkflowId) -> bool {
        self.handles.read().contains_key(&id)
    }

    pub fn get_handle(&self, id: WorkflowId) -> Option<Arc<ExecutionHandle>> {
        self.handles.read().get(&id).cloned()
    }

    pub fn list_running_in_memory(&self) -> Vec<WorkflowId> {
        self.handles.read().keys().copied().collect()
    }

    /// spec.md S4.4.6. Returns the ids that were cleaned up this pass.
    pub async fn cleanup_orphaned_workflows(&self) -> Result<Vec<WorkflowId>, EngineError> {
        let mut cleaned = Vec::new();
        let mut remote_skips = 0u32;

        for record in self.store.list_running_workflows().await? {
            if self.is_running_in_memory(record.workflow_id) {
                continue;
            }
            if !is_local_host(&record.lock_holder_host) {
                remote_skips += 1;
                continue;
            }
            let provable_orphan =
                !process_exists(record.lock_holder_pid) || record.lock_holder_pid == self.local_pid;
            if !provable_orphan {
                continue;
            }
            self.mark_orphaned(record.workflow_id).await?;
            cleaned.push(record.workflow_id);
        }

        // Finished-but-uncleaned: a handle whose task signaled `done` on a
        // panic path without ever going through `finish_execution`.
        let stale_handles: Vec<WorkflowId> =
            self.handles.read().iter().filter(|(_, h)| h.is_done()).map(|(id, _)| *id).collect();
        let zombies = stale_handles.len();
        for id in stale_handles {
            self.finish_execution(id).await;
            cleaned.push(id);
        }

        if !cleaned.is_empty() || remote_skips > 0 {
            tracing::info!(
                orphans_cleared = cleaned.len() - zombies,
                zombies_cleared = zombies,
                remote_host_skips = remote_skips,
                "reconciled orphaned workflow executions"
            );
        }

        Ok(cleaned)
    }

    async fn mark_orphaned(&self, id: WorkflowId) -> Result<(), EngineError> {
        self.store.clear_workflow_running(&id).await?;
        let now = self.clock.now_utc();
        if let Some(mut state) = self.store.load_by_id(&id).await? {
            state.status = WorkflowStatus::Failed;
            state.error = Some("Orphaned workflow (server restarted during execution)".to_string());
            state.push_checkpoint(CheckpointKind::Orphaned, "orphan reconciliation", now);
            state.updated_at = now;
            self.store.save(state).await?;
        }
        Ok(())
    }

    /// spec.md S4.4.7: operator override for a workflow believed running.
    pub async fn force_stop(&self, id: WorkflowId) -> Result<(), EngineError> {
        if let Some(handle) = self.handles.write().remove(&id) {
            handle.control_plane.cancel();
            handle.fire_cancel();
            self.heartbeats.stop(id);
        }

        if let Err(e) = self.store.clear_workflow_running(&id).await {
            warn!(workflow_id = %id, error = %e, "force-stop: failed to clear running-set row");
        }

        let now = self.clock.now_utc();
        self.store
            .execute_atomically(Box::new(move |ctx| {
                if let Some(mut state) = ctx.load_by_id(&id) {
                    if state.status == WorkflowStatus::Running {
                        state.status = WorkflowStatus::Failed;
                        state.error = Some("Workflow forcibly stopped (orphaned after server restart)".to_string());
                        state.push_checkpoint(CheckpointKind::ForceStop, "force stop", now);
                        state.updated_at = now;
                        ctx.save(state);
                    }
                }
                Ok(())
            }))
            .await?;
        Ok(())
    }

    /// spec.md S4.4.8: no state-store writes; durable rows are reconciled as
    /// orphans on the next start.
    pub fn shutdown(&self) {
        let drained: Vec<(WorkflowId, Arc<ExecutionHandle>)> = self.handles.write().drain().collect();
        for (id, handle) in drained {
            handle.mark_done();
            self.heartbeats.stop(id);
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
