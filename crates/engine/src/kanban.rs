// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Kanban Engine: a single-worker board scheduler with a circuit
//! breaker (spec.md S4.6).

use crate::error::{EngineError, KanbanError};
use crate::event_bus::EventBus;
use crate::project_context::ConfigLoader;
use crate::runner::RunnerFactory;
use crate::tracker::UnifiedTracker;
use parking_lot::Mutex as SyncMutex;
use quorum_core::{Clock, Event, KanbanColumn, ProjectId, WorkflowId};
use quorum_storage::{KanbanStore, WorkflowStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Result of one scheduler iteration, surfaced mainly for tests; the
/// background loop only cares whether to keep going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Ran(WorkflowId),
    Idle,
    BreakerOpen,
}

enum DelegateOutcome {
    Success,
    Failure(String),
    Cancelled,
}

/// Drives workflows through `refinement -> todo -> in_progress -> to_verify
/// -> done`. `auto_verify` is a supplemented knob (not in the distilled
/// spec): when set, a successful run lands directly in `done` instead of
/// `to_verify`.
pub struct KanbanEngine<C: Clock> {
    project_id: ProjectId,
    workflow_store: Arc<dyn WorkflowStore>,
    kanban_store: Arc<dyn KanbanStore>,
    tracker: Arc<UnifiedTracker<C>>,
    runner_factory: Arc<RunnerFactory>,
    config_loader: Arc<dyn ConfigLoader>,
    event_bus: EventBus,
    clock: C,
    poll_interval: Duration,
    failure_threshold: u32,
    auto_verify: bool,
    loop_task: SyncMutex<Option<JoinHandle<()>>>,
}

impl<C: Clock + 'static> KanbanEngine<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project_id: ProjectId,
        workflow_store: Arc<dyn WorkflowStore>,
        kanban_store: Arc<dyn KanbanStore>,
        tracker: Arc<UnifiedTracker<C>>,
        runner_factory: Arc<RunnerFactory>,
        config_loader: Arc<dyn ConfigLoader>,
        event_bus: EventBus,
        clock: C,
        poll_interval: Duration,
        failure_threshold: u32,
        auto_verify: bool,
    ) -> Self {
        Self {
            project_id,
            workflow_store,
            kanban_store,
            tracker,
            runner_factory,
            config_loader,
            event_bus,
            clock,
            poll_interval,
            failure_threshold,
            auto_verify,
            loop_task: SyncMutex::new(None),
        }
    }

    /// Convenience constructor reading the poll interval and failure
    /// threshold from the environment (spec.md S7's configuration surface;
    /// see `quorum_core::env`) instead of requiring the caller to pass them
    /// explicitly.
    #[allow(clippy::too_many_arguments)]
    pub fn from_env(
        project_id: ProjectId,
        workflow_store: Arc<dyn WorkflowStore>,
        kanban_store: Arc<dyn KanbanStore>,
        tracker: Arc<UnifiedTracker<C>>,
        runner_factory: Arc<RunnerFactory>,
        config_loader: Arc<dyn ConfigLoader>,
        event_bus: EventBus,
        clock: C,
        auto_verify: bool,
    ) -> Self {
        Self::new(
            project_id,
            workflow_store,
            kanban_store,
            tracker,
            runner_factory,
            config_loader,
            event_bus,
            clock,
            quorum_core::env::kanban_poll_interval(),
            quorum_core::env::kanban_failure_threshold(),
            auto_verify,
        )
    }

    /// Idempotent: enabling an already-enabled engine is a no-op.
    pub async fn enable(self: &Arc<Self>) -> Result<(), KanbanError> {
        let mut state = self.kanban_store.load_kanban_state().await?;
        if state.enabled {
            return Ok(());
        }
        state.enabled = true;
        self.kanban_store.save_kanban_state(&state).await?;
        self.spawn_loop();
        Ok(())
    }

    /// Idempotent: disabling an already-disabled engine is a no-op.
    pub async fn disable(&self) -> Result<(), KanbanError> {
        let mut state = self.kanban_store.load_kanban_state().await?;
        if !state.enabled {
            return Ok(());
        }
        state.enabled = false;
        self.kanban_store.save_kanban_state(&state).await?;
        self.stop_loop();
        Ok(())
    }

    /// Idempotent. Re-arms the breaker and, if the engine is enabled,
    /// restarts the loop the breaker had exited.
    pub async fn reset_circuit_breaker(self: &Arc<Self>) -> Result<(), KanbanError> {
        let mut state = self.kanban_store.load_kanban_state().await?;
        state.circuit_breaker_open = false;
        state.consecutive_failures = 0;
        state.last_failure_at = None;
        let enabled = state.enabled;
        self.kanban_store.save_kanban_state(&state).await?;
        if enabled && self.loop_task.lock().is_none() {
            self.spawn_loop();
        }
        Ok(())
    }

    fn spawn_loop(self: &Arc<Self>) {
        let mut guard = self.loop_task.lock();
        if guard.is_some() {
            return;
        }
        let engine = self.clone();
        *guard = Some(tokio::spawn(async move {
            loop {
                match engine.run_once().await {
                    Ok(StepOutcome::Ran(_)) => continue,
                    Ok(StepOutcome::Idle) => tokio::time::sleep(engine.poll_interval).await,
                    Ok(StepOutcome::BreakerOpen) => {
                        warn!(project_id = %engine.project_id, "kanban circuit breaker open, exiting loop");
                        break;
                    }
                    Err(e) => {
                        warn!(project_id = %engine.project_id, error = %e, "kanban loop iteration failed");
                        tokio::time::sleep(engine.poll_interval).await;
                    }
                }
            }
            // Clear the slot so a later reset/enable can spawn again; otherwise
            // this finished handle permanently blocks `spawn_loop`'s guard.
            engine.loop_task.lock().take();
        }));
    }

    fn stop_loop(&self) {
        if let Some(handle) = self.loop_task.lock().take() {
            handle.abort();
        }
    }

    pub fn shutdown(&self) {
        self.stop_loop();
    }

    /// One Pick/Move/Delegate/Classify/Clear pass (spec.md S4.6). Exposed
    /// directly so tests can drive the loop deterministically instead of
    /// racing a background task.
    pub async fn run_once(&self) -> Result<StepOutcome, KanbanError> {
        let state = self.kanban_store.load_kanban_state().await?;
        if state.circuit_breaker_open {
            return Ok(StepOutcome::BreakerOpen);
        }

        let Some(workflow_id) = self.kanban_store.next_queued_workflow().await? else {
            return Ok(StepOutcome::Idle);
        };

        self.move_column(workflow_id, KanbanColumn::InProgress, false).await?;

        let mut state = self.kanban_store.load_kanban_state().await?;
        state.current_workflow_id = Some(workflow_id);
        self.kanban_store.save_kanban_state(&state).await?;

        let outcome = self.delegate(workflow_id).await;

        let mut state = self.kanban_store.load_kanban_state().await?;
        state.current_workflow_id = None;
        match outcome {
            DelegateOutcome::Success => {
                let target = if self.auto_verify { KanbanColumn::Done } else { KanbanColumn::ToVerify };
                self.move_column(workflow_id, target, false).await?;
                state.consecutive_failures = 0;
            }
            DelegateOutcome::Failure(reason) => {
                self.record_failure(workflow_id, &reason).await?;
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.failure_threshold {
                    state.circuit_breaker_open = true;
                    state.last_failure_at = Some(self.clock.now_utc());
                    info!(project_id = %self.project_id, failures = state.consecutive_failures, "kanban breaker tripped");
                }
            }
            DelegateOutcome::Cancelled => {
                self.move_column(workflow_id, KanbanColumn::Todo, false).await?;
            }
        }
        self.kanban_store.save_kanban_state(&state).await?;
        Ok(StepOutcome::Ran(workflow_id))
    }

    async fn delegate(&self, workflow_id: WorkflowId) -> DelegateOutcome {
        let handle = match self.tracker.start_execution(workflow_id).await {
            Ok(handle) => handle,
            Err(e) => return DelegateOutcome::Failure(e.to_string()),
        };

        let assembled = self.runner_factory.build(
            workflow_id,
            self.project_id,
            handle.control_plane.clone(),
            self.event_bus.clone(),
            self.config_loader.as_ref(),
        );
        let (runner, output) = match assembled {
            Ok(pair) => pair,
            Err(e) => {
                let _ = self.tracker.rollback_execution(workflow_id, e.to_string()).await;
                return DelegateOutcome::Failure(e.to_string());
            }
        };

        handle.confirm_started();
        let result = runner.run(handle.control_plane.clone(), output).await;
        let cancelled = handle.control_plane.is_cancelled();
        handle.mark_done();
        self.tracker.finish_execution(workflow_id).await;

        match (result, cancelled) {
            (_, true) => DelegateOutcome::Cancelled,
            (Ok(()), false) => DelegateOutcome::Success,
            (Err(reason), false) => DelegateOutcome::Failure(reason),
        }
    }

    async fn record_failure(&self, workflow_id: WorkflowId, reason: &str) -> Result<(), KanbanError> {
        if let Some(mut state) = self.workflow_store.load_by_id(&workflow_id).await? {
            state.kanban_last_error = Some(reason.to_string());
            state.updated_at = self.clock.now_utc();
            self.workflow_store.save(state).await?;
        }
        Ok(())
    }

    /// Manual operator move. Rejected if `workflow_id` is the one currently
    /// executing (spec.md S4.6).
    pub async fn move_workflow(&self, workflow_id: WorkflowId, to: KanbanColumn) -> Result<(), KanbanError> {
        let state = self.kanban_store.load_kanban_state().await?;
        if state.current_workflow_id == Some(workflow_id) {
            return Err(EngineError::CurrentlyExecuting(workflow_id).into());
        }
        self.move_column(workflow_id, to, true).await
    }

    async fn move_column(&self, workflow_id: WorkflowId, to: KanbanColumn, manual: bool) -> Result<(), KanbanError> {
        let Some(mut state) = self.workflow_store.load_by_id(&workflow_id).await? else {
            return Ok(());
        };
        let from = state.kanban_column;
        let now = self.clock.now_utc();
        state.kanban_column = to;
        state.updated_at = now;
        if to == KanbanColumn::InProgress {
            state.kanban_started_at = Some(now);
        }
        if to == KanbanColumn::Done {
            state.kanban_completed_at = Some(now);
        }
        let position = state.kanban_position;
        self.workflow_store.save(state).await?;
        self.event_bus.publish(Event::KanbanWorkflowMoved {
            workflow_id,
            project_id: self.project_id,
            timestamp: now,
            from_column: from,
            to_column: to,
            position,
            manual,
        });
        Ok(())
    }

    /// Snapshot grouped by column, ordered by `kanban_position` (spec.md S4.6).
    pub async fn board(&self) -> Result<std::collections::BTreeMap<KanbanColumn, Vec<WorkflowId>>, KanbanError> {
        Ok(self.kanban_store.board().await?)
    }
}

#[cfg(test)]
#[path = "kanban_tests.rs"]
mod tests;
