// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S6 (Kanban breaker) and property 9, driven through `quorum-engine`'s
//! public API end to end.

use quorum_core::{FakeClock, KanbanColumn, ProjectId, WorkflowState, WorkflowStateBuilder, WorkflowStatus};
use quorum_engine::runner::test_support::{EmptyAgentRegistry, RunnerOutcome, ScriptedRunner};
use quorum_engine::{EventBus, GlobalConfigLoader, KanbanEngine, RunnerFactory, StepOutcome, UnifiedTracker, WorkflowRunner};
use quorum_storage::{InMemoryStore, WorkflowStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn engine(
    store: Arc<InMemoryStore>,
    threshold: u32,
    outcome: RunnerOutcome,
) -> Arc<KanbanEngine<FakeClock>> {
    let clock = FakeClock::new();
    let tracker = Arc::new(UnifiedTracker::new(
        store.clone(),
        clock.clone(),
        Duration::from_secs(10),
        Duration::from_secs(60),
        Duration::from_secs(5),
    ));
    let runner_factory = Arc::new(RunnerFactory::new(
        Some(Arc::new(EmptyAgentRegistry)),
        Arc::new(move |_assembly| Arc::new(ScriptedRunner::new(outcome.clone())) as Arc<dyn WorkflowRunner>),
    ));
    let config_loader = Arc::new(GlobalConfigLoader::new(PathBuf::from("/nonexistent.yaml")));
    Arc::new(KanbanEngine::new(
        ProjectId::new(),
        store.clone(),
        store,
        tracker,
        runner_factory,
        config_loader,
        EventBus::new(),
        clock,
        Duration::from_millis(1),
        threshold,
        false,
    ))
}

fn seed(position: u32) -> WorkflowState {
    let mut state = WorkflowStateBuilder::default().status(WorkflowStatus::Pending).kanban_column(KanbanColumn::Todo).build();
    state.kanban_position = position;
    state
}

/// S6 + property 9: three consecutive failures trip the breaker, which
/// stays open (no more pulls from `todo`) until reset.
#[tokio::test]
async fn s6_breaker_trips_after_threshold_and_resets() {
    let store = Arc::new(InMemoryStore::new());
    let kanban = engine(store.clone(), 3, RunnerOutcome::Failure("boom".to_string()));

    let mut fed = Vec::new();
    for i in 0..3 {
        let state = seed(i);
        fed.push(state.workflow_id);
        store.save(state).await.unwrap();
        assert!(matches!(kanban.run_once().await.unwrap(), StepOutcome::Ran(_)));
    }

    let still_queued = seed(99);
    let queued_id = still_queued.workflow_id;
    store.save(still_queued).await.unwrap();
    assert_eq!(kanban.run_once().await.unwrap(), StepOutcome::BreakerOpen);

    // The fourth workflow was never pulled while the breaker is open.
    let state = store.load_by_id(&queued_id).await.unwrap().unwrap();
    assert_eq!(state.kanban_column, KanbanColumn::Todo);

    kanban.reset_circuit_breaker().await.unwrap();
    assert!(matches!(kanban.run_once().await.unwrap(), StepOutcome::Ran(id) if id == queued_id));
}
