// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tracker scenarios (spec.md S8 S1-S5) and the properties that
//! don't have a natural home in the Kanban/pool/bus suites, driven entirely
//! through `quorum-engine`'s public API against a real `InMemoryStore`.

use quorum_core::{CheckpointKind, FakeClock, WorkflowState, WorkflowStatus};
use quorum_engine::{ConfirmOutcome, UnifiedTracker};
use quorum_storage::{AtomicCtx, InMemoryStore, WorkflowStore};
use std::sync::Arc;
use std::time::Duration;

fn tracker() -> (UnifiedTracker<FakeClock>, Arc<InMemoryStore>, FakeClock) {
    let store = Arc::new(InMemoryStore::new());
    let clock = FakeClock::new();
    let tracker = UnifiedTracker::new(
        store.clone(),
        clock.clone(),
        Duration::from_millis(10),
        Duration::from_millis(100),
        Duration::from_millis(200),
    );
    (tracker, store, clock)
}

/// S1: happy path start -> confirm -> finish.
#[tokio::test(start_paused = true)]
async fn s1_happy_path() {
    let (tracker, store, _clock) = tracker();
    let wf = WorkflowState::builder().build();
    let id = wf.workflow_id;
    store.save(wf).await.unwrap();

    let handle = tracker.start_execution(id).await.unwrap();
    assert!(store.is_workflow_running(&id).await.unwrap());
    assert!(tracker.is_running(id).await.unwrap());

    handle.confirm_started();
    assert!(tracker.wait_for_confirmation(id).await.unwrap().is_ok());

    tracker.finish_execution(id).await;
    assert!(!store.is_workflow_running(&id).await.unwrap());
    assert!(!tracker.is_running_in_memory(id));

    let mut state = store.load_by_id(&id).await.unwrap().unwrap();
    state.status = WorkflowStatus::Completed;
    store.save(state).await.unwrap();
    assert_eq!(store.load_by_id(&id).await.unwrap().unwrap().status, WorkflowStatus::Completed);
}

/// S2: of two concurrent starts, exactly one wins and durable/memory agree.
#[tokio::test(start_paused = true)]
async fn s2_double_start_race() {
    let (tracker, store, _clock) = tracker();
    let wf = WorkflowState::builder().build();
    let id = wf.workflow_id;
    store.save(wf).await.unwrap();

    let first = tracker.start_execution(id).await;
    let second = tracker.start_execution(id).await;
    assert!(first.is_ok());
    assert!(second.is_err());

    assert!(tracker.is_running_in_memory(id));
    assert!(store.is_workflow_running(&id).await.unwrap());
}

/// S3: a stale durable row with a dead pid is reclaimed as an orphan, after
/// which the workflow can be started again.
#[tokio::test(start_paused = true)]
async fn s3_crash_recovery_reclaims_a_dead_pid_orphan() {
    let (tracker, store, clock) = tracker();
    let wf = WorkflowState::builder().status(WorkflowStatus::Running).build();
    let id = wf.workflow_id;
    store.save(wf).await.unwrap();
    store
        .execute_atomically(Box::new(move |ctx| {
            ctx.set_workflow_running(quorum_core::RunningWorkflowRecord {
                workflow_id: id,
                lock_holder_host: "localhost".to_string(),
                lock_holder_pid: 4_194_304,
                acquired_at: clock.now_utc(),
                last_heartbeat_at: clock.now_utc(),
            });
            Ok(())
        }))
        .await
        .unwrap();

    let cleaned = tracker.cleanup_orphaned_workflows().await.unwrap();
    assert_eq!(cleaned, vec![id]);

    let state = store.load_by_id(&id).await.unwrap().unwrap();
    assert_eq!(state.status, WorkflowStatus::Failed);
    assert!(state.checkpoints.iter().any(|c| c.kind == CheckpointKind::Orphaned));
    assert!(!store.is_workflow_running(&id).await.unwrap());

    tracker.start_execution(id).await.unwrap();
}

/// S4: pause keeps the heartbeat healthy; cancel surfaces as a failure, not
/// an orphan.
#[tokio::test(start_paused = true)]
async fn s4_pause_resume_cancel() {
    let (tracker, store, _clock) = tracker();
    let wf = WorkflowState::builder().build();
    let id = wf.workflow_id;
    store.save(wf).await.unwrap();

    let handle = tracker.start_execution(id).await.unwrap();
    tracker.pause(id).unwrap();
    assert!(handle.control_plane.is_paused());
    assert!(tracker.is_running(id).await.unwrap());

    tracker.resume(id).unwrap();
    assert!(!handle.control_plane.is_paused());

    tracker.cancel(id).unwrap();
    assert!(handle.control_plane.is_cancelled());

    handle.report_error("cancelled by operator").await;
    let confirm = tracker.wait_for_confirmation(id).await.unwrap();
    assert!(matches!(confirm, Err(ConfirmOutcome::Errored(_))));

    tracker.rollback_execution(id, "cancelled by operator").await.unwrap();
    let state = store.load_by_id(&id).await.unwrap().unwrap();
    assert_eq!(state.status, WorkflowStatus::Failed);
    assert_eq!(state.error.as_deref(), Some("cancelled by operator"));
}

/// S5: force-stop a durable row with no live handle, then restart cleanly.
#[tokio::test(start_paused = true)]
async fn s5_force_stop_then_restart() {
    let (tracker, store, clock) = tracker();
    let wf = WorkflowState::builder().status(WorkflowStatus::Running).build();
    let id = wf.workflow_id;
    store.save(wf).await.unwrap();
    store
        .execute_atomically(Box::new(move |ctx| {
            ctx.set_workflow_running(quorum_core::RunningWorkflowRecord {
                workflow_id: id,
                lock_holder_host: "localhost".to_string(),
                lock_holder_pid: std::process::id() as i32,
                acquired_at: clock.now_utc(),
                last_heartbeat_at: clock.now_utc(),
            });
            Ok(())
        }))
        .await
        .unwrap();

    tracker.force_stop(id).await.unwrap();
    let state = store.load_by_id(&id).await.unwrap().unwrap();
    assert_eq!(state.status, WorkflowStatus::Failed);
    assert!(state.checkpoints.iter().any(|c| c.kind == CheckpointKind::ForceStop));
    assert!(!store.is_workflow_running(&id).await.unwrap());

    tracker.start_execution(id).await.unwrap();
}

/// Property 8: a running-set row on a remote host is never cleared by this
/// process's orphan sweep.
#[tokio::test(start_paused = true)]
async fn property_orphan_detector_never_clears_a_remote_host_row() {
    let (tracker, store, clock) = tracker();
    let wf = WorkflowState::builder().status(WorkflowStatus::Running).build();
    let id = wf.workflow_id;
    store.save(wf).await.unwrap();
    store
        .execute_atomically(Box::new(move |ctx| {
            ctx.set_workflow_running(quorum_core::RunningWorkflowRecord {
                workflow_id: id,
                lock_holder_host: "some-other-machine.internal".to_string(),
                lock_holder_pid: 1,
                acquired_at: clock.now_utc(),
                last_heartbeat_at: clock.now_utc(),
            });
            Ok(())
        }))
        .await
        .unwrap();

    let cleaned = tracker.cleanup_orphaned_workflows().await.unwrap();
    assert!(cleaned.is_empty());
    assert!(store.is_workflow_running(&id).await.unwrap());
}

/// Property 7 (DAG guard): a cyclic task dependency is rejected and the
/// task map is left untouched.
#[test]
fn property_dag_guard_rejects_cycles_and_leaves_state_unchanged() {
    use quorum_core::{TaskId, TaskState};

    let mut state = WorkflowState::builder().build();
    let a = TaskId::new();
    let b = TaskId::new();
    state.upsert_task(TaskState::new(a, "a")).unwrap();
    let mut b_task = TaskState::new(b, "b");
    b_task.depends_on = vec![a];
    state.upsert_task(b_task).unwrap();

    let mut a_depends_on_b = TaskState::new(a, "a");
    a_depends_on_b.depends_on = vec![b];
    let before = state.tasks().clone();
    let err = state.upsert_task(a_depends_on_b);
    assert!(err.is_err());
    assert_eq!(&before, state.tasks());
    assert!(state.task_invariant_holds());
}
