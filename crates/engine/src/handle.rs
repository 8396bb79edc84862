// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory, non-durable execution handle (spec.md S3 `ExecutionHandle`).

use crate::control_plane::{CancelLatch, ControlPlane};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use quorum_core::WorkflowId;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};

/// Created inside `StartExecution`, inserted into the tracker's handle map,
/// then attached to by the spawned execution task. The three channels model
/// confirm/error/done without committing to a specific async runtime
/// (spec.md S9 "coroutines / async").
///
/// Shared by `Arc` between the tracker and the spawned execution task, so
/// the one-shot senders live behind a sync `Mutex` rather than requiring
/// `&mut self` to fire.
pub struct ExecutionHandle {
    pub workflow_id: WorkflowId,
    pub control_plane: ControlPlane,
    pub started_at: DateTime<Utc>,
    cancel_latch: CancelLatch,

    confirm_tx: Mutex<Option<oneshot::Sender<()>>>,
    confirm_rx: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,

    error_tx: mpsc::Sender<String>,
    error_rx: tokio::sync::Mutex<mpsc::Receiver<String>>,

    done_tx: Mutex<Option<oneshot::Sender<()>>>,
    done_rx: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    done_signaled: AtomicBool,
}

impl ExecutionHandle {
    pub fn new(workflow_id: WorkflowId, started_at: DateTime<Utc>) -> Self {
        let (confirm_tx, confirm_rx) = oneshot::channel();
        let (error_tx, error_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();
        Self {
            workflow_id,
            control_plane: ControlPlane::new(workflow_id),
            started_at,
            cancel_latch: CancelLatch::new(),
            confirm_tx: Mutex::new(Some(confirm_tx)),
            confirm_rx: tokio::sync::Mutex::new(Some(confirm_rx)),
            error_tx,
            error_rx: tokio::sync::Mutex::new(error_rx),
            done_tx: Mutex::new(Some(done_tx)),
            done_rx: tokio::sync::Mutex::new(Some(done_rx)),
            done_signaled: AtomicBool::new(false),
        }
    }

    /// Called by the spawned execution task once it has truly begun.
    pub fn confirm_started(&self) {
        if let Some(tx) = self.confirm_tx.lock().take() {
            let _ = tx.send(());
        }
    }

    /// Called by the spawned execution task if it fails before confirming.
    pub async fn report_error(&self, reason: impl Into<String>) {
        let _ = self.error_tx.send(reason.into()).await;
    }

    /// Called once on the terminal path, success or failure.
    pub fn mark_done(&self) {
        self.done_signaled.store(true, Ordering::SeqCst);
        if let Some(tx) = self.done_tx.lock().take() {
            let _ = tx.send(());
        }
    }

    /// True once `mark_done` has run, even if nothing is awaiting `done`.
    /// Used by orphan reconciliation to spot a handle whose task finished
    /// (panic-path) without `FinishExecution` ever clearing it.
    pub fn is_done(&self) -> bool {
        self.done_signaled.load(Ordering::SeqCst)
    }

    /// Block on confirmation, returning early on a reported error, timing
    /// out after `timeout` (spec.md S4.4.2, default 5s via `confirm_timeout`).
    pub async fn wait_for_confirmation(&self, timeout: std::time::Duration) -> Result<(), ConfirmOutcome> {
        let confirm_rx = self.confirm_rx.lock().await.take();
        let Some(confirm_rx) = confirm_rx else {
            return Ok(());
        };
        let mut error_rx = self.error_rx.lock().await;

        tokio::select! {
            result = confirm_rx => {
                result.map_err(|_| ConfirmOutcome::Errored("execution task dropped before confirming".into()))
            }
            Some(reason) = error_rx.recv() => {
                Err(ConfirmOutcome::Errored(reason))
            }
            _ = tokio::time::sleep(timeout) => {
                Err(ConfirmOutcome::TimedOut)
            }
        }
    }

    /// Set (or immediately fire) the task's context-cancel callback.
    pub fn set_exec_cancel(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.cancel_latch.attach(callback);
    }

    /// Fire the cancel callback if attached; otherwise arm the latch so a
    /// future `set_exec_cancel` fires immediately.
    pub fn fire_cancel(&self) {
        self.cancel_latch.arm();
    }

    pub async fn wait_for_done(&self) {
        let done_rx = self.done_rx.lock().await.take();
        if let Some(rx) = done_rx {
            let _ = rx.await;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Errored(String),
    TimedOut,
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
