// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution cooperative control signals (spec.md S4.2).
//!
//! `running -> paused -> running -> ... -> cancelled` is a small, monotone
//! state machine: cancel is terminal and idempotent from any non-cancelled
//! state; resume from a non-paused plane is a caller error, not a silent
//! no-op, so the request path can surface it.

use crate::error::EngineError;
use parking_lot::Mutex;
use quorum_core::WorkflowId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct State {
    paused: AtomicBool,
    cancelled: AtomicBool,
}

/// Cooperative signal set consumed by the runner at its yield points.
#[derive(Clone)]
pub struct ControlPlane {
    workflow_id: WorkflowId,
    state: Arc<State>,
    resume_notify: Arc<Notify>,
}

impl ControlPlane {
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self { workflow_id, state: Arc::new(State::default()), resume_notify: Arc::new(Notify::new()) }
    }

    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) -> Result<(), EngineError> {
        if !self.state.paused.swap(false, Ordering::SeqCst) {
            return Err(EngineError::NotPaused(self.workflow_id));
        }
        self.resume_notify.notify_waiters();
        Ok(())
    }

    /// Idempotent: cancelling an already-cancelled plane is a no-op success.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.resume_notify.notify_waiters();
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Cooperative yield point. Returns immediately if cancelled; blocks
    /// while paused (waking on resume or cancel); otherwise returns at once.
    pub async fn yield_point(&self) {
        loop {
            if self.is_cancelled() || !self.is_paused() {
                return;
            }
            self.resume_notify.notified().await;
        }
    }
}

/// Latch for a `cancel_exec` callback that may arrive after `Cancel` already
/// fired. If cancel was requested before attachment, attaching replays it
/// immediately (spec.md S9 "cyclic references").
#[derive(Clone, Default)]
pub struct CancelLatch {
    armed: Arc<AtomicBool>,
    callback: Arc<Mutex<Option<Arc<dyn Fn() + Send + Sync>>>>,
}

impl CancelLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the latch, firing `callback` immediately if already attached.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
        if let Some(cb) = self.callback.lock().as_ref() {
            cb();
        }
    }

    /// Attach the cancel callback. If the latch is already armed, fires
    /// immediately instead of waiting for a future `arm()`.
    pub fn attach(&self, callback: impl Fn() + Send + Sync + 'static) {
        let callback: Arc<dyn Fn() + Send + Sync> = Arc::new(callback);
        *self.callback.lock() = Some(callback.clone());
        if self.armed.load(Ordering::SeqCst) {
            callback();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "control_plane_tests.rs"]
mod tests;
