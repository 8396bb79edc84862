// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn confirm_started_unblocks_wait_for_confirmation() {
    let handle = ExecutionHandle::new(WorkflowId::new(), Utc::now());
    handle.confirm_started();
    let result = handle.wait_for_confirmation(Duration::from_millis(100)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn report_error_short_circuits_confirmation() {
    let handle = ExecutionHandle::new(WorkflowId::new(), Utc::now());
    handle.report_error("boom").await;
    let result = handle.wait_for_confirmation(Duration::from_millis(100)).await;
    assert_eq!(result.unwrap_err(), ConfirmOutcome::Errored("boom".into()));
}

#[tokio::test]
async fn wait_for_confirmation_times_out() {
    let handle = ExecutionHandle::new(WorkflowId::new(), Utc::now());
    let result = handle.wait_for_confirmation(Duration::from_millis(20)).await;
    assert_eq!(result.unwrap_err(), ConfirmOutcome::TimedOut);
}

#[tokio::test]
async fn mark_done_unblocks_wait_for_done() {
    let handle = ExecutionHandle::new(WorkflowId::new(), Utc::now());
    handle.mark_done();
    tokio::time::timeout(Duration::from_millis(100), handle.wait_for_done()).await.expect("should not block");
}

#[test]
fn is_done_reflects_mark_done() {
    let handle = ExecutionHandle::new(WorkflowId::new(), Utc::now());
    assert!(!handle.is_done());
    handle.mark_done();
    assert!(handle.is_done());
}

#[test]
fn set_exec_cancel_fires_immediately_when_armed_first() {
    let handle = ExecutionHandle::new(WorkflowId::new(), Utc::now());
    handle.fire_cancel();
    let fired = Arc::new(AtomicBool::new(false));
    let fired_clone = fired.clone();
    handle.set_exec_cancel(move || fired_clone.store(true, Ordering::SeqCst));
    assert!(fired.load(Ordering::SeqCst));
}

#[test]
fn fire_cancel_invokes_attached_callback() {
    let handle = ExecutionHandle::new(WorkflowId::new(), Utc::now());
    let fired = Arc::new(AtomicBool::new(false));
    let fired_clone = fired.clone();
    handle.set_exec_cancel(move || fired_clone.store(true, Ordering::SeqCst));
    assert!(!fired.load(Ordering::SeqCst));
    handle.fire_cancel();
    assert!(fired.load(Ordering::SeqCst));
}
