// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

fn plane() -> ControlPlane {
    ControlPlane::new(WorkflowId::new())
}

#[test]
fn fresh_plane_is_neither_paused_nor_cancelled() {
    let cp = plane();
    assert!(!cp.is_paused());
    assert!(!cp.is_cancelled());
}

#[test]
fn resume_without_pause_is_an_error() {
    let cp = plane();
    assert!(matches!(cp.resume(), Err(EngineError::NotPaused(_))));
}

#[test]
fn pause_then_resume_clears_pause() {
    let cp = plane();
    cp.pause();
    assert!(cp.is_paused());
    cp.resume().unwrap();
    assert!(!cp.is_paused());
}

#[test]
fn cancel_is_idempotent() {
    let cp = plane();
    cp.cancel();
    cp.cancel();
    assert!(cp.is_cancelled());
}

#[tokio::test]
async fn yield_point_returns_immediately_when_not_paused() {
    let cp = plane();
    tokio::time::timeout(Duration::from_millis(50), cp.yield_point()).await.expect("should not block");
}

#[tokio::test]
async fn yield_point_blocks_while_paused_and_wakes_on_resume() {
    let cp = plane();
    cp.pause();
    let waiter = cp.clone();
    let handle = tokio::spawn(async move {
        waiter.yield_point().await;
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());

    cp.resume().unwrap();
    tokio::time::timeout(Duration::from_millis(100), handle).await.expect("resume should wake yielder").unwrap();
}

#[tokio::test]
async fn yield_point_wakes_on_cancel_while_paused() {
    let cp = plane();
    cp.pause();
    let waiter = cp.clone();
    let handle = tokio::spawn(async move {
        waiter.yield_point().await;
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    cp.cancel();
    tokio::time::timeout(Duration::from_millis(100), handle).await.expect("cancel should wake yielder").unwrap();
}

#[test]
fn cancel_latch_replays_a_cancel_armed_before_attach() {
    let latch = CancelLatch::new();
    latch.arm();
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = fired.clone();
    latch.attach(move || {
        fired_clone.fetch_add(1, AtomicOrdering::SeqCst);
    });
    assert_eq!(fired.load(AtomicOrdering::SeqCst), 1);
}

#[test]
fn cancel_latch_fires_on_arm_when_already_attached() {
    let latch = CancelLatch::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = fired.clone();
    latch.attach(move || {
        fired_clone.fetch_add(1, AtomicOrdering::SeqCst);
    });
    assert_eq!(fired.load(AtomicOrdering::SeqCst), 0);
    latch.arm();
    assert_eq!(fired.load(AtomicOrdering::SeqCst), 1);
}
