// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workflow liveness beacon (spec.md S4.3).

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use quorum_core::{Clock, WorkflowId};
use quorum_storage::WorkflowStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

struct Tracked {
    last_beat_at: DateTime<Utc>,
    ticker: JoinHandle<()>,
}

/// Maintains WorkflowID -> `{last_beat_at, ticker}`. A beat-write failure is
/// logged, never raised: the manager must keep ticking for every other
/// workflow regardless of one backend hiccup.
pub struct HeartbeatManager<C: Clock> {
    tracked: Arc<RwLock<HashMap<WorkflowId, Tracked>>>,
    clock: C,
    interval: Duration,
    stale_threshold: Duration,
}

impl<C: Clock + 'static> HeartbeatManager<C> {
    pub fn new(clock: C, interval: Duration, stale_threshold: Duration) -> Self {
        Self { tracked: Arc::new(RwLock::new(HashMap::new())), clock, interval, stale_threshold }
    }

    /// Begin a periodic ticker that updates `last_beat_at` and persists it
    /// to the state store every `interval`. Starting an id already tracked
    /// stops the previous ticker first.
    pub fn start(&self, id: WorkflowId, store: Arc<dyn WorkflowStore>) {
        self.stop(id);

        let now = self.clock.now_utc();
        let tracked = self.tracked.clone();
        let interval = self.interval;
        let clock = self.clock.clone();

        let ticker = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.tick().await; // first tick fires immediately; skip it, we just beat above
            loop {
                tick.tick().await;
                let now = clock.now_utc();
                {
                    let mut guard = tracked.write();
                    let Some(entry) = guard.get_mut(&id) else { break };
                    entry.last_beat_at = now;
                }
                if let Some(current) = store.load_by_id(&id).await.ok().flatten() {
                    let mut updated = current;
                    updated.heartbeat_at = Some(now);
                    if let Err(e) = store.save(updated).await {
                        warn!(workflow_id = %id, error = %e, "heartbeat write failed");
                    }
                }
            }
        });

        self.tracked.write().insert(id, Tracked { last_beat_at: now, ticker });
    }

    /// Idempotent: stopping an untracked id is a no-op.
    pub fn stop(&self, id: WorkflowId) {
        if let Some(entry) = self.tracked.write().remove(&id) {
            entry.ticker.abort();
        }
    }

    pub fn is_healthy(&self, id: WorkflowId) -> bool {
        match self.tracked.read().get(&id) {
            Some(entry) => self.clock.now_utc().signed_duration_since(entry.last_beat_at).to_std().unwrap_or_default()
                < self.stale_threshold,
            None => false,
        }
    }

    pub fn is_tracking(&self, id: WorkflowId) -> bool {
        self.tracked.read().contains_key(&id)
    }

    pub fn last_beat_at(&self, id: WorkflowId) -> Option<DateTime<Utc>> {
        self.tracked.read().get(&id).map(|e| e.last_beat_at)
    }

    /// Stop every ticker.
    pub fn shutdown(&self) {
        let mut guard = self.tracked.write();
        for (_, entry) in guard.drain() {
            entry.ticker.abort();
        }
    }
}

impl<C: Clock> Drop for HeartbeatManager<C> {
    fn drop(&mut self) {
        for (_, entry) in self.tracked.write().drain() {
            entry.ticker.abort();
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
