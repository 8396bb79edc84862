// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed, multi-subscriber, non-blocking pub/sub for lifecycle events
//! (spec.md S4.1).
//!
//! Grounded in one bounded `mpsc` channel per subscriber rather than
//! `tokio::broadcast`: broadcast's lagged-receiver semantics drop from
//! *every* subscriber once any one of them falls behind, where spec.md
//! requires drops to be scoped to the single slow subscriber.

use parking_lot::Mutex;
use quorum_core::{Event, EventKind};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

struct Subscriber {
    id: u64,
    filter: Option<HashSet<EventKind>>,
    tx: mpsc::Sender<Event>,
}

#[derive(Default)]
struct Inner {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    closed: bool,
}

/// A live subscription: a finite stream of events plus a close handle.
/// Not restartable — once `unsubscribe` or `EventBus::close` runs, the
/// subscription is terminal (spec.md S4.1 "restart is not supported").
pub struct Subscription {
    id: u64,
    bus: EventBus,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn unsubscribe(self) {
        self.bus.remove_subscriber(self.id);
    }
}

/// Multi-subscriber event bus. Cheap to clone: all subscribers live behind
/// a shared `Arc<Mutex<..>>`.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all events, or only those whose [`EventKind`] is in `filter`.
    pub fn subscribe(&self, filter: Option<HashSet<EventKind>>) -> Subscription {
        self.subscribe_with_buffer(filter, DEFAULT_SUBSCRIBER_BUFFER)
    }

    pub fn subscribe_with_buffer(&self, filter: Option<HashSet<EventKind>>, buffer: usize) -> Subscription {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber { id, filter, tx });
        Subscription { id, bus: self.clone(), rx }
    }

    /// Deliver `event` to every matching subscriber. Never blocks: a full
    /// subscriber buffer drops the event for that subscriber only.
    pub fn publish(&self, event: Event) {
        let inner = self.inner.lock();
        if inner.closed {
            return;
        }
        let kind = event.kind();
        for sub in &inner.subscribers {
            if sub.filter.as_ref().is_some_and(|f| !f.contains(&kind)) {
                continue;
            }
            if sub.tx.try_send(event.clone()).is_err() {
                trace!(subscriber = sub.id, event = %kind, "event bus dropped event for slow subscriber");
            }
        }
    }

    /// Terminate every subscription. Subsequent `publish` calls are a no-op.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }

    fn remove_subscriber(&self, id: u64) {
        self.inner.lock().subscribers.retain(|s| s.id != id);
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
