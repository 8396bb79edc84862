// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus ordering and backpressure properties (spec.md S8 properties 5-6).

use quorum_core::{Event, FakeClock, Phase, ProjectId, WorkflowId};
use quorum_engine::EventBus;

fn phase_event(kind: &str, workflow_id: WorkflowId, project_id: ProjectId, clock: &FakeClock) -> Event {
    let timestamp = clock.now_utc();
    match kind {
        "started" => Event::PhaseStarted { workflow_id, project_id, timestamp, phase: Phase::Analyze },
        "completed" => Event::PhaseCompleted { workflow_id, project_id, timestamp, phase: Phase::Analyze, duration_ms: Some(5) },
        _ => unreachable!(),
    }
}

/// Property 5: a single producer's `phase_started` then `phase_completed`
/// is observed in that order by every non-filtered subscriber that doesn't
/// overflow.
#[tokio::test]
async fn property_event_ordering_is_preserved_per_producer() {
    let bus = EventBus::new();
    let clock = FakeClock::new();
    let workflow_id = WorkflowId::new();
    let project_id = ProjectId::new();

    let mut sub_a = bus.subscribe(None);
    let mut sub_b = bus.subscribe(None);

    bus.publish(phase_event("started", workflow_id, project_id, &clock));
    bus.publish(phase_event("completed", workflow_id, project_id, &clock));

    for sub in [&mut sub_a, &mut sub_b] {
        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert!(matches!(first, Event::PhaseStarted { .. }));
        assert!(matches!(second, Event::PhaseCompleted { .. }));
    }
}

/// Property 6: an undrained subscriber with a buffer of N sees at most N
/// events after N+k publishes; the bus itself never blocks on a slow
/// subscriber.
#[tokio::test]
async fn property_bus_drops_for_a_slow_subscriber_without_blocking_the_publisher() {
    let bus = EventBus::new();
    let clock = FakeClock::new();
    let workflow_id = WorkflowId::new();
    let project_id = ProjectId::new();

    const BUFFER: usize = 4;
    const EXTRA: usize = 3;
    let mut sub = bus.subscribe_with_buffer(None, BUFFER);

    for _ in 0..(BUFFER + EXTRA) {
        bus.publish(phase_event("started", workflow_id, project_id, &clock));
    }

    let mut received = 0;
    while tokio::time::timeout(std::time::Duration::from_millis(20), sub.recv()).await.ok().flatten().is_some() {
        received += 1;
    }
    assert!(received <= BUFFER, "expected at most {BUFFER} events, got {received}");
}
