// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! quorum-engine: the execution core built on quorum-core/quorum-storage.
//!
//! Owns everything spec.md S4 calls out: the event bus, per-execution
//! control plane, heartbeat manager, unified tracker, project context
//! pool, Kanban engine, and runner factory. Orphaned from any CLI/HTTP
//! surface: those are external collaborators (spec.md S6), not this crate.

pub mod control_plane;
pub mod error;
pub mod event_bus;
pub mod handle;
pub mod heartbeat;
pub mod kanban;
pub mod orphan;
pub mod project_context;
pub mod runner;
pub mod tracker;

pub use control_plane::{CancelLatch, ControlPlane};
pub use error::{EngineError, KanbanError, PoolError, RunnerFactoryError};
pub use event_bus::{EventBus, Subscription};
pub use handle::{ConfirmOutcome, ExecutionHandle};
pub use heartbeat::HeartbeatManager;
pub use kanban::{KanbanEngine, StepOutcome};
pub use project_context::{
    ConfigLoader, CustomConfigLoader, EffectiveConfig, GlobalConfigLoader, ProjectContext,
    ProjectContextPool, ProjectRegistry, StoreFactory, effective_config_loader, effective_event_bus,
    effective_root, effective_state_manager,
};
pub use runner::{Agent, AgentRegistry, OutputNotifier, RunnerAssembly, RunnerFactory, WorkflowRunner};
pub use tracker::UnifiedTracker;
