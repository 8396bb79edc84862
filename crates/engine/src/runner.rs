// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner Factory and the runner/agent-registry contracts (spec.md S4.7, S6).
//!
//! The phase state machine itself is explicitly out of scope; this module
//! defines the seam (`WorkflowRunner`, `AgentRegistry`) the tracker's caller
//! plugs a real implementation into, plus a couple of test doubles.

use crate::control_plane::ControlPlane;
use crate::error::RunnerFactoryError;
use crate::event_bus::EventBus;
use crate::project_context::EffectiveConfig;
use async_trait::async_trait;
use quorum_core::{Phase, ProjectId, WorkflowId};
use std::sync::Arc;

/// An agent: opaque to this crate (concrete agents are out of scope).
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
}

/// Agent registry contract (spec.md S6).
pub trait AgentRegistry: Send + Sync {
    fn available(&self) -> Vec<String>;
    fn available_for_phase(&self, phase: Phase) -> Vec<String>;
    fn available_for_phase_with_config(&self, phase: Phase, config: &EffectiveConfig) -> Vec<String>;
    fn get(&self, name: &str) -> Option<Arc<dyn Agent>>;
    fn list_enabled(&self) -> Vec<String>;
    fn list_enabled_for_phase(&self, phase: Phase) -> Vec<String>;
}

/// Bridges runner-internal progress to the effective event bus, with the
/// workflow id pre-attached so the runner never has to carry it around.
#[derive(Clone)]
pub struct OutputNotifier {
    event_bus: EventBus,
    workflow_id: WorkflowId,
    project_id: ProjectId,
}

impl OutputNotifier {
    pub fn new(event_bus: EventBus, workflow_id: WorkflowId, project_id: ProjectId) -> Self {
        Self { event_bus, workflow_id, project_id }
    }

    pub fn publish(&self, event: quorum_core::Event) {
        debug_assert_eq!(event.workflow_id(), self.workflow_id);
        self.event_bus.publish(event);
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }
}

/// A pure callable honoring the control plane at cooperative yield points
/// (spec.md S4.7). The tracker's caller supplies the concrete
/// implementation; this crate never ships a real phase state machine.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    async fn run(&self, control_plane: ControlPlane, output: OutputNotifier) -> Result<(), String>;
}

/// Everything a runner needs, assembled by [`RunnerFactory::build`]
/// (spec.md S4.7 step 4).
pub struct RunnerAssembly {
    pub config: EffectiveConfig,
    pub output_notifier: OutputNotifier,
    pub control_plane: ControlPlane,
}

/// Validates collaborators, loads config, builds the output notifier, and
/// hands the assembled pieces to a caller-supplied builder closure.
pub struct RunnerFactory {
    agent_registry: Option<Arc<dyn AgentRegistry>>,
    builder: Arc<dyn Fn(RunnerAssembly) -> Arc<dyn WorkflowRunner> + Send + Sync>,
}

impl RunnerFactory {
    pub fn new(
        agent_registry: Option<Arc<dyn AgentRegistry>>,
        builder: Arc<dyn Fn(RunnerAssembly) -> Arc<dyn WorkflowRunner> + Send + Sync>,
    ) -> Self {
        Self { agent_registry, builder }
    }

    /// spec.md S4.7: validate collaborators, load config, build the output
    /// notifier, assemble the runner.
    pub fn build(
        &self,
        workflow_id: WorkflowId,
        project_id: ProjectId,
        control_plane: ControlPlane,
        event_bus: EventBus,
        config_loader: &dyn crate::project_context::ConfigLoader,
    ) -> Result<(Arc<dyn WorkflowRunner>, OutputNotifier), RunnerFactoryError> {
        if self.agent_registry.is_none() {
            return Err(RunnerFactoryError::MissingCollaborator("agent_registry"));
        }

        let config = config_loader.load()?;
        let output_notifier = OutputNotifier::new(event_bus, workflow_id, project_id);
        let runner = (self.builder)(RunnerAssembly {
            config,
            output_notifier: output_notifier.clone(),
            control_plane,
        });
        Ok((runner, output_notifier))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Test double that succeeds immediately after one cooperative yield.
    pub struct ScriptedRunner {
        pub outcome: RunnerOutcome,
        pub ran: Arc<AtomicBool>,
    }

    #[derive(Debug, Clone)]
    pub enum RunnerOutcome {
        Success,
        Failure(String),
        WaitForCancel,
    }

    impl ScriptedRunner {
        pub fn new(outcome: RunnerOutcome) -> Self {
            Self { outcome, ran: Arc::new(AtomicBool::new(false)) }
        }
    }

    #[async_trait]
    impl WorkflowRunner for ScriptedRunner {
        async fn run(&self, control_plane: ControlPlane, _output: OutputNotifier) -> Result<(), String> {
            self.ran.store(true, Ordering::SeqCst);
            control_plane.yield_point().await;
            match &self.outcome {
                RunnerOutcome::Success => Ok(()),
                RunnerOutcome::Failure(reason) => Err(reason.clone()),
                RunnerOutcome::WaitForCancel => {
                    while !control_plane.is_cancelled() {
                        tokio::task::yield_now().await;
                    }
                    Err("cancelled".to_string())
                }
            }
        }
    }

    pub struct EmptyAgentRegistry;

    impl AgentRegistry for EmptyAgentRegistry {
        fn available(&self) -> Vec<String> {
            Vec::new()
        }
        fn available_for_phase(&self, _phase: Phase) -> Vec<String> {
            Vec::new()
        }
        fn available_for_phase_with_config(&self, _phase: Phase, _config: &EffectiveConfig) -> Vec<String> {
            Vec::new()
        }
        fn get(&self, _name: &str) -> Option<Arc<dyn Agent>> {
            None
        }
        fn list_enabled(&self) -> Vec<String> {
            Vec::new()
        }
        fn list_enabled_for_phase(&self, _phase: Phase) -> Vec<String> {
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
