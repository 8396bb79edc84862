// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project Context Pool: per-project collaborator bundles with lazy,
//! single-flight construction (spec.md S4.5).

use crate::error::PoolError;
use crate::event_bus::EventBus;
use quorum_core::{ConfigMode, Project, ProjectId};
use quorum_storage::WorkflowStore;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Arbitrary, schema-free config payload (spec.md Non-goals explicitly
/// excludes JSON-schema generation for config; the loader just hands back
/// whatever the YAML document contains).
pub type EffectiveConfig = BTreeMap<String, serde_yaml::Value>;

/// Resolves a project's effective configuration: global (inherited) or
/// per-project custom (spec.md S4.5).
pub trait ConfigLoader: Send + Sync {
    fn load(&self) -> Result<EffectiveConfig, PoolError>;
}

/// Reads `~/.quorum-registry/global-config.yaml`.
pub struct GlobalConfigLoader {
    path: PathBuf,
}

impl GlobalConfigLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigLoader for GlobalConfigLoader {
    fn load(&self) -> Result<EffectiveConfig, PoolError> {
        read_yaml_config(&self.path)
    }
}

/// Reads `<project>/.quorum/config.yaml` (only used in `ConfigMode::Custom`).
pub struct CustomConfigLoader {
    path: PathBuf,
}

impl CustomConfigLoader {
    pub fn new(project_root: &Path) -> Self {
        Self { path: project_root.join(".quorum").join("config.yaml") }
    }
}

impl ConfigLoader for CustomConfigLoader {
    fn load(&self) -> Result<EffectiveConfig, PoolError> {
        read_yaml_config(&self.path)
    }
}

fn read_yaml_config(path: &Path) -> Result<EffectiveConfig, PoolError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str(&contents)
            .map_err(|source| PoolError::ConfigParse { path: path.to_path_buf(), source }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EffectiveConfig::default()),
        Err(source) => Err(PoolError::ConfigIo { path: path.to_path_buf(), source }),
    }
}

/// Looks up a project's registry entry (spec.md S6 "global registry").
pub trait ProjectRegistry: Send + Sync {
    fn get(&self, id: ProjectId) -> Option<Project>;
}

/// Per-project bundle of collaborators (spec.md S3 `ProjectContext`).
/// `attachment_store`/`chat_store` are opaque roots: byte storage for
/// either is explicitly out of scope (spec.md S1 Non-goals).
pub struct ProjectContext {
    pub project_id: ProjectId,
    pub project_root: PathBuf,
    pub state_manager: Arc<dyn WorkflowStore>,
    pub event_bus: EventBus,
    pub config_loader: Arc<dyn ConfigLoader>,
    pub attachment_store: PathBuf,
    pub chat_store: PathBuf,
}

impl ProjectContext {
    fn build(project: &Project, store: Arc<dyn WorkflowStore>) -> Self {
        let config_loader: Arc<dyn ConfigLoader> = match project.config_mode {
            ConfigMode::Custom => Arc::new(CustomConfigLoader::new(&project.path)),
            ConfigMode::InheritGlobal => {
                let global_path = quorum_core::env::registry_dir()
                    .unwrap_or_else(|| PathBuf::from(".quorum-registry"))
                    .join("global-config.yaml");
                Arc::new(GlobalConfigLoader::new(global_path))
            }
        };
        Self {
            project_id: project.id,
            project_root: project.path.clone(),
            state_manager: store,
            event_bus: EventBus::new(),
            config_loader,
            attachment_store: project.path.join(".quorum").join("attachments"),
            chat_store: project.path.join(".quorum").join("chat"),
        }
    }
}

/// Builds the per-project state manager backed by that project's state
/// directory. Abstracted behind a factory so the pool doesn't hardcode a
/// storage backend.
pub type StoreFactory = Arc<dyn Fn(&Project) -> Arc<dyn WorkflowStore> + Send + Sync>;

/// Maps `project_id -> ProjectContext`, with single-flight lazy
/// construction: concurrent first-touches of the same project collapse
/// into one build (spec.md S4.5, S5).
pub struct ProjectContextPool {
    registry: Arc<dyn ProjectRegistry>,
    store_factory: StoreFactory,
    contexts: Mutex<HashMap<ProjectId, Arc<OnceCell<Arc<ProjectContext>>>>>,
    default_context: Arc<ProjectContext>,
}

impl ProjectContextPool {
    pub fn new(registry: Arc<dyn ProjectRegistry>, store_factory: StoreFactory, default_context: Arc<ProjectContext>) -> Self {
        Self { registry, store_factory, contexts: Mutex::new(HashMap::new()), default_context }
    }

    /// Existing context or lazily built. A context is destroyed only by
    /// explicit `evict`/`shutdown`, never on its own.
    pub async fn get_context(&self, id: ProjectId) -> Result<Arc<ProjectContext>, PoolError> {
        let cell = {
            let mut guard = self.contexts.lock().await;
            guard.entry(id).or_insert_with(|| Arc::new(OnceCell::new())).clone()
        };
        cell.get_or_try_init(|| async {
            let project = self.registry.get(id).ok_or(PoolError::ProjectNotFound(id))?;
            let store = (self.store_factory)(&project);
            Ok::<_, PoolError>(Arc::new(ProjectContext::build(&project, store)))
        })
        .await
        .cloned()
    }

    /// Evict a single project's context (registry eviction).
    pub async fn evict(&self, id: ProjectId) {
        self.contexts.lock().await.remove(&id);
    }

    /// Destroy every context.
    pub async fn shutdown(&self) {
        self.contexts.lock().await.clear();
    }

    pub fn default_context(&self) -> Arc<ProjectContext> {
        self.default_context.clone()
    }
}

/// Per-request "effective" accessor: a request-scoped project context wins,
/// the server default otherwise (spec.md S4.5 "per-request resolution,
/// with a global fallback").
pub fn effective_state_manager(ctx: Option<&ProjectContext>, default: &Arc<dyn WorkflowStore>) -> Arc<dyn WorkflowStore> {
    ctx.map(|c| c.state_manager.clone()).unwrap_or_else(|| default.clone())
}

pub fn effective_event_bus(ctx: Option<&ProjectContext>, default: &EventBus) -> EventBus {
    ctx.map(|c| c.event_bus.clone()).unwrap_or_else(|| default.clone())
}

pub fn effective_config_loader(ctx: Option<&ProjectContext>, default: &Arc<dyn ConfigLoader>) -> Arc<dyn ConfigLoader> {
    ctx.map(|c| c.config_loader.clone()).unwrap_or_else(|| default.clone())
}

pub fn effective_root(ctx: Option<&ProjectContext>, default: &Path) -> PathBuf {
    ctx.map(|c| c.project_root.clone()).unwrap_or_else(|| default.to_path_buf())
}

#[cfg(test)]
#[path = "project_context_tests.rs"]
mod tests;
