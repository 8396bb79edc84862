// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project Context Pool, driven end to end against a real filesystem
//! temp directory and a real `InMemoryStore`-backed factory.

use quorum_core::{ConfigMode, Project, ProjectId};
use quorum_engine::{ConfigLoader, EventBus, GlobalConfigLoader, ProjectContext, ProjectContextPool, ProjectRegistry, StoreFactory};
use quorum_storage::InMemoryStore;
use std::path::PathBuf;
use std::sync::Arc;

struct StaticRegistry(Vec<Project>);

impl ProjectRegistry for StaticRegistry {
    fn get(&self, id: ProjectId) -> Option<Project> {
        self.0.iter().find(|p| p.id == id).cloned()
    }
}

fn default_context() -> Arc<ProjectContext> {
    Arc::new(ProjectContext {
        project_id: ProjectId::new(),
        project_root: PathBuf::from("/default"),
        state_manager: Arc::new(InMemoryStore::new()),
        event_bus: EventBus::new(),
        config_loader: Arc::new(GlobalConfigLoader::new(PathBuf::from("/nonexistent/global-config.yaml"))),
        attachment_store: PathBuf::from("/default/.quorum/attachments"),
        chat_store: PathBuf::from("/default/.quorum/chat"),
    })
}

#[tokio::test]
async fn custom_project_resolves_its_own_yaml_config_over_the_global_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".quorum")).unwrap();
    std::fs::write(dir.path().join(".quorum/config.yaml"), "auto_verify: true\nmax_retries: 2\n").unwrap();

    let mut project = Project::new(ProjectId::new(), dir.path().to_path_buf(), "demo-project", chrono::Utc::now());
    project.config_mode = ConfigMode::Custom;
    let id = project.id;

    let registry = Arc::new(StaticRegistry(vec![project]));
    let factory: StoreFactory = Arc::new(|_p| Arc::new(InMemoryStore::new()));
    let pool = ProjectContextPool::new(registry, factory, default_context());

    let ctx = pool.get_context(id).await.unwrap();
    let config = ctx.config_loader.load().unwrap();
    assert_eq!(config.get("auto_verify").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(config.get("max_retries").and_then(|v| v.as_i64()), Some(2));

    pool.evict(id).await;
    pool.shutdown().await;
}

#[tokio::test]
async fn inherit_global_project_falls_back_to_the_global_config_loader() {
    let dir = tempfile::tempdir().unwrap();
    let project = Project::new(ProjectId::new(), dir.path().to_path_buf(), "inherits", chrono::Utc::now());
    let id = project.id;

    let registry = Arc::new(StaticRegistry(vec![project]));
    let factory: StoreFactory = Arc::new(|_p| Arc::new(InMemoryStore::new()));
    let pool = ProjectContextPool::new(registry, factory, default_context());

    let ctx = pool.get_context(id).await.unwrap();
    // No global config file exists at the default location; this must not error.
    assert!(ctx.config_loader.load().unwrap().is_empty());
}
