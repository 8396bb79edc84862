// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::traits::WorkflowStore;
use quorum_core::WorkflowState;
use tempfile::tempdir;

#[tokio::test]
async fn export_then_import_into_fresh_store_merges_everything() {
    let source = InMemoryStore::new();
    let wf = WorkflowState::builder().build();
    let id = wf.workflow_id;
    source.save(wf).await.unwrap();

    let snapshot = export_snapshot(&source).await;
    let target = InMemoryStore::new();
    let report = import_snapshot(&target, snapshot, ImportPolicy::MergeSkipExisting).await.unwrap();

    assert_eq!(report.workflows_imported, 1);
    assert_eq!(report.workflows_skipped, 0);
    assert!(target.load_by_id(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn merge_skip_existing_does_not_clobber_target_rows() {
    let source = InMemoryStore::new();
    let mut wf = WorkflowState::builder().title("from snapshot").build();
    let id = wf.workflow_id;
    wf.workflow_id = id;
    source.save(wf.clone()).await.unwrap();
    let snapshot = export_snapshot(&source).await;

    let target = InMemoryStore::new();
    let mut target_wf = wf.clone();
    target_wf.title = "already present".into();
    target.save(target_wf).await.unwrap();

    let report = import_snapshot(&target, snapshot, ImportPolicy::MergeSkipExisting).await.unwrap();
    assert_eq!(report.workflows_skipped, 1);
    assert_eq!(target.load_by_id(&id).await.unwrap().unwrap().title, "already present");
}

#[tokio::test]
async fn overwrite_policy_clobbers_target_rows_with_the_snapshot_version() {
    let source = InMemoryStore::new();
    let mut wf = WorkflowState::builder().title("from snapshot").build();
    let id = wf.workflow_id;
    wf.workflow_id = id;
    source.save(wf.clone()).await.unwrap();
    let snapshot = export_snapshot(&source).await;

    let target = InMemoryStore::new();
    let mut target_wf = wf.clone();
    target_wf.title = "already present".into();
    target.save(target_wf).await.unwrap();

    let report = import_snapshot(&target, snapshot, ImportPolicy::Overwrite).await.unwrap();
    assert_eq!(report.workflows_imported, 1);
    assert_eq!(report.workflows_skipped, 0);
    assert_eq!(target.load_by_id(&id).await.unwrap().unwrap().title, "from snapshot");
}

#[tokio::test]
async fn rejects_snapshot_from_a_newer_schema_version() {
    let target = InMemoryStore::new();
    let snapshot = Snapshot {
        version: CURRENT_SNAPSHOT_VERSION + 1,
        created_at: chrono::Utc::now(),
        workflows: vec![],
        running: vec![],
        kanban: KanbanEngineState::default(),
    };
    let err = import_snapshot(&target, snapshot, ImportPolicy::MergeSkipExisting).await.unwrap_err();
    assert!(matches!(err, StorageError::UnsupportedSnapshotVersion { .. }));
}

#[tokio::test]
async fn file_round_trip_preserves_contents() {
    let source = InMemoryStore::new();
    let wf = WorkflowState::builder().build();
    source.save(wf).await.unwrap();
    let snapshot = export_snapshot(&source).await;

    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    write_snapshot_file(&path, &snapshot).unwrap();
    let loaded = read_snapshot_file(&path).unwrap();
    assert_eq!(loaded.workflows.len(), 1);
}

#[tokio::test]
async fn writing_twice_rotates_a_backup_file() {
    let source = InMemoryStore::new();
    let snapshot = export_snapshot(&source).await;

    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    write_snapshot_file(&path, &snapshot).unwrap();
    write_snapshot_file(&path, &snapshot).unwrap();

    assert!(path.with_extension("bak").exists());
}
