// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot export/import for crash recovery and migration between backends.
//!
//! Grounded in the teacher's `oj-daemon::storage::snapshot` (version field,
//! `.bak` rotation) with the materialized-state blob swapped for the plain
//! workflow/running-set/kanban collections this core persists.

use crate::error::StorageError;
use crate::memory::InMemoryStore;
use chrono::{DateTime, Utc};
use quorum_core::{KanbanEngineState, RunningWorkflowRecord, WorkflowState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const MAX_BAK_FILES: u32 = 3;

/// A full point-in-time export of a store's contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub workflows: Vec<WorkflowState>,
    pub running: Vec<RunningWorkflowRecord>,
    pub kanban: KanbanEngineState,
}

/// Conflict policy for [`import_snapshot`].
///
/// `MergeSkipExisting` is the safe default noted in the open design question:
/// rows already present in the target store win; only genuinely new rows
/// from the snapshot are brought in. `Overwrite` is available for operators
/// who explicitly want the snapshot to win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPolicy {
    #[default]
    MergeSkipExisting,
    Overwrite,
}

/// Result of an import: counts of rows actually written vs skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub workflows_imported: usize,
    pub workflows_skipped: usize,
    pub running_imported: usize,
    pub running_skipped: usize,
}

pub async fn export_snapshot(store: &InMemoryStore) -> Snapshot {
    let (workflows, running, kanban) = store.export_all().await;
    Snapshot { version: CURRENT_SNAPSHOT_VERSION, created_at: Utc::now(), workflows, running, kanban }
}

pub async fn import_snapshot(
    store: &InMemoryStore,
    snapshot: Snapshot,
    policy: ImportPolicy,
) -> Result<ImportReport, StorageError> {
    if snapshot.version > CURRENT_SNAPSHOT_VERSION {
        return Err(StorageError::UnsupportedSnapshotVersion {
            found: snapshot.version,
            supported: CURRENT_SNAPSHOT_VERSION,
        });
    }

    let mut report = ImportReport::default();

    for state in snapshot.workflows {
        let imported = match policy {
            ImportPolicy::Overwrite => {
                store.import_workflow_overwrite(state).await;
                true
            }
            ImportPolicy::MergeSkipExisting => store.import_workflow_if_absent(state).await,
        };
        if imported {
            report.workflows_imported += 1;
        } else {
            report.workflows_skipped += 1;
        }
    }

    for record in snapshot.running {
        let imported = match policy {
            ImportPolicy::Overwrite => {
                store.import_running_overwrite(record).await;
                true
            }
            ImportPolicy::MergeSkipExisting => store.import_running_if_absent(record).await,
        };
        if imported {
            report.running_imported += 1;
        } else {
            report.running_skipped += 1;
        }
    }

    if policy == ImportPolicy::Overwrite {
        store.overwrite_kanban(snapshot.kanban).await;
    }

    Ok(report)
}

/// Write a snapshot to `path` as JSON, rotating up to [`MAX_BAK_FILES`]
/// previous copies out of the way first.
pub fn write_snapshot_file(path: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    if path.exists() {
        let bak = rotate_bak_path(path);
        fs::rename(path, bak)?;
    }
    let json = serde_json::to_vec_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_snapshot_file(path: &Path) -> Result<Snapshot, StorageError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| if n == 1 { path.with_extension("bak") } else { path.with_extension(format!("bak.{n}")) };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
