// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the execution core (spec.md S7): preconditions,
//! conflicts, timeouts, and storage failures, kept as distinct variants so
//! an HTTP layer consuming this crate can map each one to a distinct status
//! code instead of string-matching.

use quorum_core::{DomainError, WorkflowId};
use quorum_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    // Preconditions
    #[error("workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    #[error("workflow {0} is not running")]
    WorkflowNotRunning(WorkflowId),

    #[error("workflow {0} is not in a mutable state")]
    NotInMutableState(WorkflowId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    // Conflicts
    #[error("workflow {0} is already running in this process")]
    AlreadyRunningInMemory(WorkflowId),

    #[error("workflow {0} is already running according to the durable running-set")]
    AlreadyRunningInDatabase(WorkflowId),

    #[error("workflow {0} is already paused")]
    AlreadyPaused(WorkflowId),

    #[error("workflow {0} is not paused")]
    NotPaused(WorkflowId),

    #[error("workflow {0} is not tracked by this process")]
    NotRunning(WorkflowId),

    #[error("workflow {0} is currently executing; manual move rejected")]
    CurrentlyExecuting(WorkflowId),

    // Timeouts
    #[error("timed out waiting for confirmation of workflow {0} after {1:?}")]
    ConfirmationTimeout(WorkflowId, std::time::Duration),

    // Optional-capability probing
    #[error("capability not available: {0}")]
    ServiceUnavailable(&'static str),

    // Transient/infra
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Project Context Pool failures (spec.md S4.5). Kept separate from
/// [`EngineError`] since spec.md S7's taxonomy is entirely about the
/// tracker; the pool's failure modes (unknown project, unreadable config)
/// aren't part of that taxonomy.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("project {0} not found in registry")]
    ProjectNotFound(quorum_core::ProjectId),

    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Kanban Engine failures (spec.md S4.6). The manual-move conflict is
/// `EngineError::CurrentlyExecuting` itself (spec.md S7's taxonomy already
/// names it); this enum only adds the storage passthrough.
#[derive(Debug, Error)]
pub enum KanbanError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Runner Factory failures (spec.md S4.7): the first missing collaborator
/// short-circuits assembly.
#[derive(Debug, Error)]
pub enum RunnerFactoryError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
