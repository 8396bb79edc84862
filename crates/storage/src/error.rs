// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by state store backends.

use quorum_core::WorkflowId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("workflow {0} not found")]
    NotFound(WorkflowId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot schema version {found} is newer than supported version {supported}")]
    UnsupportedSnapshotVersion { found: u32, supported: u32 },

    #[error("capability not available: {0}")]
    ServiceUnavailable(&'static str),
}
