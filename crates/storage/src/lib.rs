// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! quorum-storage: the durable backend behind the execution core's state
//! store contract (spec.md S6) — an in-memory reference implementation plus
//! snapshot export/import for crash recovery.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::StorageError;
pub use memory::InMemoryStore;
pub use snapshot::{
    export_snapshot, import_snapshot, read_snapshot_file, write_snapshot_file, ImportPolicy, ImportReport,
    Snapshot, CURRENT_SNAPSHOT_VERSION,
};
pub use traits::{AtomicCtx, KanbanStore, WorkflowStore};
