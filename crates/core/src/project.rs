// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project registry entries and the context-resolution status model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a registered project.
    pub struct ProjectId("prj-");
}

/// Health of a project's on-disk state, driven by `ValidateProject` (spec.md S4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// `<path>/.quorum/` exists.
    Healthy,
    /// `path` exists but `.quorum/` is missing.
    Degraded,
    /// `path` could not be read at all.
    Offline,
}

crate::simple_display! {
    ProjectStatus {
        Healthy => "healthy",
        Degraded => "degraded",
        Offline => "offline",
    }
}

/// Where a project's configuration is sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigMode {
    /// Reads the user-global config file.
    InheritGlobal,
    /// Reads `<project>/.quorum/config.yaml`.
    Custom,
}

crate::simple_display! {
    ConfigMode {
        InheritGlobal => "inherit_global",
        Custom => "custom",
    }
}

/// Registry entry for a project known to the server (spec.md S3 `Project`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub path: PathBuf,
    pub name: String,
    pub status: ProjectStatus,
    pub config_mode: ConfigMode,
    pub last_accessed: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub color: Option<String>,
    pub is_default: bool,
}

impl Project {
    pub fn new(id: ProjectId, path: PathBuf, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            path,
            name: name.into(),
            status: ProjectStatus::Healthy,
            config_mode: ConfigMode::InheritGlobal,
            last_accessed: now,
            created_at: now,
            color: None,
            is_default: false,
        }
    }

    /// `.quorum/` marker directory inside the project root.
    pub fn marker_dir(&self) -> PathBuf {
        self.path.join(".quorum")
    }

    /// Re-derive [`ProjectStatus`] by probing the filesystem, per spec.md S4.5:
    /// healthy iff `<path>/.quorum/` exists; degraded if `path` exists but
    /// `.quorum/` is missing; offline if `path` itself is unreadable.
    pub fn validate(&self) -> ProjectStatus {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.is_dir() => {
                if self.marker_dir().is_dir() {
                    ProjectStatus::Healthy
                } else {
                    ProjectStatus::Degraded
                }
            }
            _ => ProjectStatus::Offline,
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
