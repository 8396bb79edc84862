// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment-variable configuration for the execution core.
//!
//! Spec.md names defaults ("100ms in tests, ~10s in production", "5s",
//! "threshold") without a configuration surface; this follows the
//! fallback-chain style of the teacher's `oj-daemon::env` module so those
//! defaults are overridable without threading config through every call site.

use std::path::PathBuf;
use std::time::Duration;

/// Heartbeat tick interval. `QUORUM_HEARTBEAT_MS` overrides; default 10s.
pub fn heartbeat_interval() -> Duration {
    env_ms("QUORUM_HEARTBEAT_MS").unwrap_or(Duration::from_secs(10))
}

/// Heartbeat staleness threshold, default 3x the heartbeat interval.
/// `QUORUM_HEARTBEAT_STALE_MS` overrides both defaults.
pub fn stale_threshold() -> Duration {
    env_ms("QUORUM_HEARTBEAT_STALE_MS").unwrap_or_else(|| heartbeat_interval() * 3)
}

/// Startup confirmation handshake timeout, default 5s.
pub fn confirm_timeout() -> Duration {
    env_ms("QUORUM_CONFIRM_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// How often the Kanban engine polls for the next queued workflow when idle.
pub fn kanban_poll_interval() -> Duration {
    env_ms("QUORUM_KANBAN_POLL_MS").unwrap_or(Duration::from_millis(500))
}

/// Consecutive-failure threshold before the Kanban circuit breaker opens.
pub fn kanban_failure_threshold() -> u32 {
    std::env::var("QUORUM_KANBAN_FAILURE_THRESHOLD")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(3)
}

/// Resolve the global registry directory: `QUORUM_REGISTRY_DIR` >
/// `~/.quorum-registry`.
pub fn registry_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("QUORUM_REGISTRY_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(".quorum-registry"))
}

fn env_ms(key: &str) -> Option<Duration> {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
