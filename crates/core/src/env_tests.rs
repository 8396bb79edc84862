// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::time::Duration;

#[test]
#[serial]
fn heartbeat_interval_defaults_to_ten_seconds() {
    std::env::remove_var("QUORUM_HEARTBEAT_MS");
    assert_eq!(heartbeat_interval(), Duration::from_secs(10));
}

#[test]
#[serial]
fn heartbeat_interval_reads_override() {
    std::env::set_var("QUORUM_HEARTBEAT_MS", "100");
    assert_eq!(heartbeat_interval(), Duration::from_millis(100));
    std::env::remove_var("QUORUM_HEARTBEAT_MS");
}

#[test]
#[serial]
fn stale_threshold_defaults_to_triple_heartbeat() {
    std::env::remove_var("QUORUM_HEARTBEAT_MS");
    std::env::remove_var("QUORUM_HEARTBEAT_STALE_MS");
    assert_eq!(stale_threshold(), Duration::from_secs(30));
}

#[test]
#[serial]
fn stale_threshold_override_wins_over_derived_default() {
    std::env::set_var("QUORUM_HEARTBEAT_MS", "100");
    std::env::set_var("QUORUM_HEARTBEAT_STALE_MS", "5000");
    assert_eq!(stale_threshold(), Duration::from_millis(5000));
    std::env::remove_var("QUORUM_HEARTBEAT_MS");
    std::env::remove_var("QUORUM_HEARTBEAT_STALE_MS");
}

#[test]
#[serial]
fn confirm_timeout_defaults_to_five_seconds() {
    std::env::remove_var("QUORUM_CONFIRM_TIMEOUT_MS");
    assert_eq!(confirm_timeout(), Duration::from_secs(5));
}

#[test]
#[serial]
fn kanban_poll_interval_defaults_to_500ms() {
    std::env::remove_var("QUORUM_KANBAN_POLL_MS");
    assert_eq!(kanban_poll_interval(), Duration::from_millis(500));
}

#[test]
#[serial]
fn kanban_failure_threshold_defaults_to_three() {
    std::env::remove_var("QUORUM_KANBAN_FAILURE_THRESHOLD");
    assert_eq!(kanban_failure_threshold(), 3);
}

#[test]
#[serial]
fn kanban_failure_threshold_ignores_unparseable_override() {
    std::env::set_var("QUORUM_KANBAN_FAILURE_THRESHOLD", "not-a-number");
    assert_eq!(kanban_failure_threshold(), 3);
    std::env::remove_var("QUORUM_KANBAN_FAILURE_THRESHOLD");
}

#[test]
#[serial]
fn registry_dir_reads_explicit_override() {
    std::env::set_var("QUORUM_REGISTRY_DIR", "/tmp/quorum-registry-test");
    assert_eq!(registry_dir(), Some(std::path::PathBuf::from("/tmp/quorum-registry-test")));
    std::env::remove_var("QUORUM_REGISTRY_DIR");
}
