// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-host liveness probes backing orphan/zombie reconciliation (spec.md S4.4.6).

use nix::sys::signal::kill;
use nix::unistd::{gethostname, Pid};

/// False for `pid <= 0`; otherwise probes the OS with `signal 0` (`kill -0`),
/// which checks for a live process without actually signalling it.
pub fn process_exists(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Case-insensitive trim match against `"localhost"`, `"127.0.0.1"`, or the
/// OS hostname. The orphan detector is explicitly single-host (spec.md S9);
/// a row whose host doesn't match this is left alone.
pub fn is_local_host(host: &str) -> bool {
    let candidate = host.trim();
    if candidate.eq_ignore_ascii_case("localhost") || candidate == "127.0.0.1" {
        return true;
    }
    let Ok(local) = gethostname() else { return false };
    let Ok(local) = local.into_string() else { return false };
    candidate.eq_ignore_ascii_case(local.trim())
}

#[cfg(test)]
#[path = "orphan_tests.rs"]
mod tests;
