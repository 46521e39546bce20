/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{collections::BTreeMap, fs::write, os::fd::AsRawFd, path::PathBuf};

use nix::{
    sched::{setns, CloneFlags},
    sys::wait::{waitpid, WaitStatus},
    unistd::{fork, ForkResult, Pid},
};

use crate::{config::value::NsKind, err, error, ErrorKind, Result};

/// Value `-1` from `services.toml` means "no cap", rendered to the
/// kernel as its own reported maximum rather than a magic sentinel
/// (§4.7).
const PLATFORM_MAXIMUM: i64 = i32::MAX as i64;

/// Joins `pid`'s user namespace in a forked child and writes each
/// `/proc/sys/user/max_*_namespaces` entry, so the parent's own
/// namespace is never touched (§4.7). Declared for x86_64 only.
#[cfg(target_arch = "x86_64")]
pub fn apply(pid: Pid, limits: &BTreeMap<NsKind, i64>) -> Result<()> {
    if limits.is_empty() {
        return Ok(());
    }

    match unsafe { fork() }.map_err(|e| error!(ErrorKind::NamespaceLimitFailed(format!("fork: {}", e))))? {
        ForkResult::Parent { child } => reap(child),
        ForkResult::Child => {
            let outcome = apply_in_child(pid, limits);
            std::process::exit(if outcome.is_ok() { 0 } else { 1 });
        }
    }
}

#[cfg(not(target_arch = "x86_64"))]
pub fn apply(_pid: Pid, limits: &BTreeMap<NsKind, i64>) -> Result<()> {
    if limits.is_empty() {
        return Ok(());
    }

    err!(ErrorKind::NamespaceLimitFailed("namespace limits are only supported on x86_64".to_string()))
}

fn reap(child: Pid) -> Result<()> {
    match waitpid(child, None) {
        Ok(WaitStatus::Exited(_, 0)) => Ok(()),
        Ok(WaitStatus::Exited(_, code)) => {
            err!(ErrorKind::NamespaceLimitFailed(format!("helper exited with status {}", code)))
        }
        Ok(status) => err!(ErrorKind::NamespaceLimitFailed(format!("helper terminated abnormally: {:?}", status))),
        Err(e) => err!(ErrorKind::NamespaceLimitFailed(format!("waitpid: {}", e))),
    }
}

fn apply_in_child(pid: Pid, limits: &BTreeMap<NsKind, i64>) -> Result<()> {
    let ns_path = PathBuf::from(format!("/proc/{}/ns/user", pid));
    let ns_file = std::fs::File::open(&ns_path).map_err(|e| error!(ErrorKind::NamespaceLimitFailed(format!("open {}: {}", ns_path.display(), e))))?;

    setns(ns_file.as_raw_fd(), CloneFlags::CLONE_NEWUSER).map_err(|e| error!(ErrorKind::NamespaceLimitFailed(format!("setns: {}", e))))?;

    for (kind, value) in limits {
        let rendered = match *value {
            -1 => PLATFORM_MAXIMUM.to_string(),
            n => n.to_string(),
        };

        write(kind.proc_sysctl(), rendered).map_err(|e| error!(ErrorKind::NamespaceLimitFailed(format!("write {}: {}", kind.proc_sysctl(), e))))?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_limits_is_a_noop() {
        assert!(apply(Pid::from_raw(1), &BTreeMap::new()).is_ok());
    }
}
