/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use libseccomp::{ScmpAction as Action, ScmpArch, ScmpFilterContext, ScmpSyscall as Syscall};
use nix::libc;
use os_pipe::{pipe, PipeReader};

use crate::{config::value::SeccompRule, utils::print_warning};

/// Flatpak-derived baseline denylist (§4.6), numbered since future
/// revisions may add or retire entries and callers may want to pin a
/// specific generation.
///
/// https://github.com/flatpak/flatpak/blob/main/common/flatpak-run.c#L1835
pub static BASELINE_DENYLIST_V1: &[(&str, i32)] = &[
    ("unshare", libc::EPERM),
    ("setns", libc::EPERM),
    ("mount", libc::EPERM),
    ("umount2", libc::EPERM),
    ("pivot_root", libc::EPERM),
    ("chroot", libc::EPERM),
    ("clone3", libc::ENOSYS),
    ("perf_event_open", libc::ENOSYS),
    ("bpf", libc::ENOSYS),
    ("userfaultfd", libc::ENOSYS),
    ("ptrace", libc::ENOSYS),
    ("syslog", libc::EPERM),
    ("uselib", libc::EPERM),
    ("acct", libc::EPERM),
    ("quotactl", libc::EPERM),
    ("add_key", libc::EPERM),
    ("keyctl", libc::EPERM),
    ("request_key", libc::EPERM),
    ("move_pages", libc::EPERM),
    ("mbind", libc::EPERM),
    ("get_mempolicy", libc::EPERM),
    ("set_mempolicy", libc::EPERM),
    ("migrate_pages", libc::EPERM),
    ("open_tree", libc::ENOSYS),
    ("move_mount", libc::ENOSYS),
    ("fsopen", libc::ENOSYS),
    ("fsconfig", libc::ENOSYS),
    ("fsmount", libc::ENOSYS),
    ("fspick", libc::ENOSYS),
    ("mount_setattr", libc::ENOSYS),
];

/// The baseline as `SeccompRule::Deny`, for the Config merger to fold
/// in ahead of any per-service rules (§4.2).
pub fn baseline_rules() -> Vec<SeccompRule> {
    BASELINE_DENYLIST_V1.iter().map(|(name, errno)| SeccompRule::Deny { syscall: name.to_string(), errno: Some(*errno) }).collect()
}

/// Assembles a default-allow BPF program from `rules`, writes it to an
/// anonymous pipe, and returns the read end for inheritance into bwrap
/// (§4.5 step 5, `--seccomp <fd>`).
///
/// Explicit `Allow` rules remove a syscall from the deny set rather
/// than adding a separate allow rule — the program's default action is
/// already `Allow`, so an override is "don't deny this one" (§4.6).
pub fn compile(rules: &[SeccompRule]) -> crate::Result<PipeReader> {
    let mut denylist: std::collections::BTreeMap<String, i32> = std::collections::BTreeMap::new();

    for rule in rules {
        if let SeccompRule::Deny { syscall, errno } = rule {
            denylist.insert(syscall.clone(), errno.unwrap_or(libc::EPERM));
        }
    }

    for rule in rules {
        if let SeccompRule::Allow { syscall } = rule {
            denylist.remove(syscall);
        }
    }

    let mut filter = ScmpFilterContext::new_filter(Action::Allow)
        .map_err(|e| crate::error!(crate::ErrorKind::DependencyMissing(format!("libseccomp: {}", e))))?;

    if cfg!(target_arch = "x86_64") {
        filter.add_arch(ScmpArch::X86).map_err(|e| crate::error!(crate::ErrorKind::DependencyMissing(format!("libseccomp arch: {}", e))))?;
        filter.add_arch(ScmpArch::X8664).map_err(|e| crate::error!(crate::ErrorKind::DependencyMissing(format!("libseccomp arch: {}", e))))?;
    } else {
        filter.add_arch(ScmpArch::Native).map_err(|e| crate::error!(crate::ErrorKind::DependencyMissing(format!("libseccomp arch: {}", e))))?;
    }

    let mut unresolved = Vec::new();

    for (name, errno) in &denylist {
        match Syscall::from_name(name) {
            Ok(syscall) => {
                if let Err(e) = filter.add_rule(Action::Errno(*errno), syscall) {
                    print_warning(&format!("seccomp: failed to add rule for '{}': {}", name, e));
                }
            }
            Err(_) => unresolved.push(name.clone()),
        }
    }

    if !unresolved.is_empty() {
        print_warning(&format!("seccomp: unknown syscalls on this architecture, skipped: {}", unresolved.join(", ")));
    }

    let (reader, mut writer) = pipe().map_err(|e| crate::error!(crate::ErrorKind::IOError("seccomp pipe".to_string(), e.kind())))?;
    filter
        .export_bpf(&mut writer)
        .map_err(|e| crate::error!(crate::ErrorKind::DependencyMissing(format!("libseccomp export: {}", e))))?;
    drop(writer);

    Ok(reader)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allow_override_removes_from_denylist() {
        let rules = vec![
            SeccompRule::Deny { syscall: "ptrace".to_string(), errno: Some(libc::ENOSYS) },
            SeccompRule::Allow { syscall: "ptrace".to_string() },
        ];

        let mut denylist = std::collections::BTreeMap::new();
        for rule in &rules {
            if let SeccompRule::Deny { syscall, errno } = rule {
                denylist.insert(syscall.clone(), errno.unwrap_or(libc::EPERM));
            }
        }
        for rule in &rules {
            if let SeccompRule::Allow { syscall } = rule {
                denylist.remove(syscall);
            }
        }

        assert!(denylist.is_empty());
    }

    #[test]
    fn baseline_rules_are_all_deny() {
        assert!(baseline_rules().iter().all(|r| matches!(r, SeccompRule::Deny { .. })));
        assert_eq!(baseline_rules().len(), BASELINE_DENYLIST_V1.len());
    }
}
