/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{
    service::Service,
    value::{BindOp, SeccompRule},
};

/// Syscalls `filter_disk_sync` denies — the disk-sync family an
/// instance can do without if it never needs durability guarantees.
const DISK_SYNC_SYSCALLS: &[&str] = &["fsync", "fdatasync", "sync", "msync", "sync_file_range"];

/// `[common]` — always present, always merged first (§4.2). Carries
/// the instance's launch command and environment overrides; not
/// subject to `conflict_check` since it has no `conflicts` entries and
/// activation is implicit (present in every instance by construction,
/// not gated on table presence the way optional services are).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Common {
    pub executable_name: Vec<String>,
    pub filter_disk_sync: bool,
    pub dbus_name: Vec<String>,
    /// Deprecated; accepted but treated as a no-op, per §9's
    /// open-question resolution recorded in DESIGN.md.
    pub share_local_time: bool,
    pub environment: BTreeMap<String, String>,
}

impl Default for Common {
    fn default() -> Self {
        Self {
            executable_name: Vec::new(),
            filter_disk_sync: false,
            dbus_name: Vec::new(),
            share_local_time: false,
            environment: BTreeMap::new(),
        }
    }
}

#[typetag::serde(name = "common")]
impl Service for Common {
    fn name(&self) -> &'static str {
        "common"
    }

    fn description(&self) -> &'static str {
        "Core launch command and environment overrides shared by every instance"
    }

    fn option_warnings(&self) -> Vec<String> {
        if self.share_local_time {
            vec!["'share_local_time' is deprecated and is treated as a no-op".to_string()]
        } else {
            Vec::new()
        }
    }

    fn default_argv(&self) -> Vec<String> {
        self.executable_name.clone()
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        self.environment
            .iter()
            .map(|(key, value)| BindOp::EnvSet { key: key.clone(), value: value.clone() })
            .collect()
    }

    fn iter_seccomp_rules(&self) -> Vec<SeccompRule> {
        if self.filter_disk_sync {
            DISK_SYNC_SYSCALLS.iter().map(|syscall| SeccompRule::Deny { syscall: syscall.to_string(), errno: None }).collect()
        } else {
            Vec::new()
        }
    }
}
