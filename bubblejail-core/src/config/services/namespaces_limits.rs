/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{config::{service::Service, value::NsKind}, err, ErrorKind, Result};

/// `value ∈ {0=deny, -1=unlimited, n≥1}` per kind, applied by the
/// namespace-limits applier (C3 / §4.7) after bwrap launches.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct NamespacesLimits {
    pub user: Option<i64>,
    pub mount: Option<i64>,
    pub pid: Option<i64>,
    pub ipc: Option<i64>,
    pub net: Option<i64>,
    pub time: Option<i64>,
    pub uts: Option<i64>,
    pub cgroup: Option<i64>,
}

#[typetag::serde(name = "namespaces_limits")]
impl Service for NamespacesLimits {
    fn name(&self) -> &'static str {
        "namespaces_limits"
    }

    fn description(&self) -> &'static str {
        "Caps kernel namespace-creation counts inside the sandbox's user namespace"
    }

    fn conflicts(&self) -> &'static [&'static str] {
        &["slirp4netns"]
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("user", self.user),
            ("mount", self.mount),
            ("pid", self.pid),
            ("ipc", self.ipc),
            ("net", self.net),
            ("time", self.time),
            ("uts", self.uts),
            ("cgroup", self.cgroup),
        ] {
            if value.is_some_and(|v| v < -1) {
                err!(ErrorKind::ConfigParseError(
                    "namespaces_limits".to_string(),
                    format!("'{}' must be 0, -1, or a positive integer", field)
                ))?
            }
        }

        Ok(())
    }

    fn iter_namespace_limits(&self) -> BTreeMap<NsKind, i64> {
        let mut map = BTreeMap::new();
        let mut set = |kind: NsKind, value: Option<i64>| {
            if let Some(v) = value {
                map.insert(kind, v);
            }
        };

        set(NsKind::User, self.user);
        set(NsKind::Mount, self.mount);
        set(NsKind::Pid, self.pid);
        set(NsKind::Ipc, self.ipc);
        set(NsKind::Net, self.net);
        set(NsKind::Time, self.time);
        set(NsKind::Uts, self.uts);
        set(NsKind::Cgroup, self.cgroup);
        map
    }
}
