/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Namespace kinds a `namespaces_limits` service may cap, per §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NsKind {
    User,
    Mount,
    Pid,
    Ipc,
    Net,
    Time,
    Uts,
    Cgroup,
}

impl NsKind {
    /// The `/proc/sys/user/max_*_namespaces` file this kind maps to.
    pub fn proc_sysctl(&self) -> &'static str {
        match self {
            Self::User => "/proc/sys/user/max_user_namespaces",
            Self::Mount => "/proc/sys/user/max_mnt_namespaces",
            Self::Pid => "/proc/sys/user/max_pid_namespaces",
            Self::Ipc => "/proc/sys/user/max_ipc_namespaces",
            Self::Net => "/proc/sys/user/max_net_namespaces",
            Self::Time => "/proc/sys/user/max_time_namespaces",
            Self::Uts => "/proc/sys/user/max_uts_namespaces",
            Self::Cgroup => "/proc/sys/user/max_cgroup_namespaces",
        }
    }
}

/// Bits composing bwrap's `--unshare-*`/`--share-*` mask (§3 `Share`
/// variant of `BindOp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShareKind {
    Net,
    User,
    Pid,
    Uts,
    Ipc,
    Cgroup,
    Time,
}

impl ShareKind {
    pub fn bwrap_flag_name(&self) -> &'static str {
        match self {
            Self::Net => "net",
            Self::User => "user",
            Self::Pid => "pid",
            Self::Uts => "uts",
            Self::Ipc => "ipc",
            Self::Cgroup => "cgroup",
            Self::Time => "time",
        }
    }
}

/// Directive an active service emits toward the config merger; the atomic
/// unit a service composes via, never a cross-service call (§9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BindOp {
    Bind { src: String, dst: String, readonly: bool, try_: bool },
    DevBind { src: String, dst: String, try_: bool },
    DirCreate { dst: String },
    SymlinkCreate { target: String, at: String },
    FileWrite { dst: String, bytes: Vec<u8> },
    EnvSet { key: String, value: String },
    EnvUnset { key: String },
    /// `true` unshares the namespace (bwrap default for most), `false`
    /// forces it shared with the host.
    Share { kind: ShareKind, unshare: bool },
    Arg { raw: String },
}

impl BindOp {
    /// The sandbox-side destination path this op binds to, if any —
    /// used by the merger's collision check (§3 invariants, §8.4).
    pub fn dst(&self) -> Option<&str> {
        match self {
            Self::Bind { dst, .. } | Self::DevBind { dst, .. } | Self::DirCreate { dst } | Self::FileWrite { dst, .. } =>
                Some(dst),
            Self::SymlinkCreate { at, .. } => Some(at),
            _ => None,
        }
    }

    pub fn is_readonly_bind(&self) -> bool {
        matches!(self, Self::Bind { readonly: true, .. })
    }
}

/// A seccomp policy directive (§4.6). `errno` is `None` for the
/// implicit `ENOSYS` some deny rules use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SeccompRule {
    Deny { syscall: String, errno: Option<i32> },
    Allow { syscall: String },
}

/// D-Bus filtering directive (§3/§4.3), bit-exact with `xdg-dbus-proxy`
/// CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DBusRule {
    Talk { name: String },
    Own { name: String },
    Call { name: String, rule: String },
    Broadcast { name: String, rule: String },
    Filter,
}

impl DBusRule {
    /// Render as the matching `xdg-dbus-proxy` argv flag.
    pub fn to_proxy_arg(&self) -> String {
        match self {
            Self::Talk { name } => format!("--talk={}", name),
            Self::Own { name } => format!("--own={}", name),
            Self::Call { name, rule } => format!("--call={}={}", name, rule),
            Self::Broadcast { name, rule } => format!("--broadcast={}={}", name, rule),
            Self::Filter => "--filter".to_string(),
        }
    }
}

/// Which bus a set of `DBusRule`s apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DBusBus {
    Session,
    System,
}

/// An action deferred until a running child exists (§3 `Hook`), e.g.
/// attaching slirp4netns to the sandbox's init PID.
#[derive(Debug, Clone)]
pub enum Hook {
    AttachSlirp4netns,
    AttachPasta,
    ApplyNamespaceLimits,
}

/// The merged product of the Config merger (C6): everything the Runner
/// needs to assemble a concrete bwrap invocation (§3 `BwrapConfig`).
#[derive(Debug, Clone, Default)]
pub struct BwrapConfig {
    pub bind_ops: Vec<BindOp>,
    pub env: BTreeMap<String, String>,
    pub dbus_session_rules: Vec<DBusRule>,
    pub dbus_system_rules: Vec<DBusRule>,
    pub seccomp_rules: Vec<SeccompRule>,
    pub unshare: Vec<ShareKind>,
    pub share: Vec<ShareKind>,
    pub namespace_limits: BTreeMap<NsKind, i64>,
    pub startup_hooks: Vec<Hook>,
    pub argv: Vec<String>,
    pub envp_override: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bind_op_dst_extraction() {
        let op = BindOp::Bind {
            src: "/home/user/Downloads".into(),
            dst: "/home/sandbox/Downloads".into(),
            readonly: false,
            try_: false,
        };
        assert_eq!(op.dst(), Some("/home/sandbox/Downloads"));

        let op = BindOp::EnvSet { key: "FOO".into(), value: "bar".into() };
        assert_eq!(op.dst(), None);
    }

    #[test]
    fn dbus_rule_proxy_args() {
        assert_eq!(DBusRule::Talk { name: "org.freedesktop.Notifications".into() }.to_proxy_arg(), "--talk=org.freedesktop.Notifications");
        assert_eq!(DBusRule::Filter.to_proxy_arg(), "--filter");
    }
}
