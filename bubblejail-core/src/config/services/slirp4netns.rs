/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::Hook};

/// Attaches `slirp4netns` to the sandbox's init PID after bwrap starts
/// (§4.5 step 8). Conflicts with `network` (redundant) and with
/// `namespaces_limits` because slirp needs a fresh mount namespace
/// (§4.1, §9 open question).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Slirp4netns {
    pub outbound_addr: Option<String>,
}

#[typetag::serde(name = "slirp4netns")]
impl Service for Slirp4netns {
    fn name(&self) -> &'static str {
        "slirp4netns"
    }

    fn description(&self) -> &'static str {
        "User-mode networking via slirp4netns"
    }

    fn conflicts(&self) -> &'static [&'static str] {
        &["network", "namespaces_limits"]
    }

    fn iter_startup_hooks(&self) -> Vec<Hook> {
        vec![Hook::AttachSlirp4netns]
    }
}
