/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::{BindOp, SeccompRule}};

/// Escape hatch (§3 `Arg`, §4.6): raw extra bwrap argv and explicit
/// seccomp `Allow` overrides of the baseline denylist. Always merged
/// last (§4.2) so its raw args land after every other service's.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Debug {
    pub raw_bwrap_args: Vec<String>,
    pub allow_syscalls: Vec<String>,
}

#[typetag::serde(name = "debug")]
impl Service for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn description(&self) -> &'static str {
        "Escape hatch for passing raw bwrap arguments and seccomp allow overrides"
    }

    fn experimental(&self) -> bool {
        true
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        self.raw_bwrap_args.iter().map(|raw| BindOp::Arg { raw: raw.clone() }).collect()
    }

    fn iter_seccomp_rules(&self) -> Vec<SeccompRule> {
        self.allow_syscalls.iter().map(|syscall| SeccompRule::Allow { syscall: syscall.clone() }).collect()
    }
}
