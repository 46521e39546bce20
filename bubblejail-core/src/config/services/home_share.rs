/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::{config::{service::Service, value::BindOp}, constants::{HOME, SANDBOX_HOME}};

/// Binds selected subdirectories of the real home into the sandbox
/// home (§8 scenario C). Paths are relative to `$HOME`; a missing
/// source is a fatal `BindSourceMissing` (non-`try` bind, per §3).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct HomeShare {
    pub home_paths: Vec<String>,
}

#[typetag::serde(name = "home_share")]
impl Service for HomeShare {
    fn name(&self) -> &'static str {
        "home_share"
    }

    fn description(&self) -> &'static str {
        "Binds chosen host home subdirectories into the sandbox home"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        self.home_paths
            .iter()
            .map(|rel| BindOp::Bind {
                src: format!("{}/{}", *HOME, rel),
                dst: format!("{}/{}", SANDBOX_HOME, rel),
                readonly: false,
                try_: false,
            })
            .collect()
    }
}
