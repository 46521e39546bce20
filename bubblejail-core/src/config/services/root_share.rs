/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::BindOp};

/// Binds arbitrary absolute host paths 1:1 into the sandbox. Runs
/// first among non-`common` services in merge order so its binds may
/// overlap with later service binds (§4.2's explicit collision
/// exception).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RootShare {
    pub paths: Vec<String>,
    pub read_only: bool,
}

#[typetag::serde(name = "root_share")]
impl Service for RootShare {
    fn name(&self) -> &'static str {
        "root_share"
    }

    fn description(&self) -> &'static str {
        "Binds arbitrary host paths into the sandbox at the same path"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        self.paths
            .iter()
            .map(|path| BindOp::Bind { src: path.clone(), dst: path.clone(), readonly: self.read_only, try_: false })
            .collect()
    }
}
