/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::Hook};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PastaNetwork {
    pub port_forward: Vec<String>,
}

#[typetag::serde(name = "pasta_network")]
impl Service for PastaNetwork {
    fn name(&self) -> &'static str {
        "pasta_network"
    }

    fn description(&self) -> &'static str {
        "User-mode networking via pasta"
    }

    fn conflicts(&self) -> &'static [&'static str] {
        &["network"]
    }

    fn iter_startup_hooks(&self) -> Vec<Hook> {
        vec![Hook::AttachPasta]
    }
}
