/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::{config::{service::Service, value::BindOp}, constants::XDG_RUNTIME_DIR};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Pipewire {}

#[typetag::serde(name = "pipewire")]
impl Service for Pipewire {
    fn name(&self) -> &'static str {
        "pipewire"
    }

    fn description(&self) -> &'static str {
        "Grants access to the host PipeWire socket"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        vec![BindOp::Bind {
            src: format!("{}/pipewire-0", *XDG_RUNTIME_DIR),
            dst: "/run/pipewire-0".into(),
            readonly: false,
            try_: true,
        }]
    }
}
