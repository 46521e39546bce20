/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::{
    config::{service::Service, value::BindOp},
    constants::{WAYLAND_DISPLAY, XDG_RUNTIME_DIR},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Wayland {
    pub enabled: bool,
}

impl Default for Wayland {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[typetag::serde(name = "wayland")]
impl Service for Wayland {
    fn name(&self) -> &'static str {
        "wayland"
    }

    fn description(&self) -> &'static str {
        "Grants access to the host's Wayland display socket"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        if WAYLAND_DISPLAY.is_empty() {
            return Vec::new();
        }

        let socket = format!("{}/{}", *XDG_RUNTIME_DIR, *WAYLAND_DISPLAY);

        vec![
            BindOp::Bind { src: socket, dst: format!("/run/user/{}/{}", *crate::constants::UID, *WAYLAND_DISPLAY), readonly: false, try_: true },
            BindOp::EnvSet { key: "WAYLAND_DISPLAY".into(), value: WAYLAND_DISPLAY.to_string() },
        ]
    }
}
