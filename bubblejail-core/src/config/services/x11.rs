/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::{
    config::{service::Service, value::BindOp},
    constants::{X11_DISPLAY, XAUTHORITY},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct X11 {
    pub enabled: bool,
}

impl Default for X11 {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[typetag::serde(name = "x11")]
impl Service for X11 {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn pretty_name(&self) -> &'static str {
        "X11"
    }

    fn description(&self) -> &'static str {
        "Grants access to the host's X11 display"
    }

    fn conflicts(&self) -> &'static [&'static str] {
        &[]
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        let mut ops = vec![BindOp::Bind {
            src: "/tmp/.X11-unix".into(),
            dst: "/tmp/.X11-unix".into(),
            readonly: false,
            try_: true,
        }];

        if !X11_DISPLAY.is_empty() {
            ops.push(BindOp::EnvSet { key: "DISPLAY".into(), value: X11_DISPLAY.to_string() });
        }

        if !XAUTHORITY.is_empty() {
            ops.push(BindOp::Bind {
                src: XAUTHORITY.to_string(),
                dst: "/tmp/.Xauthority".into(),
                readonly: true,
                try_: true,
            });
            ops.push(BindOp::EnvSet { key: "XAUTHORITY".into(), value: "/tmp/.Xauthority".into() });
        }

        ops
    }
}
