/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::BindOp};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Joystick {}

#[typetag::serde(name = "joystick")]
impl Service for Joystick {
    fn name(&self) -> &'static str {
        "joystick"
    }

    fn description(&self) -> &'static str {
        "Grants access to host joystick/gamepad input devices"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        vec![
            BindOp::DevBind { src: "/dev/input".into(), dst: "/dev/input".into(), try_: true },
            BindOp::Bind { src: "/run/udev".into(), dst: "/run/udev".into(), readonly: true, try_: true },
        ]
    }
}
