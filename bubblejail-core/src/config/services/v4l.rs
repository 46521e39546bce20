/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::BindOp};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct V4l {}

#[typetag::serde(name = "v4l")]
impl Service for V4l {
    fn name(&self) -> &'static str {
        "v4l"
    }

    fn pretty_name(&self) -> &'static str {
        "Video4Linux"
    }

    fn description(&self) -> &'static str {
        "Grants access to host Video4Linux (webcam) devices"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        vec![BindOp::DevBind { src: "/dev/video0".into(), dst: "/dev/video0".into(), try_: true }]
    }
}
