/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::BindOp};

/// Grants GPU device access, probing for what the host actually
/// exposes (§4.1: "detects devices under `/dev/dri`,
/// `/sys/module/nvidia/initstate`, `/sys/devices/system/cpu`").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DirectRendering {
    pub enable_nvidia: bool,
}

#[typetag::serde(name = "direct_rendering")]
impl Service for DirectRendering {
    fn name(&self) -> &'static str {
        "direct_rendering"
    }

    fn pretty_name(&self) -> &'static str {
        "Direct Rendering"
    }

    fn description(&self) -> &'static str {
        "Grants GPU device access for hardware-accelerated rendering"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        let mut ops = Vec::new();

        if Path::new("/dev/dri").exists() {
            ops.push(BindOp::DevBind { src: "/dev/dri".into(), dst: "/dev/dri".into(), try_: true });
        }

        if self.enable_nvidia && Path::new("/sys/module/nvidia/initstate").exists() {
            for entry in ["/dev/nvidia0", "/dev/nvidiactl", "/dev/nvidia-modeset", "/dev/nvidia-uvm"] {
                ops.push(BindOp::DevBind { src: entry.into(), dst: entry.into(), try_: true });
            }
        }

        if Path::new("/sys/devices/system/cpu").exists() {
            ops.push(BindOp::Bind {
                src: "/sys/devices/system/cpu".into(),
                dst: "/sys/devices/system/cpu".into(),
                readonly: true,
                try_: true,
            });
        }

        ops
    }
}
