/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::{
    config::{service::Service, value::BindOp},
    constants::XDG_RUNTIME_DIR,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PulseAudio {}

#[typetag::serde(name = "pulse_audio")]
impl Service for PulseAudio {
    fn name(&self) -> &'static str {
        "pulse_audio"
    }

    fn description(&self) -> &'static str {
        "Grants access to the host PulseAudio/PipeWire-pulse socket"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        let socket = format!("{}/pulse/native", *XDG_RUNTIME_DIR);

        vec![
            BindOp::Bind { src: socket, dst: "/run/pulse/native".into(), readonly: false, try_: true },
            BindOp::EnvSet { key: "PULSE_SERVER".into(), value: "unix:/run/pulse/native".into() },
        ]
    }
}
