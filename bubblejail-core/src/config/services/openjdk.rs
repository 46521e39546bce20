/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::BindOp};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct OpenJdk {}

#[typetag::serde(name = "openjdk")]
impl Service for OpenJdk {
    fn name(&self) -> &'static str {
        "openjdk"
    }

    fn pretty_name(&self) -> &'static str {
        "OpenJDK"
    }

    fn description(&self) -> &'static str {
        "Binds the host JVM installation so sandboxed Java applications can launch"
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        let mut ops = Vec::new();

        for candidate in ["/usr/lib/jvm", "/etc/java-openjdk"] {
            if Path::new(candidate).exists() {
                ops.push(BindOp::Bind { src: candidate.into(), dst: candidate.into(), readonly: true, try_: true });
            }
        }

        ops
    }
}
