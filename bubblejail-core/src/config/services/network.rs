/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::Service, value::{BindOp, ShareKind}};

/// Shares the host network namespace outright. Mutually exclusive
/// with the two user-space network stacks (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Network {}

#[typetag::serde(name = "network")]
impl Service for Network {
    fn name(&self) -> &'static str {
        "network"
    }

    fn description(&self) -> &'static str {
        "Shares the host network namespace"
    }

    fn conflicts(&self) -> &'static [&'static str] {
        &["slirp4netns", "pasta_network"]
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        vec![
            BindOp::Share { kind: ShareKind::Net, unshare: false },
            BindOp::Bind { src: "/etc/resolv.conf".into(), dst: "/etc/resolv.conf".into(), readonly: true, try_: true },
        ]
    }
}
