/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::{
    config::{service::{BusRule, Service}, value::{BindOp, DBusBus, DBusRule}},
    constants::XDG_RUNTIME_DIR,
};

/// Conflicts with `fcitx` (§4.1): only one input-method framework may
/// be exposed to the sandbox at a time.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Ibus {}

#[typetag::serde(name = "ibus")]
impl Service for Ibus {
    fn name(&self) -> &'static str {
        "ibus"
    }

    fn pretty_name(&self) -> &'static str {
        "IBus"
    }

    fn description(&self) -> &'static str {
        "Grants access to the IBus input method framework"
    }

    fn conflicts(&self) -> &'static [&'static str] {
        &["fcitx"]
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        vec![BindOp::Bind {
            src: format!("{}/ibus/bus", *XDG_RUNTIME_DIR),
            dst: "/run/ibus/bus".into(),
            readonly: false,
            try_: true,
        }]
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        vec![(DBusBus::Session, DBusRule::Talk { name: "org.freedesktop.IBus".into() })]
    }
}
