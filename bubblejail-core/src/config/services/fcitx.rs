/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::{BusRule, Service}, value::{DBusBus, DBusRule}};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Fcitx {}

#[typetag::serde(name = "fcitx")]
impl Service for Fcitx {
    fn name(&self) -> &'static str {
        "fcitx"
    }

    fn description(&self) -> &'static str {
        "Grants access to the Fcitx input method framework"
    }

    fn conflicts(&self) -> &'static [&'static str] {
        &["ibus"]
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        vec![(DBusBus::Session, DBusRule::Own { name: "org.fcitx.Fcitx5".into() })]
    }
}
