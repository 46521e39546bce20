/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::{BusRule, Service}, value::{DBusBus, DBusRule}};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Notify {}

#[typetag::serde(name = "notify")]
impl Service for Notify {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn description(&self) -> &'static str {
        "Allows sending desktop notifications"
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        vec![(DBusBus::Session, DBusRule::Talk { name: "org.freedesktop.Notifications".into() })]
    }
}
