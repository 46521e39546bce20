/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::{BusRule, Service}, value::{DBusBus, DBusRule}};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Systray {}

#[typetag::serde(name = "systray")]
impl Service for Systray {
    fn name(&self) -> &'static str {
        "systray"
    }

    fn description(&self) -> &'static str {
        "Allows registering a status notifier icon on the session tray"
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        vec![(DBusBus::Session, DBusRule::Talk { name: "org.kde.StatusNotifierWatcher".into() })]
    }
}
