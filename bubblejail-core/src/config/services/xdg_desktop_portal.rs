/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::{BusRule, Service}, value::{DBusBus, DBusRule}};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct XdgDesktopPortal {}

#[typetag::serde(name = "xdg_desktop_portal")]
impl Service for XdgDesktopPortal {
    fn name(&self) -> &'static str {
        "xdg_desktop_portal"
    }

    fn pretty_name(&self) -> &'static str {
        "XDG Desktop Portal"
    }

    fn description(&self) -> &'static str {
        "Allows talking to xdg-desktop-portal for file chooser, screenshot, etc. requests"
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        vec![
            (DBusBus::Session, DBusRule::Talk { name: "org.freedesktop.portal.Desktop".into() }),
            (DBusBus::Session, DBusRule::Talk { name: "org.freedesktop.portal.Documents".into() }),
        ]
    }
}
