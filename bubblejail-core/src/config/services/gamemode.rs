/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::{BusRule, Service}, value::{DBusBus, DBusRule}};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Gamemode {}

#[typetag::serde(name = "gamemode")]
impl Service for Gamemode {
    fn name(&self) -> &'static str {
        "gamemode"
    }

    fn description(&self) -> &'static str {
        "Allows requesting GameMode's performance optimizations"
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        vec![(DBusBus::Session, DBusRule::Talk { name: "com.feralinteractive.GameMode".into() })]
    }
}
