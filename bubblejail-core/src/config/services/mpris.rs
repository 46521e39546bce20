/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use serde::{Deserialize, Serialize};

use crate::config::{service::{BusRule, Service}, value::{DBusBus, DBusRule}};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Mpris {
    pub identity: Option<String>,
}

#[typetag::serde(name = "mpris")]
impl Service for Mpris {
    fn name(&self) -> &'static str {
        "mpris"
    }

    fn pretty_name(&self) -> &'static str {
        "MPRIS"
    }

    fn description(&self) -> &'static str {
        "Allows exposing media player controls over MPRIS"
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        let suffix = self.identity.as_deref().unwrap_or("*");
        vec![(DBusBus::Session, DBusRule::Own { name: format!("org.mpris.MediaPlayer2.{}", suffix) })]
    }
}
