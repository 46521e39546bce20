/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{collections::BTreeMap, fmt::Debug};

use dyn_clone::{clone_trait_object, DynClone};

use crate::{config::value::{BindOp, DBusRule, Hook, NsKind, SeccompRule}, Result};

/// Which bus a rule applies to, paired with the rule itself so a
/// service can emit both session- and system-bus rules from one call.
pub type BusRule = (crate::config::value::DBusBus, DBusRule);

/// A capability provider (§3 "Service instance"). Each built-in
/// service is a `typetag`-tagged, config-deserialized trait object so
/// the registry can hold a heterogeneous `Vec<Box<dyn Service>>`
/// without an enum-of-everything — the same polymorphism idiom the
/// template uses for its `Permission`/`Filesystem`/`Dbus` families,
/// collapsed here into one trait per the unified `Service` contract.
///
/// Services never call each other (§9): they only emit opaque
/// `BindOp`/`DBusRule`/`SeccompRule`/`Hook` values into the merger.
#[typetag::serde(tag = "service")]
pub trait Service: Debug + DynClone + Send + Sync {
    fn name(&self) -> &'static str;

    fn pretty_name(&self) -> &'static str {
        self.name()
    }

    fn description(&self) -> &'static str {
        ""
    }

    /// Other service names that may not be active alongside this one.
    /// `conflict_check` (C4) treats this as symmetric.
    fn conflicts(&self) -> &'static [&'static str] {
        &[]
    }

    fn deprecated(&self) -> bool {
        false
    }

    fn experimental(&self) -> bool {
        false
    }

    /// Warnings about this instance's *parsed option values* rather
    /// than the service as a whole — e.g. a single deprecated key
    /// within an otherwise-current service (§4.1 `validate`, §9
    /// `share_local_time`: "accept-but-warn, treat as no-op").
    fn option_warnings(&self) -> Vec<String> {
        Vec::new()
    }

    /// Rejects an otherwise well-typed but out-of-range option value
    /// (§4.1 `validate`) — unlike [`Service::option_warnings`], a
    /// failure here is fatal, not advisory.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// The instance's default launch command, if this service provides
    /// one (only `common`'s `executable_name` does) — used when the
    /// `run` command itself supplies no ARGS (§4.5 step 11).
    fn default_argv(&self) -> Vec<String> {
        Vec::new()
    }

    fn iter_bind_args(&self) -> Vec<BindOp> {
        Vec::new()
    }

    fn iter_dbus_rules(&self) -> Vec<BusRule> {
        Vec::new()
    }

    fn iter_seccomp_rules(&self) -> Vec<SeccompRule> {
        Vec::new()
    }

    fn iter_startup_hooks(&self) -> Vec<Hook> {
        Vec::new()
    }

    fn iter_namespace_limits(&self) -> BTreeMap<NsKind, i64> {
        BTreeMap::new()
    }
}

clone_trait_object!(Service);
