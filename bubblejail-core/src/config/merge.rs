/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::collections::BTreeMap;

use crate::{
    config::{
        registry::conflict_check,
        service::Service,
        value::{BindOp, BwrapConfig, DBusBus},
    },
    err,
    exec::seccomp::baseline_rules,
    ErrorKind,
    Result,
};

/// Orders `services` for bind/env application (§4.2): `common` first,
/// `root_share` immediately after it (it is allowed to overlap with
/// binds that come later, so it must run before them), the rest
/// alphabetically, `debug` last.
fn ordered_for_bind_ops<'a>(services: &'a [Box<dyn Service>]) -> Vec<&'a dyn Service> {
    let mut common = None;
    let mut root_share = None;
    let mut debug = None;
    let mut rest = Vec::new();

    for service in services {
        match service.name() {
            "common" => common = Some(service.as_ref()),
            "root_share" => root_share = Some(service.as_ref()),
            "debug" => debug = Some(service.as_ref()),
            _ => rest.push(service.as_ref()),
        }
    }

    rest.sort_by_key(|s| s.name());

    common.into_iter().chain(root_share).chain(rest).chain(debug).collect()
}

/// Folds a set of activated services' `iter_*` output into one
/// `BwrapConfig` (§4.2, C6). `argv`/`envp_override` are left for the
/// Runner to fill once it knows the actual command being run; the
/// Runner also materializes each `FileWrite` bind op's bytes to an
/// anonymous pipe right before spawning, rather than the merger
/// pre-allocating FDs here.
pub fn merge(services: &[Box<dyn Service>]) -> Result<BwrapConfig> {
    if let Some((a, b)) = conflict_check(services) {
        err!(ErrorKind::ServiceConflict(a, b))?
    }

    let ordered = ordered_for_bind_ops(services);
    let mut config = BwrapConfig::default();
    let mut claimed: BTreeMap<String, (String, bool)> = BTreeMap::new();

    for service in &ordered {
        for op in service.iter_bind_args() {
            if let Some(dst) = op.dst() {
                claim_dst(&mut claimed, dst, service.name(), op.is_readonly_bind())?;
            }

            match &op {
                BindOp::EnvSet { key, value } => {
                    config.env.insert(key.clone(), value.clone());
                }
                BindOp::EnvUnset { key } => {
                    config.env.remove(key);
                }
                BindOp::Share { kind, unshare } => {
                    if *unshare {
                        config.unshare.push(*kind);
                    } else {
                        config.share.push(*kind);
                    }
                }
                _ => {}
            }

            config.bind_ops.push(op);
        }

        for (bus, rule) in service.iter_dbus_rules() {
            match bus {
                DBusBus::Session => config.dbus_session_rules.push(rule),
                DBusBus::System => config.dbus_system_rules.push(rule),
            }
        }

        config.startup_hooks.extend(service.iter_startup_hooks());
        config.namespace_limits.extend(service.iter_namespace_limits());
    }

    config.seccomp_rules = baseline_rules();
    for service in &ordered {
        config.seccomp_rules.extend(service.iter_seccomp_rules());
    }

    Ok(config)
}

/// Registers `dst` as bound by `service`, enforcing §3's collision
/// invariant: a `dst` already claimed by a *different* service is only
/// permitted when either side is `root_share` (it runs first among
/// non-common services specifically so later services may overlap it,
/// §4.2) or both claims are read-only and one path contains the other.
fn claim_dst(claimed: &mut BTreeMap<String, (String, bool)>, dst: &str, service: &str, readonly: bool) -> Result<()> {
    if let Some((owner, owner_readonly)) = claimed.get(dst) {
        let allowed = owner == "root_share" || service == "root_share" || owner == service || (*owner_readonly && readonly);

        if !allowed {
            err!(ErrorKind::ConfigParseError(
                "services.toml".to_string(),
                format!("bind destination '{}' claimed by both '{}' and '{}'", dst, owner, service)
            ))?
        }
    }

    for (existing_dst, (owner, owner_readonly)) in claimed.iter() {
        if existing_dst == dst || owner == "root_share" || service == "root_share" {
            continue;
        }

        let contains = existing_dst.starts_with(&format!("{}/", dst)) || dst.starts_with(&format!("{}/", existing_dst));
        if contains && !(*owner_readonly && readonly) {
            err!(ErrorKind::ConfigParseError(
                "services.toml".to_string(),
                format!("bind destination '{}' overlaps '{}' claimed by '{}'", dst, existing_dst, owner)
            ))?
        }
    }

    claimed.insert(dst.to_string(), (service.to_string(), readonly));
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::registry::default_service;

    #[test]
    fn merge_is_deterministic() {
        let services = || vec![default_service("x11").unwrap(), default_service("common").unwrap(), default_service("wayland").unwrap()];

        let a = merge(&services()).unwrap();
        let b = merge(&services()).unwrap();

        let argv_a: Vec<String> = a.bind_ops.iter().filter_map(|op| op.dst().map(str::to_string)).collect();
        let argv_b: Vec<String> = b.bind_ops.iter().filter_map(|op| op.dst().map(str::to_string)).collect();
        assert_eq!(argv_a, argv_b);
    }

    #[test]
    fn conflicting_services_rejected() {
        let services = vec![default_service("network").unwrap(), default_service("slirp4netns").unwrap()];
        assert!(merge(&services).is_err());
    }

    #[test]
    fn root_share_may_overlap_later_binds() {
        let services = vec![default_service("common").unwrap(), default_service("root_share").unwrap(), default_service("home_share").unwrap()];
        assert!(merge(&services).is_ok());
    }

    #[test]
    fn seccomp_rules_include_baseline() {
        let services = vec![default_service("common").unwrap()];
        let config = merge(&services).unwrap();
        assert!(config.seccomp_rules.len() >= baseline_rules().len());
    }
}
