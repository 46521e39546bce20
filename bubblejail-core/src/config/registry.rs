/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::de::DeserializeOwned;

use crate::{
    config::{
        service::Service,
        services::{
            common::Common, debug::Debug, direct_rendering::DirectRendering, fcitx::Fcitx, gamemode::Gamemode,
            home_share::HomeShare, ibus::Ibus, joystick::Joystick, mpris::Mpris, namespaces_limits::NamespacesLimits,
            network::Network, notify::Notify, openjdk::OpenJdk, pasta_network::PastaNetwork, pipewire::Pipewire,
            pulse_audio::PulseAudio, root_share::RootShare, slirp4netns::Slirp4netns, systray::Systray, v4l::V4l,
            wayland::Wayland, x11::X11, xdg_desktop_portal::XdgDesktopPortal,
        },
    },
    err,
    impl_error,
    Error,
    ErrorKind,
    ErrorTrait,
    Result,
};

/// Stable, man-page order (§4.1 C4 `list()`), `common` first since it
/// is implicit in every instance.
pub const SERVICE_NAMES: &[&str] = &[
    "common",
    "x11",
    "wayland",
    "network",
    "pulse_audio",
    "home_share",
    "direct_rendering",
    "systray",
    "joystick",
    "root_share",
    "openjdk",
    "notify",
    "ibus",
    "fcitx",
    "slirp4netns",
    "pasta_network",
    "namespaces_limits",
    "v4l",
    "pipewire",
    "gamemode",
    "mpris",
    "xdg_desktop_portal",
    "debug",
];

#[derive(Debug)]
pub enum RegistryError {
    UnknownService(String),
}

impl Display for RegistryError {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::UnknownService(name) => write!(fmter, "Unknown service '{}'", name),
        }
    }
}

impl_error!(RegistryError, 1);

/// Constructs a `Service` trait object with its schema defaults from
/// nothing but the name — used when a table is present but empty,
/// since "activation is equivalent to the table existing" (§3).
pub fn default_service(name: &str) -> Result<Box<dyn Service>> {
    Ok(match name {
        "common" => Box::new(Common::default()),
        "x11" => Box::new(X11::default()),
        "wayland" => Box::new(Wayland::default()),
        "network" => Box::new(Network::default()),
        "pulse_audio" => Box::new(PulseAudio::default()),
        "home_share" => Box::new(HomeShare::default()),
        "direct_rendering" => Box::new(DirectRendering::default()),
        "systray" => Box::new(Systray::default()),
        "joystick" => Box::new(Joystick::default()),
        "root_share" => Box::new(RootShare::default()),
        "openjdk" => Box::new(OpenJdk::default()),
        "notify" => Box::new(Notify::default()),
        "ibus" => Box::new(Ibus::default()),
        "fcitx" => Box::new(Fcitx::default()),
        "slirp4netns" => Box::new(Slirp4netns::default()),
        "pasta_network" => Box::new(PastaNetwork::default()),
        "namespaces_limits" => Box::new(NamespacesLimits::default()),
        "v4l" => Box::new(V4l::default()),
        "pipewire" => Box::new(Pipewire::default()),
        "gamemode" => Box::new(Gamemode::default()),
        "mpris" => Box::new(Mpris::default()),
        "xdg_desktop_portal" => Box::new(XdgDesktopPortal::default()),
        "debug" => Box::new(Debug::default()),
        other => err!(RegistryError::UnknownService(other.to_string()))?,
    })
}

/// Deserializes a single `[service_name]` table from `services.toml` into
/// its concrete type, then boxes it. An explicit match rather than
/// typetag's internally-tagged `Deserialize` for `Box<dyn Service>`,
/// since the on-disk format keys services by table name (§6) and never
/// carries the `service` tag typetag expects embedded in the value.
pub fn from_table(name: &str, table: toml::Value) -> Result<Box<dyn Service>> {
    fn parse<T: DeserializeOwned>(name: &str, table: toml::Value) -> Result<T> {
        T::deserialize(table).map_err(|e| Error::new(Box::new(ErrorKind::ConfigParseError(name.to_string(), e.to_string()))))
    }

    let service: Box<dyn Service> = match name {
        "common" => Box::new(parse::<Common>(name, table)?),
        "x11" => Box::new(parse::<X11>(name, table)?),
        "wayland" => Box::new(parse::<Wayland>(name, table)?),
        "network" => Box::new(parse::<Network>(name, table)?),
        "pulse_audio" => Box::new(parse::<PulseAudio>(name, table)?),
        "home_share" => Box::new(parse::<HomeShare>(name, table)?),
        "direct_rendering" => Box::new(parse::<DirectRendering>(name, table)?),
        "systray" => Box::new(parse::<Systray>(name, table)?),
        "joystick" => Box::new(parse::<Joystick>(name, table)?),
        "root_share" => Box::new(parse::<RootShare>(name, table)?),
        "openjdk" => Box::new(parse::<OpenJdk>(name, table)?),
        "notify" => Box::new(parse::<Notify>(name, table)?),
        "ibus" => Box::new(parse::<Ibus>(name, table)?),
        "fcitx" => Box::new(parse::<Fcitx>(name, table)?),
        "slirp4netns" => Box::new(parse::<Slirp4netns>(name, table)?),
        "pasta_network" => Box::new(parse::<PastaNetwork>(name, table)?),
        "namespaces_limits" => Box::new(parse::<NamespacesLimits>(name, table)?),
        "v4l" => Box::new(parse::<V4l>(name, table)?),
        "pipewire" => Box::new(parse::<Pipewire>(name, table)?),
        "gamemode" => Box::new(parse::<Gamemode>(name, table)?),
        "mpris" => Box::new(parse::<Mpris>(name, table)?),
        "xdg_desktop_portal" => Box::new(parse::<XdgDesktopPortal>(name, table)?),
        "debug" => Box::new(parse::<Debug>(name, table)?),
        other => err!(RegistryError::UnknownService(other.to_string()))?,
    };

    service.validate()?;
    Ok(service)
}

pub fn is_known_service(name: &str) -> bool {
    SERVICE_NAMES.contains(&name)
}

/// C4 `list()`.
pub fn list() -> &'static [&'static str] {
    SERVICE_NAMES
}

/// C4 `conflict_check`: returns the first pair of simultaneously
/// active services violating either side's `conflicts` list — the
/// relation is treated as symmetric even if only one side declares it
/// (§8 invariant 2).
pub fn conflict_check(active: &[Box<dyn Service>]) -> Option<(String, String)> {
    for (i, a) in active.iter().enumerate() {
        for b in active.iter().skip(i + 1) {
            if a.conflicts().contains(&b.name()) || b.conflicts().contains(&a.name()) {
                return Some((a.name().to_string(), b.name().to_string()));
            }
        }
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conflict_check_is_symmetric() {
        let active: Vec<Box<dyn Service>> =
            vec![default_service("network").unwrap(), default_service("slirp4netns").unwrap()];

        let conflict = conflict_check(&active).expect("expected a conflict");
        assert!(
            (conflict.0 == "network" && conflict.1 == "slirp4netns")
                || (conflict.0 == "slirp4netns" && conflict.1 == "network")
        );
    }

    #[test]
    fn no_conflict_for_compatible_services() {
        let active: Vec<Box<dyn Service>> = vec![default_service("x11").unwrap(), default_service("wayland").unwrap()];
        assert!(conflict_check(&active).is_none());
    }

    #[test]
    fn unknown_service_rejected() {
        assert!(default_service("not-a-real-service").is_err());
    }

    #[test]
    fn every_listed_service_constructs() {
        for name in SERVICE_NAMES {
            assert!(default_service(name).is_ok(), "service '{}' failed to construct", name);
        }
    }

    #[test]
    fn from_table_parses_populated_fields() {
        let table: toml::Value = toml::from_str("home_paths = [\"Downloads\", \"Projects\"]").unwrap();
        let service = from_table("home_share", table).unwrap();
        assert_eq!(service.name(), "home_share");
    }

    #[test]
    fn from_table_rejects_unknown_service() {
        let table: toml::Value = toml::from_str("").unwrap();
        assert!(from_table("not-a-real-service", table).is_err());
    }

    #[test]
    fn from_table_rejects_unknown_key() {
        let table: toml::Value = toml::from_str("bogus_option = true").unwrap();
        assert!(from_table("pulse_audio", table).is_err());
    }

    #[test]
    fn from_table_accepts_empty_table_for_unit_service() {
        let table: toml::Value = toml::from_str("").unwrap();
        assert!(from_table("pulse_audio", table).is_ok());
    }

    #[test]
    fn from_table_rejects_out_of_range_namespace_limit() {
        let table: toml::Value = toml::from_str("user = -5").unwrap();
        assert!(from_table("namespaces_limits", table).is_err());
    }

    #[test]
    fn from_table_accepts_unlimited_namespace_limit() {
        let table: toml::Value = toml::from_str("user = -1").unwrap();
        assert!(from_table("namespaces_limits", table).is_ok());
    }

    /// `Box<dyn Service>` round-trips through typetag's internally
    /// tagged representation even though `services.toml` itself is
    /// parsed through [`from_table`] — this is exercised by the
    /// `--dry-run` service dump and by inter-process state handoff.
    #[test]
    fn dyn_service_roundtrips_through_typetag() {
        let active: Vec<Box<dyn Service>> =
            vec![default_service("x11").unwrap(), default_service("home_share").unwrap()];

        let json = serde_json::to_string(&active).unwrap();
        let restored: Vec<Box<dyn Service>> = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].name(), "x11");
        assert_eq!(restored[1].name(), "home_share");
    }
}
