/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    collections::BTreeSet,
    fs::{create_dir, create_dir_all, read_dir, read_to_string, write},
    path::{Path, PathBuf},
};

use crate::{
    config::{
        registry::{default_service, from_table, is_known_service},
        service::Service,
    },
    constants::{INSTANCES_DIR, PROFILES_PACKAGED_DIR, PROFILES_SYSTEM_DIR, PROFILES_USER_DIR},
    err,
    lock::Lock,
    utils::print_warning,
    ErrorGeneric,
    ErrorKind,
    Result,
};

fn instance_dir(name: &str) -> PathBuf {
    Path::new(*INSTANCES_DIR).join(name)
}

/// Turns the `[service_name]` tables of a parsed `services.toml`/profile
/// document into activated instances, synthesizing `common` with its
/// schema defaults when the document omits it (§3: `common` is implicit).
fn services_from_table(table: toml::value::Table) -> Result<Vec<Box<dyn Service>>> {
    let mut services = Vec::with_capacity(table.len() + 1);
    let mut saw_common = false;

    for (name, value) in table {
        if !is_known_service(&name) {
            err!(ErrorKind::ConfigParseError(name.clone(), "unknown service".to_string()))?
        }

        saw_common |= name == "common";
        let service = from_table(&name, value)?;
        warn_on_load(service.as_ref());
        services.push(service);
    }

    if !saw_common {
        services.insert(0, default_service("common")?);
    }

    Ok(services)
}

/// Surfaces a deprecated/experimental service, or a deprecated option
/// within an otherwise-current one, as a warning at load time rather
/// than silently accepting it (§4.1 `validate`).
fn warn_on_load(service: &dyn Service) {
    if service.deprecated() {
        print_warning(&format!("service '{}' is deprecated", service.name()));
    }
    if service.experimental() {
        print_warning(&format!("service '{}' is experimental", service.name()));
    }
    for warning in service.option_warnings() {
        print_warning(&format!("{}: {}", service.name(), warning));
    }
}

/// Inverse of [`services_from_table`]: flattens each service's fields
/// back to a TOML table keyed by service name, round-tripping through
/// `serde_json` since `typetag`'s `Box<dyn Service>` serialization is
/// internally tagged (§8 invariant 3 — round-trip preserves content,
/// the `service` discriminant is a wire-only artifact of that bridge).
fn services_to_table(services: &[Box<dyn Service>]) -> Result<toml::value::Table> {
    let mut out = toml::value::Table::new();

    for service in services {
        let json = serde_json::to_value(service).prepend(|| format!("serializing service '{}'", service.name()))?;
        let mut fields = match json {
            serde_json::Value::Object(obj) => obj,
            _ => continue,
        };
        fields.remove("service");

        if let Some(toml::Value::Table(table)) = json_to_toml(serde_json::Value::Object(fields)) {
            out.insert(service.name().to_string(), toml::Value::Table(table));
        }
    }

    Ok(out)
}

/// `None` on `Null` drops the key entirely — a missing table entry
/// already means "default" (§3 `ServiceOptions`), so there is no TOML
/// representation an `Option::None` field needs to round-trip through.
fn json_to_toml(value: serde_json::Value) -> Option<toml::Value> {
    use serde_json::Value as J;
    use toml::Value as T;

    Some(match value {
        J::Null => return None,
        J::Bool(b) => T::Boolean(b),
        J::Number(n) => {
            if let Some(i) = n.as_i64() {
                T::Integer(i)
            } else if let Some(f) = n.as_f64() {
                T::Float(f)
            } else {
                return None;
            }
        }
        J::String(s) => T::String(s),
        J::Array(items) => T::Array(items.into_iter().filter_map(json_to_toml).collect()),
        J::Object(obj) => {
            let mut table = toml::value::Table::new();
            for (k, v) in obj {
                if let Some(tv) = json_to_toml(v) {
                    table.insert(k, tv);
                }
            }
            T::Table(table)
        }
    })
}

fn parse_toml(path: &Path) -> Result<toml::value::Table> {
    let text = read_to_string(path).prepend_io(|| path.display().to_string())?;
    match toml::from_str::<toml::Value>(&text) {
        Ok(toml::Value::Table(table)) => Ok(table),
        Ok(_) => err!(ErrorKind::ConfigParseError(path.display().to_string(), "document is not a table".to_string())),
        Err(e) => err!(ErrorKind::ConfigParseError(path.display().to_string(), e.to_string())),
    }
}

/// Named on-disk object (§3 `Instance`): a `home` directory plus the
/// authoritative `services.toml`. Created by `create`, mutated by
/// `edit`, never auto-destroyed.
pub struct Instance {
    pub name: String,
    dir: PathBuf,
}

impl Instance {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn home_dir(&self) -> PathBuf {
        self.dir.join("home")
    }

    pub fn services_path(&self) -> PathBuf {
        self.dir.join("services.toml")
    }

    pub fn lock(&self) -> Lock {
        Lock::new(&self.dir)
    }

    pub fn exists(name: &str) -> bool {
        instance_dir(name).exists()
    }

    pub fn load(name: &str) -> Result<Self> {
        let dir = instance_dir(name);
        if !dir.exists() {
            err!(ErrorKind::InstanceNotFound(name.to_string()))?
        }

        Ok(Self { name: name.to_string(), dir })
    }

    /// Creates a fresh instance directory seeded from `profile`'s
    /// default services, or a bare `common` if none is given.
    pub fn create(name: &str, profile: Option<&Profile>) -> Result<Self> {
        create_dir_all(*INSTANCES_DIR).prepend_io(|| (*INSTANCES_DIR).to_string())?;

        let dir = instance_dir(name);
        create_dir(&dir).prepend_io(|| format!("instance '{}' already exists", name))?;
        create_dir_all(dir.join("home")).prepend_io(|| "home directory".to_string())?;

        let instance = Self { name: name.to_string(), dir };
        let services = match profile {
            Some(profile) => profile.services()?,
            None => vec![default_service("common")?],
        };
        instance.save_services(&services)?;
        Ok(instance)
    }

    pub fn load_services(&self) -> Result<Vec<Box<dyn Service>>> {
        services_from_table(parse_toml(&self.services_path())?)
    }

    pub fn save_services(&self, services: &[Box<dyn Service>]) -> Result<()> {
        let table = services_to_table(services)?;
        let text = toml::to_string_pretty(&toml::Value::Table(table))
            .prepend(|| format!("serializing services.toml for '{}'", self.name))?;
        write(self.services_path(), text).prepend_io(|| self.services_path().display().to_string())
    }

    /// Every instance currently in the store, alphabetically.
    pub fn list() -> Result<Vec<String>> {
        let mut names = Vec::new();
        let root = Path::new(*INSTANCES_DIR);
        if !root.exists() {
            return Ok(names);
        }

        for entry in read_dir(root).prepend_io(|| (*INSTANCES_DIR).to_string())? {
            let entry = entry.prepend_io(|| (*INSTANCES_DIR).to_string())?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Immutable template (§3 `Profile`): a sequence of default-activated
/// services plus desktop-entry metadata. Never mutated; inputs to
/// `create` only.
pub struct Profile {
    pub name: String,
    pub desktop_entry_name: Option<String>,
    pub import_tips: Option<String>,
    pub executable_name_hint: Option<String>,
    services: toml::value::Table,
}

impl Profile {
    /// Search order is user, system, packaged — the first hit wins, so
    /// a user profile shadows a system one which shadows a packaged one
    /// (§3).
    pub fn find(name: &str) -> Result<Self> {
        for dir in [*PROFILES_USER_DIR, *PROFILES_SYSTEM_DIR, *PROFILES_PACKAGED_DIR] {
            let path = Path::new(dir).join(format!("{}.toml", name));
            if path.exists() {
                return Self::parse(name, &path);
            }
        }

        err!(ErrorKind::ProfileNotFound(name.to_string()))
    }

    fn parse(name: &str, path: &Path) -> Result<Self> {
        let mut table = parse_toml(path)?;
        let meta = table.remove("profile");

        let (desktop_entry_name, import_tips, executable_name_hint) = match meta {
            Some(toml::Value::Table(meta)) => (
                meta.get("desktop_entry_name").and_then(|v| v.as_str()).map(str::to_string),
                meta.get("import_tips").and_then(|v| v.as_str()).map(str::to_string),
                meta.get("executable_name_hint").and_then(|v| v.as_str()).map(str::to_string),
            ),
            _ => (None, None, None),
        };

        Ok(Self { name: name.to_string(), desktop_entry_name, import_tips, executable_name_hint, services: table })
    }

    pub fn services(&self) -> Result<Vec<Box<dyn Service>>> {
        services_from_table(self.services.clone())
    }

    /// Every profile name visible across the three search locations,
    /// deduplicated (a user profile hides a same-named system one).
    pub fn list() -> Result<Vec<String>> {
        let mut seen = BTreeSet::new();

        for dir in [*PROFILES_USER_DIR, *PROFILES_SYSTEM_DIR, *PROFILES_PACKAGED_DIR] {
            let dir = Path::new(dir);
            if !dir.exists() {
                continue;
            }

            for entry in read_dir(dir).prepend_io(|| dir.display().to_string())? {
                let entry = entry.prepend_io(|| dir.display().to_string())?;
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        seen.insert(stem.to_string());
                    }
                }
            }
        }

        Ok(seen.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn services_table_roundtrip_synthesizes_common() {
        let mut table = toml::value::Table::new();
        table.insert("x11".to_string(), toml::Value::Table(toml::value::Table::new()));

        let services = services_from_table(table).unwrap();
        assert!(services.iter().any(|s| s.name() == "common"));
        assert!(services.iter().any(|s| s.name() == "x11"));
    }

    #[test]
    fn unknown_service_table_key_rejected() {
        let mut table = toml::value::Table::new();
        table.insert("not-a-real-service".to_string(), toml::Value::Table(toml::value::Table::new()));
        assert!(services_from_table(table).is_err());
    }

    #[test]
    fn services_roundtrip_through_table() {
        let original = vec![default_service("common").unwrap(), default_service("home_share").unwrap()];
        let table = services_to_table(&original).unwrap();
        assert!(table.contains_key("common"));
        assert!(table.contains_key("home_share"));

        let restored = services_from_table(table).unwrap();
        assert_eq!(restored.len(), original.len());
    }
}
