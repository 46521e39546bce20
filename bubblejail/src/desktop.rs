/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::fs::{create_dir_all, write};

use bubblejail_core::{
    config::store::{Instance, Profile},
    constants::APPLICATIONS_DIR,
    err,
    utils::{arguments::Operand, Arguments},
    ErrorGeneric,
    ErrorKind,
    Result,
};

pub fn generate(args: &mut Arguments) -> Result<()> {
    let mut profile = None;
    let mut desktop_entry = None;
    let mut name = None;

    while let Some(arg) = args.next() {
        match arg {
            Operand::Short('p') | Operand::Long("profile") => match args.next() {
                Some(Operand::ShortPos('p', val)) | Some(Operand::LongPos("profile", val)) => profile = Some(val),
                _ => return args.invalid_operand(),
            },
            Operand::Long("desktop-entry") => match args.next() {
                Some(Operand::LongPos("desktop-entry", val)) => desktop_entry = Some(val),
                _ => return args.invalid_operand(),
            },
            Operand::Value(val) => name = Some(val),
            _ => return args.invalid_operand(),
        }
    }

    let instance = match name {
        Some(name) => name,
        None => return err!(ErrorKind::Message("Instance name not specified."))?,
    };

    generate_for(instance, profile, desktop_entry)
}

/// Writes `<APPLICATIONS_DIR>/bubblejail-<instance>.desktop` (§6), taking
/// the wrapped application's original name from `desktop_entry` if given,
/// else the profile's `desktop_entry_name`, else the instance name itself.
pub fn generate_for(instance: &str, profile: Option<&str>, desktop_entry: Option<&str>) -> Result<()> {
    if !Instance::exists(instance) {
        err!(ErrorKind::InstanceNotFound(instance.to_string()))?
    }

    let original_name = match (desktop_entry, profile) {
        (Some(name), _) => name.to_string(),
        (None, Some(profile)) => Profile::find(profile)?.desktop_entry_name.unwrap_or_else(|| instance.to_string()),
        (None, None) => instance.to_string(),
    };

    let entry = format!(
        "[Desktop Entry]
Type=Application
Name={original_name} (bubble)
Exec=bubblejail run {instance} --
Terminal=false
Categories=Utility;
",
    );

    create_dir_all(*APPLICATIONS_DIR).prepend_io(|| (*APPLICATIONS_DIR).to_string())?;

    let path = format!("{}/bubblejail-{}.desktop", *APPLICATIONS_DIR, instance);
    write(&path, entry).prepend_io(|| path.clone())?;
    eprintln!("Created '{}'.", path);
    Ok(())
}
