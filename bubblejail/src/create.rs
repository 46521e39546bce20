/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use bubblejail_core::{
    config::store::{Instance, Profile},
    err,
    utils::{arguments::Operand, Arguments},
    ErrorKind,
    Result,
};

use crate::desktop;

pub fn create(args: &mut Arguments) -> Result<()> {
    let mut profile = None;
    let mut no_desktop_entry = false;
    let mut name = None;

    while let Some(arg) = args.next() {
        match arg {
            Operand::Short('p') | Operand::Long("profile") => match args.next() {
                Some(Operand::ShortPos('p', val)) | Some(Operand::LongPos("profile", val)) => profile = Some(val),
                _ => return args.invalid_operand(),
            },
            Operand::Long("no-desktop-entry") => no_desktop_entry = true,
            Operand::Value(val) => name = Some(val),
            _ => return args.invalid_operand(),
        }
    }

    let name = match name {
        Some(name) => name,
        None => return err!(ErrorKind::Message("Instance name not specified."))?,
    };

    if Instance::exists(name) {
        err!(ErrorKind::Message("Instance already exists."))?
    }

    let resolved = match profile {
        Some(profile) => Some(Profile::find(profile)?),
        None => None,
    };

    Instance::create(name, resolved.as_ref())?;
    eprintln!("Created instance '{}'.", name);

    if !no_desktop_entry {
        desktop::generate_for(name, profile, None)?;
    }

    Ok(())
}
