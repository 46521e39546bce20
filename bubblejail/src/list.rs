/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use bubblejail_core::{
    config::{
        registry,
        store::{Instance, Profile},
    },
    utils::{arguments::Operand, table::Table, Arguments},
    Result,
};

pub fn list(args: &mut Arguments) -> Result<()> {
    match args.next().unwrap_or_default() {
        Operand::Value("instances") => list_instances(),
        Operand::Value("profiles") => list_profiles(),
        Operand::Value("services") => list_services(),
        _ => args.invalid_operand(),
    }
}

fn list_instances() -> Result<()> {
    let names = Instance::list()?;
    let mut table = Table::new().header(&["INSTANCE"]);

    for name in &names {
        table.insert(vec![name.clone()]);
    }

    println!("{}", table.build()?);
    Ok(())
}

fn list_profiles() -> Result<()> {
    let names = Profile::list()?;
    let mut table = Table::new().header(&["PROFILE"]);

    for name in &names {
        table.insert(vec![name.clone()]);
    }

    println!("{}", table.build()?);
    Ok(())
}

fn list_services() -> Result<()> {
    let mut table = Table::new().header(&["SERVICE", "DESCRIPTION"]);

    for name in registry::list() {
        let service = registry::default_service(name)?;
        table.insert(vec![service.name().to_string(), service.description().to_string()]);
    }

    println!("{}", table.build()?);
    Ok(())
}
