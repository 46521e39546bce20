/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use bubblejail_core::{
    config::store::Instance,
    exec::runner::Runner,
    utils::{arguments::Operand, Arguments},
    Result,
};

pub fn run(args: &mut Arguments) -> Result<()> {
    let mut wait = false;
    let mut debug_shell = false;
    let mut dry_run = false;
    let mut wizard = false;
    let mut debug_log_dbus = None;
    let mut debug_bwrap_args = Vec::new();
    let mut name = None;
    let mut pos = 0;

    for str in args.inner() {
        if str.starts_with('-') || *str == "run" || *str == "shell" {
            pos += 1;
            continue;
        }
        pos += 1;
        break;
    }

    while let Some(arg) = args.next() {
        match arg {
            Operand::Long("wait") => wait = true,
            Operand::Long("debug-shell") => debug_shell = true,
            Operand::Long("dry-run") => dry_run = true,
            Operand::Long("wizard") => wizard = true,
            Operand::Long("debug-log-dbus") => debug_log_dbus = Some("bwrap".to_string()),
            Operand::LongPos("debug-log-dbus", val) => debug_log_dbus = Some(val.to_string()),
            Operand::Long("debug-bwrap-args") => continue,
            Operand::LongPos("debug-bwrap-args", val) => debug_bwrap_args.push(val.to_string()),
            Operand::Value(val) if name.is_none() => {
                name = Some(val.to_string());
                break;
            }
            _ => return args.invalid_operand(),
        }
    }

    let name = match name {
        Some(name) => name,
        None => return args.invalid_operand(),
    };
    let mut argv: Vec<String> = args.into_inner(pos).iter().map(|s| s.to_string()).collect();
    let instance = Instance::load(&name)?;

    if debug_shell {
        argv = vec!["bash".to_string()];
    }
    if let Some(mode) = debug_log_dbus {
        eprintln!("debug: xdg-dbus-proxy logging requested (mode: {mode}); not yet wired into the proxy spawn path.");
    }
    if wizard {
        eprintln!("debug: --wizard is not yet implemented; continuing with the instance's existing configuration.");
    }

    if dry_run {
        let mut bwrap_argv = Runner::dry_run_argv(&instance)?;
        bwrap_argv.extend(debug_bwrap_args);

        println!("{}", bwrap_argv.join(" "));
        if !argv.is_empty() {
            println!("# forwarded to helper: {}", argv.join(" "));
        }
        return Ok(());
    }

    Runner::run(instance, argv, wait)?;
    Ok(())
}
