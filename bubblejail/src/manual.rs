/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::fmt::Write;

use bubblejail_core::{utils::is_color_terminal, Error};

pub fn help() -> Result<(), Error> {
    let layout = match is_color_terminal() {
        true => HelpLayout::Console,
        false => HelpLayout::Dumb,
    };
    let mut buffer = String::new();

    for topic in [HelpTopic::Default, HelpTopic::Commands, HelpTopic::Env, HelpTopic::Copyright] {
        topic.write(&mut buffer, &layout).unwrap();
    }

    match layout {
        HelpLayout::Console => print!("\x1b[?7l{buffer}\x1b[?7h"),
        HelpLayout::Dumb => print!("{buffer}"),
    }

    Ok(())
}

enum HelpTopic {
    Default,
    Commands,
    Env,
    Copyright,
}

enum HelpLayout {
    Console,
    Dumb,
}

impl HelpLayout {
    fn head(&self) -> &str {
        match self {
            Self::Console => "\x1b[1m",
            Self::Dumb => "",
        }
    }

    fn sub(&self) -> &str {
        match self {
            Self::Console => "    \x1b[37;1m",
            Self::Dumb => "    ",
        }
    }

    fn reset(&self) -> &str {
        match self {
            Self::Console => "\x1b[0m",
            Self::Dumb => "",
        }
    }

    fn reset_bold(&self) -> &str {
        match self {
            Self::Console => "\x1b[0m",
            Self::Dumb => "",
        }
    }

    fn bold(&self) -> &str {
        match self {
            Self::Console => "\x1b[37;1m",
            Self::Dumb => "",
        }
    }

    fn tab(&self) -> &str {
        "    "
    }
}

impl HelpTopic {
    fn write(&self, buf: &mut String, layout: &HelpLayout) -> Result<(), std::fmt::Error> {
        match self {
            Self::Default => default(buf, layout),
            Self::Commands => commands(buf, layout),
            Self::Env => environment(buf, layout),
            Self::Copyright => copyright(buf, layout),
        }
    }
}

fn default(buf: &mut String, layout: &HelpLayout) -> Result<(), std::fmt::Error> {
    let head = layout.head();
    let tab = layout.tab();
    let reset = layout.reset();
    let bold = layout.bold();
    let reset_bold = layout.reset_bold();

    writeln!(
        buf,
        "{head}NAME{reset}
{tab}bubblejail - Unprivileged bubblewrap-based sandbox runner.

{head}SYNOPSIS{reset}
{tab}bubblejail {bold}COMMAND{reset_bold} [{bold}ARGUMENTS{reset_bold}] [{bold}NAME{reset_bold}] [{bold}ARGS...{reset_bold}]

{head}DESCRIPTION{reset}
{tab}Bubblejail creates, configures and executes sandboxed instances of the
{tab}user's applications via bubblewrap, xdg-dbus-proxy and a seccomp filter
{tab}compiled from per-instance service configuration.\n"
    )
}

fn commands(buf: &mut String, layout: &HelpLayout) -> Result<(), std::fmt::Error> {
    let head = layout.head();
    let sub = layout.sub();
    let tab = layout.tab();
    let reset = layout.reset();
    let reset_bold = layout.reset_bold();

    writeln!(
        buf,
        "{head}COMMANDS{reset}

{sub}create [--profile PROFILE] [--no-desktop-entry] NAME{reset_bold}
{tab}{tab}Create a new instance, optionally seeded from an existing profile.

{sub}run [--wait] [--debug-shell] [--dry-run] [--wizard]{reset_bold}
{tab}{tab}{tab}[--debug-log-dbus[=raw]] [--debug-bwrap-args=ARG]... NAME [ARGS...]{reset_bold}
{tab}{tab}Launch or re-enter the named instance, running ARGS within it.
{tab}{tab}--dry-run prints the expanded bwrap argv without launching it.
{tab}{tab}--wait blocks until the sandboxed command exits and mirrors its
{tab}{tab}exit code. --debug-log-dbus enables xdg-dbus-proxy's own logging.
{tab}{tab}--debug-bwrap-args appends raw arguments to the bwrap invocation.

{sub}list {{instances|profiles|services}}{reset_bold}
{tab}{tab}Enumerate known instances, profiles, or available services.

{sub}edit NAME{reset_bold}
{tab}{tab}Open the instance's services.toml in $EDITOR.

{sub}generate-desktop-entry [--profile P | --desktop-entry E] NAME{reset_bold}
{tab}{tab}Write a .desktop launcher that runs the instance.

{sub}auto-complete COMP_LINE{reset_bold}
{tab}{tab}Emit shell completion candidates for COMP_LINE.

{sub}-h, --help=TOPIC{reset_bold}
{tab}{tab}Invoke a printout of this manual to STDOUT.

{sub}-V, --version{reset_bold}
{tab}{tab}Display version and copyright information.\n"
    )
}

fn environment(buf: &mut String, layout: &HelpLayout) -> Result<(), std::fmt::Error> {
    let head = layout.head();
    let sub = layout.sub();
    let tab = layout.tab();
    let reset = layout.reset();
    let reset_bold = layout.reset_bold();

    writeln!(
        buf,
        "{head}ENVIRONMENT VARIABLES{reset}

{sub}XDG_RUNTIME_DIR{reset_bold}
{tab}{tab}Runtime directory under which per-instance sockets and state live.

{sub}XDG_CONFIG_HOME{reset_bold}
{tab}{tab}Base directory for instance and profile configuration.

{sub}EDITOR{reset_bold}
{tab}{tab}Editor invoked by the 'edit' command.\n"
    )
}

fn copyright(buf: &mut String, layout: &HelpLayout) -> Result<(), std::fmt::Error> {
    let head = layout.head();
    let tab = layout.tab();
    let reset = layout.reset();

    writeln!(
        buf,
        "{head}COPYRIGHT{reset}

{tab}{tab}Copyright (C) 2026 Bubblejail contributors

{tab}{tab}This program may be freely redistributed under the
{tab}{tab}terms of the GNU General Public License v3 only.\n"
    )
}

pub fn print_version() -> Result<(), Error> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let suffix = env!("BUBBLEJAIL_BUILDSTAMP");
    let timestamp = env!("BUBBLEJAIL_BUILDTIME");
    let release = env!("BUBBLEJAIL_BUILD");

    println!(
        "{name} v{version}-{suffix}-{release} ({timestamp})
Copyright (C) 2026 Bubblejail contributors

This program may be freely redistributed under the
terms of the GNU General Public License v3 only.\n"
    );
    Ok(())
}
