/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{env::var, time::Duration};

use lazy_static::lazy_static;
use nix::unistd::{getegid, geteuid};
use signal_hook::consts::*;

use crate::{
    error,
    utils::ansi::*,
    ErrorKind,
};

pub static PROCESS_SLEEP_DURATION: Duration = Duration::from_millis(50);
pub static HELLO_TIMEOUT: Duration = Duration::from_secs(10);
pub static DBUS_PROXY_TIMEOUT: Duration = Duration::from_secs(5);
pub static HELPER_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);
pub static BWRAP_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub const BWRAP_EXECUTABLE: &str = "bwrap";
pub const DBUS_PROXY_EXECUTABLE: &str = "xdg-dbus-proxy";
pub const NOTIFY_EXECUTABLE: &str = "notify-send";
pub const SLIRP4NETNS_EXECUTABLE: &str = "slirp4netns";
pub const PASTA_EXECUTABLE: &str = "pasta";
pub const HELPER_EXECUTABLE: &str = "bubblejail-helper";
pub const DEFAULT_PATH: &str = "/usr/local/bin:/bin:/usr/bin/";
/// `$HOME` inside the sandbox (§8 scenario C) — the single destination
/// the instance's home directory is bound to and every `home_share`
/// path is relative to.
pub const SANDBOX_HOME: &str = "/home/sandbox";
pub const SIGNAL_LIST: &[i32; 4] = &[SIGHUP, SIGINT, SIGQUIT, SIGTERM];

const BUBBLEJAIL_DATA_DIR: &str = "/.local/share/bubblejail";
const BUBBLEJAIL_CONFIG_DIR: &str = "/.config/bubblejail";

#[macro_export]
macro_rules! format_str {
    ( $( $x:expr ),+ ) => {
        format!($( $x, )+).leak()
    };
}

#[macro_export]
macro_rules! to_static_str {
    ( $x:expr ) => {
        $x.to_string().leak()
    };
}

lazy_static! {
    pub static ref VERBOSE: bool = var("BUBBLEJAIL_VERBOSE").is_ok_and(|v| v == "1");
    pub static ref UID: u32 = geteuid().as_raw();
    pub static ref GID: u32 = getegid().as_raw();
    pub static ref HOME: &'static str = env("HOME");
    pub static ref USER: &'static str = env_default("USER", "user");
    pub static ref EDITOR: &'static str = env_default("EDITOR", "vi");
    pub static ref WAYLAND_DISPLAY: &'static str = env_opt("WAYLAND_DISPLAY");
    pub static ref X11_DISPLAY: &'static str = env_opt("DISPLAY");
    pub static ref XAUTHORITY: &'static str = env_opt("XAUTHORITY");
    pub static ref PULSE_SERVER: &'static str = env_opt("PULSE_SERVER");
    pub static ref DBUS_SESSION_BUS_ADDRESS: &'static str = env_opt("DBUS_SESSION_BUS_ADDRESS");
    pub static ref XDG_DATA_HOME: &'static str = env_default_dir("XDG_DATA_HOME", BUBBLEJAIL_DATA_DIR, "");
    pub static ref XDG_CONFIG_HOME: &'static str = env_default_dir("XDG_CONFIG_HOME", BUBBLEJAIL_CONFIG_DIR, "");
    pub static ref XDG_RUNTIME_DIR: String = env_runtime_dir();
    pub static ref INSTANCES_DIR: &'static str = format_str!("{}/bubblejail/instances", data_home());
    pub static ref APPLICATIONS_DIR: &'static str = format_str!("{}/applications", data_home());
    pub static ref PROFILES_USER_DIR: &'static str = format_str!("{}/bubblejail/profiles", config_home());
    pub static ref PROFILES_SYSTEM_DIR: &'static str = "/etc/bubblejail/profiles";
    pub static ref PROFILES_PACKAGED_DIR: &'static str = "/usr/share/bubblejail/profiles";
    pub static ref LOG_LOCATION: &'static str = format_str!("{}/bubblejail/bubblejail.log", data_home());
    pub static ref VERSION_MAJOR: u32 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap();
    pub static ref VERSION_MINOR: u32 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
    pub static ref VERSION_PATCH: u32 = env!("CARGO_PKG_VERSION_PATCH").parse().unwrap();
    pub static ref HELPER_PROTOCOL_VERSION: u32 = 1;
    pub static ref IS_COLOR_TERMINAL: bool = is_color_terminal();
    pub static ref BOLD: &'static str = bold();
    pub static ref RESET: &'static str = reset();
    pub static ref DIM: &'static str = dim();
    pub static ref BOLD_RED: &'static str = bold_red();
    pub static ref BOLD_YELLOW: &'static str = bold_yellow();
    pub static ref BOLD_GREEN: &'static str = bold_green();
}

fn data_home() -> &'static str {
    if XDG_DATA_HOME.is_empty() {
        format_str!("{}{}", *HOME, BUBBLEJAIL_DATA_DIR)
    } else {
        *XDG_DATA_HOME
    }
}

fn config_home() -> &'static str {
    if XDG_CONFIG_HOME.is_empty() {
        format_str!("{}{}", *HOME, BUBBLEJAIL_CONFIG_DIR)
    } else {
        *XDG_CONFIG_HOME
    }
}

fn env_runtime_dir() -> String {
    match var("XDG_RUNTIME_DIR") {
        Ok(dir) => dir,
        Err(_) => format!("/run/user/{}", *UID),
    }
}

fn env(env: &'static str) -> &'static str {
    var(env).map_or_else(|_| error!(ErrorKind::EnvVarUnset(env)).fatal(), |var| var.leak())
}

fn env_opt(env: &str) -> &'static str {
    var(env).map_or_else(|_| "", |var| var.leak())
}

fn env_default(env: &str, default: &'static str) -> &'static str {
    var(env).map_or_else(|_| default, |var| var.leak())
}

fn env_default_dir(env: &str, _default_suffix: &str, fallback: &'static str) -> &'static str {
    var(env).map_or_else(|_| fallback, |var| var.leak())
}
