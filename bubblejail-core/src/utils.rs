/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    env::var,
    os::unix::net::UnixStream,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    constants::{BOLD_RED, BOLD_YELLOW, RESET},
    err,
    ErrorKind,
    Result,
};

pub use ansi::is_color_terminal;
pub use arguments::Arguments;

pub mod ansi;
pub mod arguments;
pub mod table;

pub fn print_warning(message: &str) {
    eprintln!("{}warning:{} {}", *BOLD_YELLOW, *RESET, message);
}

pub fn print_error(message: &str) {
    eprintln!("{}error:{} {}", *BOLD_RED, *RESET, message);
}

pub fn check_socket(socket: &Path) -> bool {
    UnixStream::connect(socket).is_ok()
}

pub fn unix_time_as_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

pub fn whitespace(amt: usize) -> String {
    " ".repeat(amt)
}

pub fn env_var(env: &'static str) -> Result<String> {
    match var(env) {
        Ok(var) => Ok(var),
        Err(_) => err!(ErrorKind::EnvVarUnset(env)),
    }
}

/// Stable per-instance hash used to derive the helper socket path
/// (`$XDG_RUNTIME_DIR/bubblejail/<name>/helper.sock`) without needing a
/// name-to-path allowlist: the name itself is filesystem-safe already,
/// this just avoids leaking it raw into the runtime directory layout.
pub fn instance_runtime_dir(name: &str) -> String {
    format!("{}/bubblejail/{}", *crate::constants::XDG_RUNTIME_DIR, name)
}
