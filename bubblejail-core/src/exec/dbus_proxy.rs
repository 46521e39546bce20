/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    os::fd::AsRawFd,
    path::{Path, PathBuf},
    process::{Child, Command},
    time::Instant,
};

use command_fds::{CommandFdExt, FdMapping};
use nix::poll::{poll, PollFd, PollFlags};

use crate::{
    config::value::DBusRule,
    constants::{DBUS_PROXY_EXECUTABLE, DBUS_PROXY_TIMEOUT},
    err,
    error,
    utils::env_var,
    ErrorGeneric,
    ErrorKind,
    Result,
};

const SYSTEM_BUS_ADDRESS: &str = "unix:path=/run/dbus/system_bus_socket";

/// A single running `xdg-dbus-proxy` instance and the sandbox-facing
/// socket it serves (§4.3).
pub struct DbusProxy {
    pub child: Child,
    pub socket_path: PathBuf,
}

impl DbusProxy {
    pub fn shutdown(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Spawns one `xdg-dbus-proxy` per non-empty rule set in `run_dir`
/// (mode 0700, created by the caller), blocking until each reports
/// ready via its close-for-write pipe (§4.3). Returns `(session,
/// system)`, either of which is `None` when that bus has no rules.
pub fn spawn(
    session_rules: &[DBusRule],
    system_rules: &[DBusRule],
    run_dir: &Path,
) -> Result<(Option<DbusProxy>, Option<DbusProxy>)> {
    let session = if session_rules.is_empty() {
        None
    } else {
        let upstream = env_var("DBUS_SESSION_BUS_ADDRESS")?;
        Some(spawn_one(&upstream, &run_dir.join("session_bus_socket"), session_rules)?)
    };

    let system = if system_rules.is_empty() {
        None
    } else {
        Some(spawn_one(SYSTEM_BUS_ADDRESS, &run_dir.join("system_bus_socket"), system_rules)?)
    };

    Ok((session, system))
}

fn spawn_one(upstream: &str, socket_path: &Path, rules: &[DBusRule]) -> Result<DbusProxy> {
    let (reader, writer) = os_pipe::pipe().map_err(|e| error!(ErrorKind::IOError("dbus-proxy ready pipe".to_string(), e.kind())))?;
    let writer_fd = writer.as_raw_fd();

    let mut cmd = Command::new(DBUS_PROXY_EXECUTABLE);
    cmd.arg(upstream).arg(socket_path).arg("--filter").arg(format!("--fd={}", writer_fd));

    for rule in rules {
        cmd.arg(rule.to_proxy_arg());
    }

    cmd.fd_mappings(vec![FdMapping { parent_fd: writer_fd, child_fd: writer_fd }])
        .map_err(|_| error!(ErrorKind::ProcessInitFailure(DBUS_PROXY_EXECUTABLE, std::io::ErrorKind::Other)))?;

    let mut child = cmd.spawn().map_err(|e| error!(ErrorKind::ProcessInitFailure(DBUS_PROXY_EXECUTABLE, e.kind())))?;
    drop(writer);

    if let Err(e) = wait_ready(&reader, &mut child) {
        let _ = child.kill();
        let _ = child.wait();
        return Err(e);
    }

    Ok(DbusProxy { child, socket_path: socket_path.to_path_buf() })
}

/// Blocks until `reader`'s write end is closed (the proxy is listening)
/// or `child` exits or `T_dbus = 5s` elapses, per §4.3 — a silent
/// fallback on proxy startup failure is forbidden.
fn wait_ready(reader: &os_pipe::PipeReader, child: &mut Child) -> Result<()> {
    let deadline = Instant::now() + DBUS_PROXY_TIMEOUT;
    let fd = reader.as_raw_fd();

    loop {
        if let Some(status) = child.try_wait().prepend_io(|| "xdg-dbus-proxy".to_string())? {
            err!(ErrorKind::DBusProxyStartupFailed(format!("exited during startup with status {}", status)))?
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            err!(ErrorKind::DBusProxyStartupFailed("timed out waiting for ready signal".to_string()))?
        }

        let timeout_ms = i32::try_from(remaining.as_millis()).unwrap_or(i32::MAX);
        let mut fds = [PollFd::new(fd, PollFlags::POLLHUP | PollFlags::POLLIN)];

        match poll(&mut fds, timeout_ms) {
            Ok(n) if n > 0 => return Ok(()),
            Ok(_) => continue,
            Err(e) => err!(ErrorKind::DBusProxyStartupFailed(format!("poll: {}", e)))?,
        }
    }
}
