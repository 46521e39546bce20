/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    collections::BTreeMap,
    fs::{create_dir_all, remove_dir_all},
    io::Write,
    os::{
        fd::AsRawFd,
        unix::net::{UnixListener, UnixStream},
    },
    path::{Path, PathBuf},
    process::{Child, Command},
    thread,
    time::Duration,
};

use command_fds::{CommandFdExt, FdMapping};
use nix::{
    sys::signal::{kill, Signal},
    unistd::Pid,
};
use os_pipe::{pipe, PipeReader};
use signal_hook::iterator::Signals;

use crate::{
    config::{merge::merge, service::Service, store::Instance, value::{BindOp, BwrapConfig, Hook}},
    constants::{
        BWRAP_EXECUTABLE,
        BWRAP_SHUTDOWN_GRACE,
        HELLO_TIMEOUT,
        HELPER_EXECUTABLE,
        HELPER_PROTOCOL_VERSION,
        NOTIFY_EXECUTABLE,
        SANDBOX_HOME,
        SIGNAL_LIST,
    },
    err,
    error,
    exec::{protocol::Frame, seccomp},
    utils::instance_runtime_dir,
    ErrorGeneric,
    ErrorKind,
    Result,
};

/// The FD number the in-sandbox helper finds its control socket on,
/// inherited across `bwrap`'s exec rather than opened by path (§4.4).
pub const HELPER_INHERITED_FD: i32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Composing,
    DbusProxyStarting,
    HelperSocketListening,
    BwrapLaunched,
    HelperHandshake,
    PostInitHooks,
    Running,
    Terminating,
    Terminated,
}

/// Forward-only supervisor for one sandbox invocation (§4.5, C9). Owns
/// every child process and FD the instance's run spawned; `shutdown`
/// is the only way out once `Running` is reached.
pub struct Runner {
    instance: Instance,
    state: RunnerState,
    run_dir: PathBuf,
    bwrap: Option<Child>,
    dbus_session: Option<crate::exec::dbus_proxy::DbusProxy>,
    dbus_system: Option<crate::exec::dbus_proxy::DbusProxy>,
    network_helper: Option<Child>,
    helper_link: Option<UnixStream>,
    reentry_listener: Option<UnixListener>,
    next_id: u64,
    /// Id of the foreground RUN sent in `start_inner`, whose RESULT
    /// `supervise` waits on to learn the sandboxed program's exit
    /// status (§4.4 responsibility 2, §4.5 "Shutdown").
    initial_run_id: u64,
    /// Frames read off `helper_link` by `read_until` that didn't match
    /// the id being waited for, held for a later call to claim.
    pending_frames: Vec<Frame>,
}

impl Runner {
    fn reentry_socket_path(name: &str) -> PathBuf {
        Path::new(&instance_runtime_dir(name)).join("helper.sock")
    }

    /// Entry point for the `run` command: forwards to an already-running
    /// instance if its re-entry socket answers, otherwise performs a
    /// fresh startup (§4.5 "Re-entry").
    pub fn run(instance: Instance, argv: Vec<String>, wait: bool) -> Result<i32> {
        let socket_path = Self::reentry_socket_path(&instance.name);

        if socket_path.exists() {
            if let Some(exit_code) = Self::forward_reentry(&socket_path, argv.clone(), wait)? {
                return Ok(exit_code);
            }
        }

        let mut runner = Self::start(instance, argv)?;
        let result = runner.supervise();
        runner.shutdown();
        result
    }

    /// Composes the instance's service configuration into the bwrap argv
    /// without spawning anything, for the `run --dry-run` path (§4.8).
    /// Corresponds to step 1 of the startup procedure in `start_inner`; the
    /// command forwarded to the in-sandbox helper is reported separately,
    /// since it travels over the control protocol rather than bwrap's argv.
    pub fn dry_run_argv(instance: &Instance) -> Result<Vec<String>> {
        let services = instance.load_services()?;
        let config = merge(&services)?;
        let seccomp_child_fd = HELPER_INHERITED_FD + 1;
        let file_write_fds = file_write_fd_map(&config.bind_ops, seccomp_child_fd + 1);

        let mut full = vec![BWRAP_EXECUTABLE.to_string()];
        full.extend(build_argv(&config, instance, HELPER_INHERITED_FD, seccomp_child_fd, &file_write_fds));
        Ok(full)
    }

    fn forward_reentry(socket_path: &Path, argv: Vec<String>, wait: bool) -> Result<Option<i32>> {
        let mut stream = match UnixStream::connect(socket_path) {
            Ok(stream) => stream,
            Err(_) => return Ok(None),
        };

        Frame::Run { id: 1, argv, env: Default::default(), attach_stdio: false, wait }.write_to(&mut stream)?;

        if !wait {
            return Ok(Some(0));
        }

        // The relay only forwards the RESULT that follows the helper's
        // READY (§4.4 step 3); READY itself stays internal to the relay.
        match Frame::read_from(&mut stream)? {
            Some(Frame::Result { exit_code, .. }) => Ok(Some(exit_code)),
            _ => err!(ErrorKind::AlreadyRunning("unexpected reply during re-entry".to_string())),
        }
    }

    /// The 12-step startup procedure (§4.5). Any failure here unwinds
    /// every effect performed so far before returning the error.
    fn start(instance: Instance, argv: Vec<String>) -> Result<Self> {
        let services = instance.load_services()?;
        let config = merge(&services)?;

        let run_dir = PathBuf::from(format!("{}/run", instance_runtime_dir(&instance.name)));
        create_dir_all(&run_dir).prepend_io(|| run_dir.display().to_string())?;
        set_mode_0700(&run_dir)?;

        let mut runner = Self {
            instance,
            state: RunnerState::Composing,
            run_dir,
            bwrap: None,
            dbus_session: None,
            dbus_system: None,
            network_helper: None,
            helper_link: None,
            reentry_listener: None,
            next_id: 1,
            initial_run_id: 0,
            pending_frames: Vec::new(),
        };

        if let Err(e) = runner.start_inner(config, services, argv) {
            runner.unwind();
            return Err(e);
        }

        Ok(runner)
    }

    fn start_inner(&mut self, config: BwrapConfig, services: Vec<Box<dyn Service>>, argv: Vec<String>) -> Result<()> {
        self.state = RunnerState::DbusProxyStarting;
        let (session, system) = crate::exec::dbus_proxy::spawn(&config.dbus_session_rules, &config.dbus_system_rules, &self.run_dir)?;
        self.dbus_session = session;
        self.dbus_system = system;

        self.state = RunnerState::HelperSocketListening;
        let socket_path = Self::reentry_socket_path(&self.instance.name);
        if let Some(parent) = socket_path.parent() {
            create_dir_all(parent).prepend_io(|| parent.display().to_string())?;
        }
        let listener = UnixListener::bind(&socket_path).prepend_io(|| socket_path.display().to_string())?;
        listener.set_nonblocking(true).prepend_io(|| socket_path.display().to_string())?;
        self.reentry_listener = Some(listener);

        let (runner_end, sandbox_end) =
            UnixStream::pair().map_err(|e| error!(ErrorKind::IOError("helper socketpair".to_string(), e.kind())))?;

        let seccomp_fd = seccomp::compile(&config.seccomp_rules)?;
        let seccomp_child_fd = HELPER_INHERITED_FD + 1;
        let file_write_fds = file_write_fd_map(&config.bind_ops, seccomp_child_fd + 1);
        let file_write_readers = materialize_file_writes(&config.bind_ops, &file_write_fds)?;

        let mut argv_bwrap = build_argv(&config, &self.instance, HELPER_INHERITED_FD, seccomp_child_fd, &file_write_fds);

        self.state = RunnerState::BwrapLaunched;
        let mut fd_mappings = vec![
            FdMapping { parent_fd: sandbox_end.as_raw_fd(), child_fd: HELPER_INHERITED_FD },
            FdMapping { parent_fd: seccomp_fd.as_raw_fd(), child_fd: seccomp_child_fd },
        ];
        for (reader, dst) in &file_write_readers {
            fd_mappings.push(FdMapping { parent_fd: reader.as_raw_fd(), child_fd: file_write_fds[dst] });
        }

        let mut cmd = Command::new(BWRAP_EXECUTABLE);
        cmd.args(argv_bwrap.drain(..))
            .fd_mappings(fd_mappings)
            .map_err(|_| error!(ErrorKind::ProcessInitFailure(BWRAP_EXECUTABLE, std::io::ErrorKind::Other)))?;

        let child = cmd.spawn().map_err(|e| error!(ErrorKind::ProcessInitFailure(BWRAP_EXECUTABLE, e.kind())))?;
        let bwrap_pid = Pid::from_raw(child.id() as i32);
        self.bwrap = Some(child);
        drop(sandbox_end);
        drop(seccomp_fd);
        drop(file_write_readers);

        if !config.namespace_limits.is_empty() {
            crate::exec::namespaces::apply(bwrap_pid, &config.namespace_limits)?;
        }

        for hook in &config.startup_hooks {
            match hook {
                Hook::AttachSlirp4netns => self.network_helper = Some(spawn_network_helper(crate::constants::SLIRP4NETNS_EXECUTABLE, bwrap_pid)?),
                Hook::AttachPasta => self.network_helper = Some(spawn_network_helper(crate::constants::PASTA_EXECUTABLE, bwrap_pid)?),
                Hook::ApplyNamespaceLimits => {}
            }
        }

        self.state = RunnerState::HelperHandshake;
        self.helper_link = Some(runner_end);
        self.handshake()?;

        self.state = RunnerState::PostInitHooks;
        // The instance's configured default command only applies when
        // the `run` invocation itself supplied no ARGS (§4.5 step 11).
        let argv = if argv.is_empty() {
            services.iter().find_map(|s| {
                let default = s.default_argv();
                (!default.is_empty()).then_some(default)
            }).unwrap_or_default()
        } else {
            argv
        };
        drop(services);

        let id = self.next_id();
        self.initial_run_id = id;
        let link = self.helper_link.as_mut().unwrap();
        Frame::Run { id, argv, env: Default::default(), attach_stdio: true, wait: true }.write_to(link)?;

        // Drain the READY the helper sends back (§4.4 step 3) so it
        // doesn't sit in front of a later re-entry RUN's reply; the
        // matching RESULT is collected later by `supervise`.
        match self.read_until(id, Some(HELLO_TIMEOUT)) {
            Some(Frame::Ready { .. }) => {}
            _ => err!(ErrorKind::HelperHandshakeTimeout)?,
        }

        self.state = RunnerState::Running;
        Ok(())
    }

    /// Reads frames off `helper_link` until one with `id` turns up,
    /// buffering any others in `pending_frames` for a later caller
    /// waiting on a different id. Demultiplexes the foreground run's
    /// RESULT (polled by `supervise`) from re-entry traffic (relayed by
    /// `relay_reentry`) sharing the same link. `timeout` is applied
    /// fresh on every call rather than relying on whatever was last set
    /// on the socket (the bug behind a stale `HELLO_TIMEOUT` silently
    /// dropping a long-running re-entry's RESULT).
    fn read_until(&mut self, id: u64, timeout: Option<Duration>) -> Option<Frame> {
        if let Some(pos) = self.pending_frames.iter().position(|f| f.id() == id) {
            return Some(self.pending_frames.remove(pos));
        }

        let link = self.helper_link.as_mut()?;
        link.set_read_timeout(timeout).ok()?;
        let deadline = timeout.map(|t| std::time::Instant::now() + t);

        loop {
            match Frame::read_from(link) {
                Ok(Some(frame)) if frame.id() == id => return Some(frame),
                Ok(Some(frame)) => self.pending_frames.push(frame),
                _ => return None,
            }

            if let Some(deadline) = deadline {
                if std::time::Instant::now() >= deadline {
                    return None;
                }
            }
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn handshake(&mut self) -> Result<()> {
        let id = self.next_id();
        let link = self.helper_link.as_mut().expect("helper link set before handshake");
        link.set_read_timeout(Some(HELLO_TIMEOUT)).prepend_io(|| "helper link".to_string())?;

        Frame::Hello { id, protocol_version: *HELPER_PROTOCOL_VERSION }.write_to(link)?;

        match Frame::read_from(link) {
            Ok(Some(Frame::Hello { .. })) => Ok(()),
            Ok(_) => err!(ErrorKind::HelperHandshakeTimeout),
            Err(_) => err!(ErrorKind::HelperHandshakeTimeout),
        }
    }

    /// The `Running` phase: a cooperative poll loop over the bwrap
    /// child, the in-sandbox helper link, re-entry connections, and
    /// termination signals (§5 — single-threaded, no hidden
    /// concurrency beyond the dedicated signal-forwarding thread).
    fn supervise(&mut self) -> Result<i32> {
        let mut signals = Signals::new(SIGNAL_LIST).map_err(|e| error!(ErrorKind::IOError("signal handler".to_string(), e.kind())))?;
        let bwrap_pid = self.bwrap.as_ref().map(|c| c.id() as i32).unwrap_or(0);

        let handle = signals.handle();
        let watcher = thread::Builder::new()
            .name("bubblejail-signal".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    let _ = kill(Pid::from_raw(bwrap_pid), Signal::SIGTERM);
                    break;
                }
            })
            .ok();

        let exit_code = loop {
            if self.bwrap.is_none() {
                break 0;
            }

            // The sandboxed program's own exit (RESULT for the
            // foreground RUN) is the primary shutdown trigger (§4.5
            // "Shutdown"); bwrap exiting on its own is the fallback for
            // when the helper link drops first.
            if let Some(Frame::Result { exit_code, .. }) = self.read_until(self.initial_run_id, Some(crate::constants::PROCESS_SLEEP_DURATION)) {
                break exit_code;
            }

            if let Some(child) = self.bwrap.as_mut() {
                if let Some(status) = child.try_wait().prepend_io(|| "bwrap".to_string())? {
                    break status.code().unwrap_or(1);
                }
            }

            if let Some(listener) = &self.reentry_listener {
                if let Ok((mut stream, _)) = listener.accept() {
                    self.relay_reentry(&mut stream);
                }
            }
        };

        handle.close();
        if let Some(w) = watcher {
            let _ = w.join();
        }

        self.state = RunnerState::Terminating;

        if exit_code != 0 {
            notify(&format!("bubblejail: instance '{}' exited with status {}", self.instance.name, exit_code));
            return err!(ErrorKind::SandboxExit(exit_code));
        }

        Ok(exit_code)
    }

    fn relay_reentry(&mut self, stream: &mut UnixStream) {
        let frame = match Frame::read_from(stream) {
            Ok(Some(frame)) => frame,
            _ => return,
        };

        let id = frame.id();
        let wrote = self.helper_link.as_mut().map(|link| link.write_to_ok(&frame)).unwrap_or(false);

        if !wrote {
            return;
        }

        if let Frame::Run { wait, .. } = frame {
            // Every RUN gets a READY first (§4.4 step 3); consume it
            // here so it never leaks into the next re-entry's reply,
            // then forward the RESULT only if requested.
            if self.read_until(id, Some(HELLO_TIMEOUT)).is_none() {
                return;
            }

            if wait {
                // No timeout: a re-entered command may run far longer
                // than HELLO_TIMEOUT, and that stale 10s bound must not
                // leak into this wait (it previously did, via the
                // socket-wide timeout set once in `handshake`).
                if let Some(Frame::Result { exit_code, .. }) = self.read_until(id, None) {
                    let _ = Frame::Result { id, exit_code, stdout: None, stderr: None }.write_to(stream);
                }
            }
        }
    }

    /// Reverse every effect in the opposite order they were acquired —
    /// called both on a startup failure and on normal shutdown (§4.5
    /// "Shutdown", §7 "never partial-start").
    fn shutdown(&mut self) {
        if let Some(link) = self.helper_link.as_mut() {
            let id = self.next_id;
            let _ = Frame::Shutdown { id }.write_to(link);
        }

        if let Some(child) = self.bwrap.as_mut() {
            let deadline = std::time::Instant::now() + BWRAP_SHUTDOWN_GRACE;
            while std::time::Instant::now() < deadline {
                if matches!(child.try_wait(), Ok(Some(_))) {
                    break;
                }
                thread::sleep(Duration::from_millis(50));
            }
            let _ = child.kill();
            let _ = child.wait();
        }

        self.unwind();
        self.state = RunnerState::Terminated;
    }

    fn unwind(&mut self) {
        if let Some(proxy) = self.dbus_session.take() {
            proxy.shutdown();
        }
        if let Some(proxy) = self.dbus_system.take() {
            proxy.shutdown();
        }
        if let Some(mut helper) = self.network_helper.take() {
            let _ = helper.kill();
            let _ = helper.wait();
        }

        let _ = remove_dir_all(&self.run_dir);
        let _ = std::fs::remove_file(Self::reentry_socket_path(&self.instance.name));
    }
}

trait WriteFrame {
    fn write_to_ok(&mut self, frame: &Frame) -> bool;
}

impl WriteFrame for UnixStream {
    fn write_to_ok(&mut self, frame: &Frame) -> bool {
        frame.write_to(self).is_ok()
    }
}

fn set_mode_0700(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = dir.metadata().prepend_io(|| dir.display().to_string())?.permissions();
    perms.set_mode(0o700);
    std::fs::set_permissions(dir, perms).prepend_io(|| dir.display().to_string())
}

fn spawn_network_helper(executable: &'static str, bwrap_pid: Pid) -> Result<Child> {
    Command::new(executable)
        .arg(bwrap_pid.to_string())
        .spawn()
        .map_err(|e| error!(ErrorKind::ProcessInitFailure(executable, e.kind())))
}

fn notify(message: &str) {
    let _ = Command::new(NOTIFY_EXECUTABLE).arg("bubblejail").arg(message).spawn();
}

/// Assigns each `FileWrite` bind op a dedicated inheritable FD number,
/// starting at `start_fd` and counting up in bind-op order. Shared
/// between `build_argv` (which only needs the numbers) and the real
/// startup path (which also needs to materialize the pipes backing
/// them) so both agree on the same numbering (§4.5 step 4/5).
fn file_write_fd_map(bind_ops: &[BindOp], start_fd: i32) -> BTreeMap<String, i32> {
    let mut map = BTreeMap::new();
    let mut fd = start_fd;

    for op in bind_ops {
        if let BindOp::FileWrite { dst, .. } = op {
            map.insert(dst.clone(), fd);
            fd += 1;
        }
    }

    map
}

/// Writes each `FileWrite` op's bytes into a fresh anonymous pipe and
/// returns the read ends, keyed by destination, for the caller to pass
/// through `fd_mappings` (§4.5 step 4). The write end is closed as soon
/// as the bytes are flushed so bwrap observes EOF after reading them.
fn materialize_file_writes(bind_ops: &[BindOp], fds: &BTreeMap<String, i32>) -> Result<Vec<(PipeReader, String)>> {
    let mut readers = Vec::new();

    for op in bind_ops {
        if let BindOp::FileWrite { dst, bytes } = op {
            let (reader, mut writer) = pipe().map_err(|e| error!(ErrorKind::IOError("file-write pipe".to_string(), e.kind())))?;
            writer.write_all(bytes).prepend_io(|| dst.clone())?;
            drop(writer);
            debug_assert!(fds.contains_key(dst));
            readers.push((reader, dst.clone()));
        }
    }

    Ok(readers)
}

/// Emits the full bwrap argv in the deterministic order of §4.5 step 5.
fn build_argv(config: &BwrapConfig, instance: &Instance, helper_fd: i32, seccomp_fd: i32, file_write_fds: &BTreeMap<String, i32>) -> Vec<String> {
    let mut argv = vec!["--die-with-parent".to_string(), "--new-session".to_string(), "--proc".to_string(), "/proc".to_string()];

    for kind in &config.unshare {
        argv.push(format!("--unshare-{}", kind.bwrap_flag_name()));
    }
    for kind in &config.share {
        argv.push(format!("--share-{}", kind.bwrap_flag_name()));
    }

    argv.push("--bind".to_string());
    argv.push(instance.home_dir().display().to_string());
    argv.push(SANDBOX_HOME.to_string());

    for op in &config.bind_ops {
        argv.extend(bind_op_argv(op, file_write_fds));
    }

    argv.push("--setenv".to_string());
    argv.push("HOME".to_string());
    argv.push(SANDBOX_HOME.to_string());

    for (key, value) in &config.env {
        argv.push("--setenv".to_string());
        argv.push(key.clone());
        argv.push(value.clone());
    }

    argv.push("--seccomp".to_string());
    argv.push(seccomp_fd.to_string());

    argv.push("--".to_string());
    argv.push(HELPER_EXECUTABLE.to_string());
    argv.push(helper_fd.to_string());
    argv.extend(config.argv.iter().cloned());

    argv
}

fn bind_op_argv(op: &BindOp, file_write_fds: &BTreeMap<String, i32>) -> Vec<String> {
    match op {
        BindOp::Bind { src, dst, readonly, try_ } => {
            let flag = match (readonly, try_) {
                (true, true) => "--ro-bind-try",
                (true, false) => "--ro-bind",
                (false, true) => "--bind-try",
                (false, false) => "--bind",
            };
            vec![flag.to_string(), src.clone(), dst.clone()]
        }
        BindOp::DevBind { src, dst, try_ } => {
            let flag = if *try_ { "--dev-bind-try" } else { "--dev-bind" };
            vec![flag.to_string(), src.clone(), dst.clone()]
        }
        BindOp::DirCreate { dst } => vec!["--dir".to_string(), dst.clone()],
        BindOp::SymlinkCreate { target, at } => vec!["--symlink".to_string(), target.clone(), at.clone()],
        BindOp::FileWrite { dst, .. } => {
            let fd = file_write_fds.get(dst).expect("file_write_fds covers every FileWrite dst");
            vec!["--file".to_string(), fd.to_string(), dst.clone()]
        }
        BindOp::EnvSet { .. } | BindOp::EnvUnset { .. } | BindOp::Share { .. } => Vec::new(),
        BindOp::Arg { raw } => vec![raw.clone()],
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::value::ShareKind;

    #[test]
    fn bind_op_argv_readonly() {
        let op = BindOp::Bind { src: "/a".into(), dst: "/b".into(), readonly: true, try_: false };
        assert_eq!(bind_op_argv(&op, &BTreeMap::new()), vec!["--ro-bind", "/a", "/b"]);
    }

    #[test]
    fn share_ops_are_not_rendered_as_bind_flags() {
        let op = BindOp::Share { kind: ShareKind::Net, unshare: true };
        assert!(bind_op_argv(&op, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn file_write_uses_assigned_fd_and_materializes_bytes() {
        let ops = vec![BindOp::FileWrite { dst: "/etc/thing.conf".into(), bytes: b"hello".to_vec() }];
        let fds = file_write_fd_map(&ops, 66);
        assert_eq!(fds["/etc/thing.conf"], 66);
        assert_eq!(bind_op_argv(&ops[0], &fds), vec!["--file", "66", "/etc/thing.conf"]);

        let mut readers = materialize_file_writes(&ops, &fds).unwrap();
        assert_eq!(readers.len(), 1);
        let (mut reader, dst) = readers.remove(0);
        assert_eq!(dst, "/etc/thing.conf");

        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }
}
