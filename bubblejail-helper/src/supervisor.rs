/*
 * bubblejail-helper
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    collections::BTreeMap,
    os::unix::net::UnixStream,
    process::{Command, Stdio},
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use bubblejail_core::{constants::{HELPER_PROTOCOL_VERSION, HELPER_SHUTDOWN_GRACE}, exec::protocol::Frame};
use nix::{
    sys::{
        signal::{kill, Signal},
        wait::{waitpid, WaitPidFlag, WaitStatus},
    },
    unistd::Pid,
};

use crate::error::SupervisorError;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The link is shared with background wait threads spawned by
/// `handle_run`, so every write goes through a mutex rather than
/// `&mut`.
type SharedLink = Arc<Mutex<UnixStream>>;
type SharedChildren = Arc<Mutex<Vec<Pid>>>;

/// The cooperative event loop run inside the sandbox, on the control
/// socket inherited from the Runner (§4.4/§5). Reads happen strictly in
/// arrival order on this thread; a `wait=true` RUN's RESULT is produced
/// by a detached wait thread instead of blocking this loop, so the
/// helper keeps answering re-entry RUNs, PING, and SHUTDOWN while a
/// long-running command is in flight.
pub fn run(mut link: UnixStream) -> Result<(), SupervisorError> {
    handshake(&mut link)?;

    let write_link: SharedLink =
        Arc::new(Mutex::new(link.try_clone().map_err(|e| SupervisorError::FrameError(e.kind().to_string()))?));
    let children: SharedChildren = Arc::new(Mutex::new(Vec::new()));

    loop {
        let frame = match Frame::read_from(&mut link) {
            Ok(frame) => frame,
            Err(e) => return Err(SupervisorError::FrameError(e.kind().to_string())),
        };

        match frame {
            // Losing the runner connection doesn't tear the sandbox down;
            // the helper keeps running until the sandboxed program exits
            // on its own (§4.4: "EOF ... is not an error").
            None => {
                wait_for_children(&children);
                return Ok(());
            }
            Some(Frame::Run { id, argv, env, attach_stdio, wait }) => {
                handle_run(&write_link, id, argv, env, attach_stdio, wait, &children)?
            }
            Some(Frame::Ping { id }) => write_frame(&write_link, &Frame::Pong { id })?,
            Some(Frame::Shutdown { .. }) => {
                terminate_children(&children);
                return Ok(());
            }
            Some(other) => {
                let id = other.id();
                let msg = format!("unexpected frame: {:?}", other);
                let _ = write_frame(&write_link, &Frame::Error { id, code: 1, msg });
            }
        }
    }
}

fn write_frame(link: &SharedLink, frame: &Frame) -> Result<(), SupervisorError> {
    let mut guard = link.lock().unwrap();
    frame.write_to(&mut *guard).map_err(|e| SupervisorError::FrameError(e.kind().to_string()))
}

/// SIGTERMs every tracked child, polls for exit up to
/// [`HELPER_SHUTDOWN_GRACE`], then SIGKILLs whatever is left (§4.4
/// step 5).
fn terminate_children(children: &SharedChildren) {
    let mut children = children.lock().unwrap();
    for pid in children.iter() {
        let _ = kill(*pid, Signal::SIGTERM);
    }

    let deadline = Instant::now() + HELPER_SHUTDOWN_GRACE;
    while Instant::now() < deadline && !children.is_empty() {
        children.retain(|pid| !reaped(*pid));
        if !children.is_empty() {
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }
    }

    for pid in children.iter() {
        let _ = kill(*pid, Signal::SIGKILL);
        let _ = waitpid(*pid, None);
    }
}

/// Blocks until every tracked child has exited, reaping each as it
/// does.
fn wait_for_children(children: &SharedChildren) {
    let pids: Vec<Pid> = children.lock().unwrap().drain(..).collect();
    for pid in pids {
        let _ = waitpid(pid, None);
    }
}

/// Non-blocking reap attempt; `true` if `pid` is no longer running.
fn reaped(pid: Pid) -> bool {
    matches!(waitpid(pid, Some(WaitPidFlag::WNOHANG)), Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) | Err(_))
}

fn handshake(link: &mut UnixStream) -> Result<(), SupervisorError> {
    match Frame::read_from(link) {
        Ok(Some(Frame::Hello { id, protocol_version })) => {
            if protocol_version != *HELPER_PROTOCOL_VERSION {
                return Err(SupervisorError::ProtocolVersionMismatch(protocol_version, *HELPER_PROTOCOL_VERSION));
            }

            Frame::Hello { id, protocol_version: *HELPER_PROTOCOL_VERSION }
                .write_to(link)
                .map_err(|e| SupervisorError::FrameError(e.kind().to_string()))
        }
        Ok(_) => Err(SupervisorError::UnexpectedFrame("expected HELLO".to_string())),
        Err(e) => Err(SupervisorError::FrameError(e.kind().to_string())),
    }
}

fn handle_run(
    link: &SharedLink,
    id: u64,
    argv: Vec<String>,
    env: BTreeMap<String, String>,
    attach_stdio: bool,
    wait: bool,
    children: &SharedChildren,
) -> Result<(), SupervisorError> {
    let Some((program, rest)) = argv.split_first() else {
        write_frame(link, &Frame::Ready { id })?;
        return write_frame(link, &Frame::Result { id, exit_code: 127, stdout: None, stderr: None });
    };

    let mut cmd = Command::new(program);
    cmd.args(rest).envs(env);

    if attach_stdio {
        cmd.stdin(Stdio::inherit()).stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    }

    let mut child = cmd.spawn().map_err(|e| SupervisorError::ChildSpawnFailure(e.kind()))?;
    let pid = Pid::from_raw(child.id() as i32);
    children.lock().unwrap().push(pid);

    // Acknowledge that the command is running before optionally waiting
    // on its exit (§4.4 step 3), so a `wait=false` caller can detach as
    // soon as the process actually started rather than racing spawn.
    write_frame(link, &Frame::Ready { id })?;

    if !wait {
        return Ok(());
    }

    // The wait happens off this thread so a long-running foreground or
    // re-entered command never blocks the main loop from answering
    // concurrent RUN/PING/SHUTDOWN frames on the same link.
    let link = Arc::clone(link);
    let children = Arc::clone(children);
    thread::spawn(move || {
        let status = child.wait();
        children.lock().unwrap().retain(|p| *p != pid);
        let exit_code = status.map(|s| s.code().unwrap_or(1)).unwrap_or(1);
        let _ = write_frame(&link, &Frame::Result { id, exit_code, stdout: None, stderr: None });
    });

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn shared_link(link: UnixStream) -> SharedLink {
        Arc::new(Mutex::new(link))
    }

    #[test]
    fn empty_argv_reports_exit_127() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let link = shared_link(a);
        let children: SharedChildren = Arc::new(Mutex::new(Vec::new()));
        handle_run(&link, 1, Vec::new(), BTreeMap::new(), false, true, &children).unwrap();
        match Frame::read_from(&mut b).unwrap().unwrap() {
            Frame::Ready { id } => assert_eq!(id, 1),
            other => panic!("unexpected frame: {:?}", other),
        }
        match Frame::read_from(&mut b).unwrap().unwrap() {
            Frame::Result { exit_code, .. } => assert_eq!(exit_code, 127),
            other => panic!("unexpected frame: {:?}", other),
        }
        assert!(children.lock().unwrap().is_empty());
    }

    #[test]
    fn successful_run_sends_ready_before_result() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let link = shared_link(a);
        let argv = vec!["/bin/true".to_string()];
        let children: SharedChildren = Arc::new(Mutex::new(Vec::new()));
        handle_run(&link, 7, argv, BTreeMap::new(), false, true, &children).unwrap();

        match Frame::read_from(&mut b).unwrap().unwrap() {
            Frame::Ready { id } => assert_eq!(id, 7),
            other => panic!("unexpected frame: {:?}", other),
        }
        // The RESULT is sent by a detached wait thread; the blocking
        // read below waits for it rather than racing it.
        match Frame::read_from(&mut b).unwrap().unwrap() {
            Frame::Result { id, exit_code, .. } => {
                assert_eq!(id, 7);
                assert_eq!(exit_code, 0);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
        assert!(children.lock().unwrap().is_empty(), "wait=true must reap the child once RESULT is sent");
    }

    #[test]
    fn detached_run_sends_only_ready() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let link = shared_link(a);
        let argv = vec!["/bin/sleep".to_string(), "0".to_string()];
        let children: SharedChildren = Arc::new(Mutex::new(Vec::new()));
        handle_run(&link, 3, argv, BTreeMap::new(), false, false, &children).unwrap();

        match Frame::read_from(&mut b).unwrap().unwrap() {
            Frame::Ready { id } => assert_eq!(id, 3),
            other => panic!("unexpected frame: {:?}", other),
        }
        assert_eq!(children.lock().unwrap().len(), 1, "wait=false leaves the child tracked for shutdown");
        wait_for_children(&children);
    }
}
