/*
 * bubblejail-helper
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::os::{fd::FromRawFd, unix::net::UnixStream};

use bubblejail_core::Error;

use crate::error::SupervisorError;

mod error;
mod supervisor;

fn main() {
    if let Err(error) = run() {
        Error::new(Box::new(error)).handle();
    }
}

fn run() -> Result<(), SupervisorError> {
    let fd_arg = std::env::args().nth(1).ok_or(SupervisorError::DirectExecution)?;
    let fd: i32 = fd_arg.parse().map_err(|_| SupervisorError::InvalidFdArgument(fd_arg))?;

    // SAFETY: the Runner maps this exact FD number onto an inherited
    // control socketpair end before exec'ing bwrap (§4.4); the helper
    // is never launched any other way.
    let link = unsafe { UnixStream::from_raw_fd(fd) };

    supervisor::run(link)
}
