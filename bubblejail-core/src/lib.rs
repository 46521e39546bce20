/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::{BOLD, RESET};

pub mod config;
pub mod constants;
pub mod error;
pub mod exec;
pub mod lock;
pub mod log;
pub mod utils;

pub use error::*;

/// Top-level error kinds, one per row of the exit-code table.
///
/// Exit codes: 0 success; 1 user/config error; 2 activation conflict;
/// 3 dependency missing; 4 sandbox startup failure; 5 sandboxed
/// program non-zero.
#[derive(Debug)]
pub enum ErrorKind {
    ConfigParseError(String, String),
    ServiceConflict(String, String),
    DependencyMissing(String),
    BindSourceMissing(String),
    DBusProxyStartupFailed(String),
    HelperHandshakeTimeout,
    NamespaceLimitFailed(String),
    NetworkStackFailed(String),
    SandboxExit(i32),
    AlreadyRunning(String),
    InstanceNotFound(String),
    ProfileNotFound(String),
    EnvVarUnset(&'static str),
    ProcessInitFailure(&'static str, std::io::ErrorKind),
    ProcessWaitFailure(&'static str, std::io::ErrorKind),
    IOError(String, std::io::ErrorKind),
    Message(&'static str),
}

impl Display for ErrorKind {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ConfigParseError(file, detail) => write!(fmter, "ConfigParseError: '{}': {}", file, detail),
            Self::ServiceConflict(a, b) => write!(fmter, "ServiceConflict: {} \u{21c4} {}", a, b),
            Self::DependencyMissing(dep) => write!(fmter, "DependencyMissing: {}{}{}", *BOLD, dep, *RESET),
            Self::BindSourceMissing(src) => write!(fmter, "BindSourceMissing: '{}'", src),
            Self::DBusProxyStartupFailed(detail) => write!(fmter, "DBusProxyStartupFailed: {}", detail),
            Self::HelperHandshakeTimeout => write!(fmter, "HelperHandshakeTimeout: HELLO not received within the deadline"),
            Self::NamespaceLimitFailed(detail) => write!(fmter, "NamespaceLimitFailed: {}", detail),
            Self::NetworkStackFailed(detail) => write!(fmter, "NetworkStackFailed: {}", detail),
            Self::SandboxExit(code) => write!(fmter, "SandboxExit: sandboxed program exited with status {}", code),
            Self::AlreadyRunning(name) => write!(fmter, "AlreadyRunning: instance '{}' is already running", name),
            Self::InstanceNotFound(name) => write!(fmter, "Instance '{}{}{}' not found", *BOLD, name, *RESET),
            Self::ProfileNotFound(name) => write!(fmter, "Profile '{}{}{}' not found", *BOLD, name, *RESET),
            Self::EnvVarUnset(var) => write!(fmter, "${}{var}{} is unset", *BOLD, *RESET),
            Self::ProcessInitFailure(exec, err) => write!(fmter, "Unable to initialize '{exec}': {err}"),
            Self::ProcessWaitFailure(exec, err) => write!(fmter, "Unable to wait on '{exec}': {err}"),
            Self::IOError(ins, error) => write!(fmter, "'{ins}': {error}"),
            Self::Message(err) => write!(fmter, "{}", err),
        }
    }
}

impl ErrorTrait for ErrorKind {
    fn code(&self) -> i32 {
        match self {
            Self::ConfigParseError(..) => 1,
            Self::Message(..) => 1,
            Self::EnvVarUnset(..) => 1,
            Self::ServiceConflict(..) => 2,
            Self::DependencyMissing(..) => 3,
            Self::BindSourceMissing(..) => 4,
            Self::DBusProxyStartupFailed(..) => 4,
            Self::HelperHandshakeTimeout => 4,
            Self::NamespaceLimitFailed(..) => 4,
            Self::NetworkStackFailed(..) => 4,
            Self::SandboxExit(n) => (*n).clamp(1, 125),
            Self::AlreadyRunning(..) => 0,
            Self::InstanceNotFound(..) => 1,
            Self::ProfileNotFound(..) => 1,
            Self::ProcessInitFailure(..) => 3,
            Self::ProcessWaitFailure(..) => 4,
            Self::IOError(..) => 1,
        }
    }
}
