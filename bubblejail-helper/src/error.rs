/*
 * bubblejail-helper
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::fmt::{Display, Formatter};

use bubblejail_core::ErrorTrait;

#[derive(Debug)]
pub enum SupervisorError {
    DirectExecution,
    InvalidFdArgument(String),
    ProtocolVersionMismatch(u32, u32),
    UnexpectedFrame(String),
    FrameError(String),
    ChildSpawnFailure(std::io::ErrorKind),
}

impl Display for SupervisorError {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match self {
            Self::DirectExecution => write!(fmter, "this binary is launched by the bubblejail runner, not directly"),
            Self::InvalidFdArgument(arg) => write!(fmter, "invalid control socket fd argument: '{}'", arg),
            Self::ProtocolVersionMismatch(got, want) => write!(fmter, "protocol version mismatch: runner sent {}, helper expects {}", got, want),
            Self::UnexpectedFrame(detail) => write!(fmter, "unexpected frame: {}", detail),
            Self::FrameError(detail) => write!(fmter, "frame error: {}", detail),
            Self::ChildSpawnFailure(kind) => write!(fmter, "failed to spawn sandboxed program: {}", kind),
        }
    }
}

impl ErrorTrait for SupervisorError {
    fn code(&self) -> i32 {
        match self {
            Self::DirectExecution => 1,
            Self::InvalidFdArgument(..) => 1,
            Self::ProtocolVersionMismatch(..) => 4,
            Self::UnexpectedFrame(..) => 4,
            Self::FrameError(..) => 4,
            Self::ChildSpawnFailure(..) => 5,
        }
    }
}
