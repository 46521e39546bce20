/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::{err, error, ErrorKind, Result};

/// Maximum frame body size accepted from the wire — generous for a
/// JSON control frame, small enough to reject a corrupt length prefix
/// before it tries to allocate gigabytes.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Helper control protocol (§4.4/§6): a 4-byte big-endian length
/// followed by that many bytes of UTF-8 JSON. `id` correlates RUN with
/// its RESULT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    #[serde(rename = "HELLO")]
    Hello { id: u64, protocol_version: u32 },
    #[serde(rename = "RUN")]
    Run { id: u64, argv: Vec<String>, env: std::collections::BTreeMap<String, String>, attach_stdio: bool, wait: bool },
    #[serde(rename = "RESULT")]
    Result { id: u64, exit_code: i32, stdout: Option<Vec<u8>>, stderr: Option<Vec<u8>> },
    #[serde(rename = "PING")]
    Ping { id: u64 },
    #[serde(rename = "PONG")]
    Pong { id: u64 },
    #[serde(rename = "SHUTDOWN")]
    Shutdown { id: u64 },
    #[serde(rename = "READY")]
    Ready { id: u64 },
    #[serde(rename = "ERROR")]
    Error { id: u64, code: u32, msg: String },
}

impl Frame {
    pub fn id(&self) -> u64 {
        match self {
            Self::Hello { id, .. }
            | Self::Run { id, .. }
            | Self::Result { id, .. }
            | Self::Ping { id, .. }
            | Self::Pong { id, .. }
            | Self::Shutdown { id, .. }
            | Self::Ready { id, .. }
            | Self::Error { id, .. } => *id,
        }
    }

    /// Writes this frame as length-prefixed JSON to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let body = serde_json::to_vec(self).map_err(|e| error!(ErrorKind::IOError("encoding frame".to_string(), std::io::Error::new(std::io::ErrorKind::InvalidData, e).kind())))?;
        let len = u32::try_from(body.len()).map_err(|_| error!(ErrorKind::Message("frame body too large to encode")))?;

        out.write_all(&len.to_be_bytes()).map_err(|e| error!(ErrorKind::IOError("writing frame".to_string(), e.kind())))?;
        out.write_all(&body).map_err(|e| error!(ErrorKind::IOError("writing frame".to_string(), e.kind())))?;
        Ok(())
    }

    /// Reads one length-prefixed JSON frame from `input`. Returns
    /// `Ok(None)` on a clean EOF before any bytes of a new frame
    /// arrive — not an error per §4.4.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Option<Self>> {
        let mut len_buf = [0u8; 4];
        if let Err(e) = input.read_exact(&mut len_buf) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Ok(None);
            }
            err!(ErrorKind::IOError("reading frame length".to_string(), e.kind()))?
        }

        let len = u32::from_be_bytes(len_buf);
        if len > MAX_FRAME_LEN {
            err!(ErrorKind::Message("frame length exceeds maximum"))?
        }

        let mut body = vec![0u8; len as usize];
        input.read_exact(&mut body).map_err(|e| error!(ErrorKind::IOError("reading frame body".to_string(), e.kind())))?;

        let frame = serde_json::from_slice(&body).map_err(|e| error!(ErrorKind::ConfigParseError("frame".to_string(), e.to_string())))?;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hello_roundtrips() {
        let frame = Frame::Hello { id: 1, protocol_version: 1 };
        let mut buf = Vec::new();
        frame.write_to(&mut buf).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let restored = Frame::read_from(&mut cursor).unwrap().unwrap();
        assert_eq!(restored.id(), 1);
        assert!(matches!(restored, Frame::Hello { protocol_version: 1, .. }));
    }

    #[test]
    fn eof_before_frame_is_not_an_error() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        assert!(Frame::read_from(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        assert!(Frame::read_from(&mut cursor).is_err());
    }
}
