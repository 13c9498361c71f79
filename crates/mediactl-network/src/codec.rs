//! Tokio codec for PJLink line framing.
//!
//! PJLink class 1 is a line protocol: every greeting, command and response
//! is ASCII text terminated by a carriage return.
//!
//! ```text
//! projector -> "PJLINK 1 498e4a67\r"
//! client    -> "<md5 digest>%1POWR 1\r"
//! projector -> "%1POWR=OK\r"
//! ```
//!
//! [`PjlinkCodec`] splits the byte stream into lines (the terminator is
//! stripped, a stray `\n` after it is tolerated) and appends the terminator
//! on encode. Lines longer than the maximum are rejected so a misbehaving
//! peer cannot grow the read buffer without bound.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::RemoteError;

/// Line terminator defined by PJLink.
pub const TERMINATOR: u8 = b'\r';

/// Default maximum line length in bytes.
///
/// PJLink class 1 limits a command line to 136 bytes; the margin covers
/// vendor responses such as long `INF2` strings.
const DEFAULT_MAX_LINE_LENGTH: usize = 512;

/// Tokio codec for PJLink lines.
#[derive(Debug, Clone)]
pub struct PjlinkCodec {
    max_line_length: usize,
}

impl PjlinkCodec {
    /// Create a codec with the default maximum line length.
    pub fn new() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self { max_line_length }
    }

    /// Get the current maximum line length.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }
}

impl Default for PjlinkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PjlinkCodec {
    type Item = String;
    type Error = RemoteError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Skip a leading '\n' left over from a "\r\n" terminated line.
        while src.first() == Some(&b'\n') {
            let _ = src.split_to(1);
        }

        let Some(end) = src.iter().position(|&b| b == TERMINATOR) else {
            if src.len() > self.max_line_length {
                return Err(RemoteError::protocol(format!(
                    "line exceeds {} bytes",
                    self.max_line_length
                )));
            }
            return Ok(None);
        };

        if end > self.max_line_length {
            return Err(RemoteError::protocol(format!(
                "line exceeds {} bytes",
                self.max_line_length
            )));
        }

        let line = src.split_to(end + 1);
        let text = std::str::from_utf8(&line[..end])
            .map_err(|_| RemoteError::protocol("line is not valid UTF-8"))?;
        Ok(Some(text.to_string()))
    }
}

impl Encoder<String> for PjlinkCodec {
    type Error = RemoteError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_line_length {
            return Err(RemoteError::protocol(format!(
                "line exceeds {} bytes",
                self.max_line_length
            )));
        }
        if item.bytes().any(|b| b == TERMINATOR) {
            return Err(RemoteError::protocol("line contains a terminator"));
        }

        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(TERMINATOR);
        Ok(())
    }
}
