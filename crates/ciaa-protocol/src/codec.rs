//! Tokio codec splitting raw shell output into lines

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::ProtocolError;

/// Default upper bound for a single decoded line.
///
/// A PTY wraps nothing for us, so a runaway command printing without
/// newlines would otherwise buffer without limit.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Decoder yielding one `String` per `\n`-terminated line.
///
/// The terminator is removed; any `\r` is left for sanitization. Bytes that
/// are not valid UTF-8 are replaced rather than rejected.
#[derive(Debug)]
pub struct ShellLineCodec {
    /// Index to resume the newline search from
    next_index: usize,
    /// Maximum accepted line length in bytes
    max_length: usize,
}

impl ShellLineCodec {
    /// Create a codec with the default line limit
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a codec with a custom line limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
        }
    }

    /// Maximum accepted line length in bytes
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for ShellLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ShellLineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let read_to = std::cmp::min(self.max_length.saturating_add(1), src.len());

        match src[self.next_index..read_to].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let newline = self.next_index + offset;
                self.next_index = 0;
                let line = src.split_to(newline + 1);
                Ok(Some(
                    String::from_utf8_lossy(&line[..line.len() - 1]).into_owned(),
                ))
            }
            None if src.len() > self.max_length => Err(ProtocolError::LineTooLong {
                max: self.max_length,
            }),
            None => {
                // Need more data
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Unterminated fragment left when the channel closed
        self.next_index = 0;
        let rest = src.split_to(src.len());
        Ok(Some(String::from_utf8_lossy(&rest).into_owned()))
    }
}
