use super::DEFAULT_MAX_PREFIX_LEN;
use crate::domain::{LogEntry, Severity};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("connection closed before the level delimiter ':' was received")]
    MissingDelimiter,

    #[error("no ':' found within the first {limit} bytes")]
    PrefixTooLong { limit: usize },

    #[error("invalid log level {0:?}")]
    InvalidLevel(String),

    #[error("log level {0} is outside 0..=3")]
    LevelOutOfRange(i64),
}

/// Incremental decoder for the byte stream of a single connection.
///
/// Feed every chunk read from the socket, then call [`LineDecoder::finish`]
/// once the peer has closed its side.
#[derive(Debug)]
pub struct LineDecoder {
    max_prefix_len: usize,
    prefix: Vec<u8>,
    level: Option<Severity>,
    message: Vec<u8>,
    // Set once a NUL byte is seen; the rest of the stream is ignored.
    terminated: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PREFIX_LEN)
    }
}

impl LineDecoder {
    #[must_use]
    pub fn new(max_prefix_len: usize) -> Self {
        Self {
            max_prefix_len,
            prefix: Vec::new(),
            level: None,
            message: Vec::new(),
            terminated: false,
        }
    }

    #[cfg(test)]
    fn level(&self) -> Option<Severity> {
        self.level
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        if self.terminated {
            return Ok(());
        }

        let mut rest = chunk;
        if self.level.is_none() {
            match rest.iter().position(|b| *b == b':') {
                Some(pos) => {
                    self.prefix.extend_from_slice(&rest[..pos]);
                    self.check_prefix_len()?;
                    self.level = Some(parse_level(&self.prefix)?);
                    self.prefix.clear();
                    rest = &rest[pos + 1..];
                }
                None => {
                    self.prefix.extend_from_slice(rest);
                    return self.check_prefix_len();
                }
            }
        }

        match rest.iter().position(|b| *b == 0) {
            Some(nul) => {
                self.message.extend_from_slice(&rest[..nul]);
                self.terminated = true;
            }
            None => self.message.extend_from_slice(rest),
        }
        Ok(())
    }

    /// Complete decoding after end of stream.
    pub fn finish(self) -> Result<LogEntry, DecodeError> {
        let level = self.level.ok_or(DecodeError::MissingDelimiter)?;
        let message = String::from_utf8_lossy(&self.message).into_owned();
        Ok(LogEntry { level, message })
    }

    fn check_prefix_len(&self) -> Result<(), DecodeError> {
        if self.prefix.len() >= self.max_prefix_len {
            return Err(DecodeError::PrefixTooLong {
                limit: self.max_prefix_len,
            });
        }
        Ok(())
    }
}

/// Decode a complete connection payload in one call.
pub fn decode(payload: &[u8]) -> Result<LogEntry, DecodeError> {
    let mut decoder = LineDecoder::default();
    decoder.feed(payload)?;
    decoder.finish()
}

fn parse_level(raw: &[u8]) -> Result<Severity, DecodeError> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| DecodeError::InvalidLevel(String::from_utf8_lossy(raw).into_owned()))?;
    let value = text
        .trim_ascii()
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidLevel(text.to_string()))?;
    Severity::try_from(value).map_err(|e| DecodeError::LevelOutOfRange(e.0))
}
