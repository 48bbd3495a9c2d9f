//! The `<level>:<message>` line protocol.
//!
//! One connection carries exactly one entry. The level is an ASCII decimal
//! integer terminated by the first `:`; everything after it, up to the end
//! of the stream, is the message.

pub mod decoder;

pub use decoder::{DecodeError, LineDecoder, decode};

use crate::domain::Severity;

/// The POSIX `LINE_MAX`; the level prefix must fit within it.
pub const DEFAULT_MAX_PREFIX_LEN: usize = 2048;

/// Encode an entry the way clients put it on the wire.
#[must_use]
pub fn encode(level: Severity, message: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 2);
    out.extend_from_slice(level.wire_value().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(message.as_bytes());
    out
}
