//! Errors raised while decoding traces

use std::io;

/// Failure to decode a trace.
///
/// During playback a `ParseError` ends the trace early: everything decoded
/// before it is still replayed.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a trace file (bad magic {0:02x?})")]
    BadMagic([u8; 4]),
    #[error("Unsupported trace version: {0}")]
    UnsupportedVersion(u16),
    #[error("Unknown event tag 0x{0:02x}")]
    UnknownEvent(u8),
    #[error("Unknown value tag {0}")]
    UnknownValueTag(u8),
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
    #[error("Trace truncated inside a call record")]
    Truncated,
    #[error("Length {0} exceeds the decoder limit")]
    TooLarge(u64),
    #[error("Arrays nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("Failed to decompress trace body: {0}")]
    Decompress(String),
    #[error("Invalid text trace: {0}")]
    Script(String),
}

impl ParseError {
    /// Map an I/O error from inside a record, where EOF means truncation.
    pub(crate) fn inside_record(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ParseError::Truncated
        } else {
            ParseError::Io(err)
        }
    }
}
