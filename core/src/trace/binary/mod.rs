//! Binary trace format (.trace)
//!
//! The binary format is optimized for compact storage and streaming reads.
//! The call body can optionally be LZ4-compressed as a single block.
//!
//! # File Structure
//!
//! ```text
//! +------------------------------------------------+
//! | Header (16 bytes)                              |
//! |  - magic: "GLTR"                               |
//! |  - version: u16                                |
//! |  - flags: u8                                   |
//! |  - reserved: u8                                |
//! |  - call_count: u64                             |
//! +------------------------------------------------+
//! | Call events (LZ4 block if COMPRESSED)          |
//! |  - event: u8 (0xC0)                            |
//! |  - name: u16 length + UTF-8                    |
//! |  - arg_count: u16                              |
//! |  - args: tagged values                         |
//! +------------------------------------------------+
//! ```
//!
//! # Value Tags
//!
//! | Tag | Value   | Payload                 |
//! |-----|---------|-------------------------|
//! | 0   | Null    | none                    |
//! | 1   | false   | none                    |
//! | 2   | true    | none                    |
//! | 3   | SInt    | i64                     |
//! | 4   | UInt    | u64                     |
//! | 5   | Float   | f32                     |
//! | 6   | Double  | f64                     |
//! | 7   | String  | u32 length + UTF-8      |
//! | 8   | Blob    | u32 length + bytes      |
//! | 9   | Array   | u32 count + values      |
//! | 10  | Pointer | u64                     |

mod reader;
mod writer;

use bitflags::bitflags;

pub use reader::TraceReader;
pub use writer::TraceWriter;

/// File magic.
pub const MAGIC: [u8; 4] = *b"GLTR";

/// Current format version.
pub const VERSION: u16 = 1;

/// Event tag introducing a call record.
pub(crate) const EVENT_CALL: u8 = 0xC0;

/// Largest string/blob/array length the reader accepts (256 MiB).
pub(crate) const MAX_LENGTH: u64 = 256 * 1024 * 1024;

/// Deepest array nesting the reader accepts.
pub(crate) const MAX_DEPTH: usize = 16;

pub(crate) mod tag {
    pub const NULL: u8 = 0;
    pub const FALSE: u8 = 1;
    pub const TRUE: u8 = 2;
    pub const SINT: u8 = 3;
    pub const UINT: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const STRING: u8 = 7;
    pub const BLOB: u8 = 8;
    pub const ARRAY: u8 = 9;
    pub const POINTER: u8 = 10;
}

bitflags! {
    /// Trace header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TraceFlags: u8 {
        /// Call body is stored as one LZ4 block
        const COMPRESSED = 0b0000_0001;
    }
}

/// Fixed-size trace header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceHeader {
    pub version: u16,
    pub flags: TraceFlags,
    /// Number of calls written (informational; the body is read to EOF)
    pub call_count: u64,
}

impl Default for TraceHeader {
    fn default() -> Self {
        Self {
            version: VERSION,
            flags: TraceFlags::empty(),
            call_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{CallRecord, CallSource, ParseError, Value};

    fn sample_calls() -> Vec<CallRecord> {
        vec![
            CallRecord::new(
                "glViewport",
                vec![
                    Value::SInt(0),
                    Value::SInt(0),
                    Value::SInt(640),
                    Value::SInt(480),
                ],
            ),
            CallRecord::new(
                "glBufferData",
                vec![
                    Value::UInt(0x8892),
                    Value::SInt(4),
                    Value::Blob(vec![1, 2, 3, 4]),
                    Value::UInt(0x88E4),
                ],
            ),
            CallRecord::new(
                "glVertexPointer",
                vec![
                    Value::SInt(3),
                    Value::UInt(0x1406),
                    Value::SInt(12),
                    Value::Null,
                ],
            ),
            CallRecord::new(
                "glLoadMatrixf",
                vec![Value::Array((0..16).map(|i| Value::Float(i as f32)).collect())],
            ),
            CallRecord::new(
                "glXSwapBuffers",
                vec![Value::Pointer(0x55aa_0000), Value::String("drawable".into())],
            ),
            CallRecord::new("glEnable", vec![Value::Bool(true), Value::Double(0.25)]),
        ]
    }

    fn read_all(bytes: &[u8]) -> Vec<CallRecord> {
        let mut reader = TraceReader::new(bytes).unwrap();
        let mut calls = Vec::new();
        while let Some(call) = reader.next_call().unwrap() {
            calls.push(call);
        }
        calls
    }

    #[test]
    fn test_roundtrip_plain() {
        let calls = sample_calls();
        let mut buffer = Vec::new();
        TraceWriter::new(&mut buffer, TraceFlags::empty())
            .write_trace(&calls)
            .unwrap();

        let reader = TraceReader::new(buffer.as_slice()).unwrap();
        assert_eq!(reader.header().call_count, calls.len() as u64);
        assert!(!reader.header().flags.contains(TraceFlags::COMPRESSED));

        assert_eq!(read_all(&buffer), calls);
    }

    #[test]
    fn test_roundtrip_compressed() {
        // Many identical frames compress well
        let mut calls = Vec::new();
        for _ in 0..200 {
            calls.push(CallRecord::new("glClear", vec![Value::UInt(0x4000)]));
            calls.push(CallRecord::new("glFlush", vec![]));
        }

        let mut plain = Vec::new();
        TraceWriter::new(&mut plain, TraceFlags::empty())
            .write_trace(&calls)
            .unwrap();
        let mut compressed = Vec::new();
        TraceWriter::new(&mut compressed, TraceFlags::COMPRESSED)
            .write_trace(&calls)
            .unwrap();

        assert!(compressed.len() < plain.len() / 4);
        assert_eq!(read_all(&compressed), calls);
    }

    #[test]
    fn test_bad_magic() {
        let bytes = b"NOPE\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00";
        match TraceReader::new(&bytes[..]) {
            Err(ParseError::BadMagic(magic)) => assert_eq!(&magic, b"NOPE"),
            other => panic!("Expected BadMagic, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unsupported_version() {
        let mut buffer = Vec::new();
        TraceWriter::new(&mut buffer, TraceFlags::empty())
            .write_trace(&[])
            .unwrap();
        buffer[4] = 9;
        assert!(matches!(
            TraceReader::new(buffer.as_slice()),
            Err(ParseError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated_record_is_parse_error() {
        let calls = sample_calls();
        let mut buffer = Vec::new();
        TraceWriter::new(&mut buffer, TraceFlags::empty())
            .write_trace(&calls)
            .unwrap();
        // Cut the last record in half
        buffer.truncate(buffer.len() - 3);

        let mut reader = TraceReader::new(buffer.as_slice()).unwrap();
        let mut decoded = 0;
        let err = loop {
            match reader.next_call() {
                Ok(Some(_)) => decoded += 1,
                Ok(None) => panic!("Expected truncation error"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, ParseError::Truncated));
        assert_eq!(decoded, calls.len() - 1);
    }

    #[test]
    fn test_unknown_value_tag() {
        let mut buffer = Vec::new();
        TraceWriter::new(&mut buffer, TraceFlags::empty())
            .write_trace(&[CallRecord::new("glEnable", vec![Value::UInt(1)])])
            .unwrap();
        // header(16) + event(1) + name len(2) + "glEnable"(8) + arg count(2)
        let tag_offset = 16 + 1 + 2 + 8 + 2;
        buffer[tag_offset] = 42;

        let mut reader = TraceReader::new(buffer.as_slice()).unwrap();
        assert!(matches!(
            reader.next_call(),
            Err(ParseError::UnknownValueTag(42))
        ));
    }

    #[test]
    fn test_oversize_length_rejected() {
        let mut buffer = Vec::new();
        TraceWriter::new(&mut buffer, TraceFlags::empty())
            .write_trace(&[CallRecord::new("glX", vec![Value::Blob(vec![0])])])
            .unwrap();
        // header(16) + event(1) + name len(2) + "glX"(3) + arg count(2) + tag(1)
        let len_offset = 16 + 1 + 2 + 3 + 2 + 1;
        buffer[len_offset..len_offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        let mut reader = TraceReader::new(buffer.as_slice()).unwrap();
        assert!(matches!(reader.next_call(), Err(ParseError::TooLarge(_))));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let mut value = Value::SInt(1);
        for _ in 0..(MAX_DEPTH + 2) {
            value = Value::Array(vec![value]);
        }
        let mut buffer = Vec::new();
        TraceWriter::new(&mut buffer, TraceFlags::empty())
            .write_trace(&[CallRecord::new("glX", vec![value])])
            .unwrap();

        let mut reader = TraceReader::new(buffer.as_slice()).unwrap();
        assert!(matches!(reader.next_call(), Err(ParseError::TooDeep(_))));
    }
}
