//! Binary trace format reader
//!
//! Streams call records from a .trace file, decompressing the body up front
//! when the header says it is compressed.

use byteorder::{LittleEndian, ReadBytesExt};
use lz4_flex::decompress_size_prepended;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;

use super::{EVENT_CALL, MAGIC, MAX_DEPTH, MAX_LENGTH, TraceFlags, TraceHeader, VERSION, tag};
use crate::trace::{CallRecord, CallSource, ParseError, Value};

/// Call body, either streamed from the underlying reader or held in memory
/// after decompression.
enum Body<R> {
    Plain(R),
    Unpacked(Cursor<Vec<u8>>),
}

impl<R: Read> Read for Body<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Body::Plain(reader) => reader.read(buf),
            Body::Unpacked(cursor) => cursor.read(buf),
        }
    }
}

/// Reader for the binary trace format
pub struct TraceReader<R: Read> {
    header: TraceHeader,
    body: Body<R>,
}

impl TraceReader<BufReader<File>> {
    /// Open a trace file from disk.
    pub fn open(path: &Path) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> TraceReader<R> {
    /// Create a reader, consuming and validating the header.
    pub fn new(mut reader: R) -> Result<Self, ParseError> {
        let header = read_header(&mut reader)?;

        let body = if header.flags.contains(TraceFlags::COMPRESSED) {
            let compressed_len = u64::from(reader.read_u32::<LittleEndian>()?);
            if compressed_len > MAX_LENGTH {
                return Err(ParseError::TooLarge(compressed_len));
            }
            let mut compressed = Vec::new();
            reader
                .by_ref()
                .take(compressed_len)
                .read_to_end(&mut compressed)?;
            if compressed.len() as u64 != compressed_len {
                return Err(ParseError::Truncated);
            }

            let unpacked = decompress_size_prepended(&compressed)
                .map_err(|e| ParseError::Decompress(e.to_string()))?;
            Body::Unpacked(Cursor::new(unpacked))
        } else {
            Body::Plain(reader)
        };

        Ok(Self { header, body })
    }

    /// The header read when the trace was opened
    pub fn header(&self) -> &TraceHeader {
        &self.header
    }

    /// Read one event tag, distinguishing a clean end of file.
    fn read_event(&mut self) -> Result<Option<u8>, ParseError> {
        let mut event = [0u8; 1];
        loop {
            match self.body.read(&mut event) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(event[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::Io(e)),
            }
        }
    }

    fn read_call(&mut self) -> Result<Option<CallRecord>, ParseError> {
        let Some(event) = self.read_event()? else {
            return Ok(None);
        };
        if event != EVENT_CALL {
            return Err(ParseError::UnknownEvent(event));
        }

        let name_len = self
            .body
            .read_u16::<LittleEndian>()
            .map_err(ParseError::inside_record)?;
        let name = read_string(&mut self.body, u64::from(name_len), "call name")?;

        let arg_count = self
            .body
            .read_u16::<LittleEndian>()
            .map_err(ParseError::inside_record)?;
        let mut args = Vec::with_capacity(usize::from(arg_count));
        for _ in 0..arg_count {
            args.push(read_value(&mut self.body, 0)?);
        }

        Ok(Some(CallRecord { name, args }))
    }
}

impl<R: Read> CallSource for TraceReader<R> {
    fn next_call(&mut self) -> Result<Option<CallRecord>, ParseError> {
        self.read_call()
    }
}

/// Read and validate the 16-byte header
fn read_header<R: Read>(reader: &mut R) -> Result<TraceHeader, ParseError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(ParseError::BadMagic(magic));
    }

    let version = reader.read_u16::<LittleEndian>()?;
    if version != VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }

    let flags = TraceFlags::from_bits_truncate(reader.read_u8()?);
    let _reserved = reader.read_u8()?;
    let call_count = reader.read_u64::<LittleEndian>()?;

    Ok(TraceHeader {
        version,
        flags,
        call_count,
    })
}

fn read_len<R: Read>(reader: &mut R) -> Result<u64, ParseError> {
    let len = u64::from(
        reader
            .read_u32::<LittleEndian>()
            .map_err(ParseError::inside_record)?,
    );
    if len > MAX_LENGTH {
        return Err(ParseError::TooLarge(len));
    }
    Ok(len)
}

fn read_bytes<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>, ParseError> {
    let mut bytes = Vec::new();
    reader
        .by_ref()
        .take(len)
        .read_to_end(&mut bytes)
        .map_err(ParseError::inside_record)?;
    if bytes.len() as u64 != len {
        return Err(ParseError::Truncated);
    }
    Ok(bytes)
}

fn read_string<R: Read>(
    reader: &mut R,
    len: u64,
    what: &'static str,
) -> Result<String, ParseError> {
    let bytes = read_bytes(reader, len)?;
    String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8(what))
}

fn read_value<R: Read>(reader: &mut R, depth: usize) -> Result<Value, ParseError> {
    let value_tag = reader.read_u8().map_err(ParseError::inside_record)?;
    let value = match value_tag {
        tag::NULL => Value::Null,
        tag::FALSE => Value::Bool(false),
        tag::TRUE => Value::Bool(true),
        tag::SINT => Value::SInt(
            reader
                .read_i64::<LittleEndian>()
                .map_err(ParseError::inside_record)?,
        ),
        tag::UINT => Value::UInt(
            reader
                .read_u64::<LittleEndian>()
                .map_err(ParseError::inside_record)?,
        ),
        tag::FLOAT => Value::Float(
            reader
                .read_f32::<LittleEndian>()
                .map_err(ParseError::inside_record)?,
        ),
        tag::DOUBLE => Value::Double(
            reader
                .read_f64::<LittleEndian>()
                .map_err(ParseError::inside_record)?,
        ),
        tag::STRING => {
            let len = read_len(reader)?;
            Value::String(read_string(reader, len, "string value")?)
        }
        tag::BLOB => {
            let len = read_len(reader)?;
            Value::Blob(read_bytes(reader, len)?)
        }
        tag::ARRAY => {
            if depth >= MAX_DEPTH {
                return Err(ParseError::TooDeep(MAX_DEPTH));
            }
            let count = read_len(reader)?;
            // Cap the preallocation; a lying count still fails on EOF
            let mut values = Vec::with_capacity(count.min(1024) as usize);
            for _ in 0..count {
                values.push(read_value(reader, depth + 1)?);
            }
            Value::Array(values)
        }
        tag::POINTER => Value::Pointer(
            reader
                .read_u64::<LittleEndian>()
                .map_err(ParseError::inside_record)?,
        ),
        other => return Err(ParseError::UnknownValueTag(other)),
    };
    Ok(value)
}
