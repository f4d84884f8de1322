//! Binary trace format writer
//!
//! Writes .trace files with optional LZ4 compression of the call body.

use byteorder::{LittleEndian, WriteBytesExt};
use lz4_flex::compress_prepend_size;
use std::io::{self, Write};

use super::{EVENT_CALL, MAGIC, TraceFlags, VERSION, tag};
use crate::trace::{CallRecord, Value};

/// Writer for the binary trace format
pub struct TraceWriter<W: Write> {
    writer: W,
    flags: TraceFlags,
}

impl<W: Write> TraceWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W, flags: TraceFlags) -> Self {
        Self { writer, flags }
    }

    /// Write a complete trace to the output
    pub fn write_trace(&mut self, calls: &[CallRecord]) -> io::Result<()> {
        self.writer.write_all(&MAGIC)?;
        self.writer.write_u16::<LittleEndian>(VERSION)?;
        self.writer.write_u8(self.flags.bits())?;
        self.writer.write_u8(0)?;
        self.writer.write_u64::<LittleEndian>(calls.len() as u64)?;

        if self.flags.contains(TraceFlags::COMPRESSED) {
            let mut body = Vec::new();
            for call in calls {
                write_call(&mut body, call)?;
            }
            let compressed = compress_prepend_size(&body);
            write_len(&mut self.writer, compressed.len())?;
            self.writer.write_all(&compressed)?;
        } else {
            for call in calls {
                write_call(&mut self.writer, call)?;
            }
        }

        self.writer.flush()
    }
}

fn too_long(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} too long for the trace format", what),
    )
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    let len = u32::try_from(len).map_err(|_| too_long("value"))?;
    writer.write_u32::<LittleEndian>(len)
}

fn write_call<W: Write>(writer: &mut W, call: &CallRecord) -> io::Result<()> {
    writer.write_u8(EVENT_CALL)?;

    let name_len = u16::try_from(call.name.len()).map_err(|_| too_long("call name"))?;
    writer.write_u16::<LittleEndian>(name_len)?;
    writer.write_all(call.name.as_bytes())?;

    let arg_count = u16::try_from(call.args.len()).map_err(|_| too_long("argument list"))?;
    writer.write_u16::<LittleEndian>(arg_count)?;
    for arg in &call.args {
        write_value(writer, arg)?;
    }
    Ok(())
}

fn write_value<W: Write>(writer: &mut W, value: &Value) -> io::Result<()> {
    match value {
        Value::Null => writer.write_u8(tag::NULL),
        Value::Bool(false) => writer.write_u8(tag::FALSE),
        Value::Bool(true) => writer.write_u8(tag::TRUE),
        Value::SInt(v) => {
            writer.write_u8(tag::SINT)?;
            writer.write_i64::<LittleEndian>(*v)
        }
        Value::UInt(v) => {
            writer.write_u8(tag::UINT)?;
            writer.write_u64::<LittleEndian>(*v)
        }
        Value::Float(v) => {
            writer.write_u8(tag::FLOAT)?;
            writer.write_f32::<LittleEndian>(*v)
        }
        Value::Double(v) => {
            writer.write_u8(tag::DOUBLE)?;
            writer.write_f64::<LittleEndian>(*v)
        }
        Value::String(s) => {
            writer.write_u8(tag::STRING)?;
            write_len(writer, s.len())?;
            writer.write_all(s.as_bytes())
        }
        Value::Blob(bytes) => {
            writer.write_u8(tag::BLOB)?;
            write_len(writer, bytes.len())?;
            writer.write_all(bytes)
        }
        Value::Array(values) => {
            writer.write_u8(tag::ARRAY)?;
            write_len(writer, values.len())?;
            for value in values {
                write_value(writer, value)?;
            }
            Ok(())
        }
        Value::Pointer(addr) => {
            writer.write_u8(tag::POINTER)?;
            writer.write_u64::<LittleEndian>(*addr)
        }
    }
}
