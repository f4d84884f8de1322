//! Trace model and call record sources
//!
//! A trace is an ordered sequence of [`CallRecord`]s. The replay engine pulls
//! them one at a time through the [`CallSource`] trait and never keeps more
//! than the current record alive.
//!
//! Two on-disk formats are provided:
//!
//! - **Binary (`.trace`)**: compact, optionally LZ4-compressed ([`binary`])
//! - **Text (`.toml`)**: human-editable `[[call]]` tables ([`script`])

pub mod binary;
mod error;
pub mod script;
mod value;

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

pub use binary::{TraceFlags, TraceHeader, TraceReader, TraceWriter};
pub use error::ParseError;
pub use script::TraceScript;
pub use value::Value;

/// One decoded call: the API entry point name and its serialized arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub name: String,
    pub args: Vec<Value>,
}

impl CallRecord {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

/// Pull interface over a decoded trace.
///
/// `Ok(None)` marks the end of the trace. A source is released by dropping
/// it; the playback driver drops its source as soon as playback finishes.
pub trait CallSource {
    /// Decode the next call record.
    fn next_call(&mut self) -> Result<Option<CallRecord>, ParseError>;
}

impl<S: CallSource + ?Sized> CallSource for Box<S> {
    fn next_call(&mut self) -> Result<Option<CallRecord>, ParseError> {
        (**self).next_call()
    }
}

/// In-memory call source, used for text traces and tests.
#[derive(Debug, Default, Clone)]
pub struct CallQueue {
    calls: VecDeque<CallRecord>,
}

impl CallQueue {
    pub fn new(calls: impl IntoIterator<Item = CallRecord>) -> Self {
        Self {
            calls: calls.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl CallSource for CallQueue {
    fn next_call(&mut self) -> Result<Option<CallRecord>, ParseError> {
        Ok(self.calls.pop_front())
    }
}

/// Open a trace file, choosing the format from its extension.
///
/// `.toml` files are parsed as text traces up front; everything else is
/// streamed through the binary reader.
pub fn open(path: &Path) -> Result<Box<dyn CallSource>, ParseError> {
    let is_text = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_text {
        let script = TraceScript::from_file(path)?;
        Ok(Box::new(CallQueue::new(script.into_records()?)))
    } else {
        Ok(Box::new(TraceReader::open(path)?))
    }
}
