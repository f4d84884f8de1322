//! Recoverable replay errors
//!
//! None of these stop playback; the dispatcher logs them and moves on.

use thiserror::Error;

use crate::gl::error_name;

/// A recorded argument that cannot be turned into a native value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterializationError {
    #[error("{call}: expected {expected} arguments, got {actual}")]
    Arity {
        call: String,
        expected: usize,
        actual: usize,
    },

    #[error("{call}: parameter '{param}' cannot take a {found} value")]
    TypeMismatch {
        call: String,
        param: &'static str,
        found: &'static str,
    },

    #[error("{call}: value {value} is out of range for parameter '{param}'")]
    OutOfRange {
        call: String,
        param: &'static str,
        value: String,
    },
}

/// A call name with no entry in the call table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported call {name}")]
pub struct UnsupportedCallError {
    pub name: String,
}

/// Error reported by the native API after a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("call #{call_no} {call}: glGetError() = {}", error_label(.code))]
pub struct NativeApiError {
    pub call_no: u64,
    pub call: String,
    pub code: u32,
}

fn error_label(code: &u32) -> String {
    match error_name(*code) {
        Some(name) => name.to_string(),
        None => format!("0x{:04x}", code),
    }
}
