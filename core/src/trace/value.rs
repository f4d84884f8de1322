//! Serialized argument values

use std::fmt;

/// A serialized argument value as stored in a trace.
///
/// `Null` stands for a capture-time value with no meaningful replay-time
/// counterpart (typically a pointer into memory that no longer exists).
/// `Pointer` carries a capture-time address or byte offset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    SInt(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
    Array(Vec<Value>),
    Pointer(u64),
}

impl Value {
    /// Short tag name, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::SInt(_) => "sint",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
            Value::Array(_) => "array",
            Value::Pointer(_) => "pointer",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::SInt(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Blob(bytes) => write!(f, "blob({})", bytes.len()),
            Value::Array(values) => {
                f.write_str("{")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("}")
            }
            Value::Pointer(addr) => write!(f, "0x{:x}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Blob(vec![1, 2, 3]).to_string(), "blob(3)");
        assert_eq!(
            Value::Array(vec![Value::Float(0.5), Value::SInt(-1)]).to_string(),
            "{0.5, -1}"
        );
        assert_eq!(Value::String("abc".into()).to_string(), "\"abc\"");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Pointer(4).kind_name(), "pointer");
        assert_eq!(Value::Double(1.0).kind_name(), "double");
        assert!(Value::Null.is_null());
        assert!(!Value::UInt(0).is_null());
    }
}
