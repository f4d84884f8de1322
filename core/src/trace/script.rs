//! Text trace format (.toml)
//!
//! A human-editable rendition of a trace, handy for hand-written regression
//! traces and for inspecting binary ones.
//!
//! ```toml
//! [[call]]
//! name = "glViewport"
//! args = [0, 0, 512, 300]
//!
//! [[call]]
//! name = "glVertexPointer"
//! args = [3, 5126, 0, "ptr:0x0"]
//! ```
//!
//! TOML has no null or byte-string type, so a few string forms are reserved:
//!
//! | String          | Value             |
//! |-----------------|-------------------|
//! | `"null"`        | `Null`            |
//! | `"ptr:0x1f00"`  | `Pointer(0x1f00)` |
//! | `"blob:00ff"`   | `Blob([0, 255])`  |
//! | `"uint:<n>"`    | `UInt(n)`         |
//! | `"str:<s>"`     | `String(s)`       |

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CallRecord, ParseError, Value};

/// Parsed text trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceScript {
    #[serde(default, rename = "call")]
    pub calls: Vec<ScriptCall>,
}

/// One `[[call]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<toml::Value>,
}

impl TraceScript {
    /// Parse from TOML text
    pub fn from_str(source: &str) -> Result<Self, ParseError> {
        toml::from_str(source).map_err(|e| ParseError::Script(e.to_string()))
    }

    /// Parse from a file
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_str(&source)
    }

    /// Render as TOML text
    pub fn to_toml_string(&self) -> Result<String, ParseError> {
        toml::to_string_pretty(self).map_err(|e| ParseError::Script(e.to_string()))
    }

    /// Build a script from decoded call records
    pub fn from_records(records: &[CallRecord]) -> Self {
        let calls = records
            .iter()
            .map(|record| ScriptCall {
                name: record.name.clone(),
                args: record.args.iter().map(value_to_toml).collect(),
            })
            .collect();
        Self { calls }
    }

    /// Convert into call records
    pub fn into_records(self) -> Result<Vec<CallRecord>, ParseError> {
        self.calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| {
                let args = call
                    .args
                    .iter()
                    .map(toml_to_value)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| {
                        ParseError::Script(format!("call #{} ({}): {}", index + 1, call.name, e))
                    })?;
                Ok(CallRecord {
                    name: call.name,
                    args,
                })
            })
            .collect()
    }
}

fn toml_to_value(value: &toml::Value) -> Result<Value, String> {
    match value {
        toml::Value::Integer(v) => Ok(Value::SInt(*v)),
        toml::Value::Float(v) => Ok(Value::Double(*v)),
        toml::Value::Boolean(v) => Ok(Value::Bool(*v)),
        toml::Value::String(s) => parse_special(s),
        toml::Value::Array(values) => values
            .iter()
            .map(toml_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        toml::Value::Datetime(_) => Err("datetime values are not supported".to_string()),
        toml::Value::Table(_) => Err("table values are not supported".to_string()),
    }
}

fn parse_special(s: &str) -> Result<Value, String> {
    if s == "null" {
        return Ok(Value::Null);
    }
    if let Some(addr) = s.strip_prefix("ptr:") {
        let digits = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .ok_or_else(|| format!("pointer '{}' must be hexadecimal (0x...)", addr))?;
        return u64::from_str_radix(digits, 16)
            .map(Value::Pointer)
            .map_err(|e| format!("invalid pointer '{}': {}", addr, e));
    }
    if let Some(hex_bytes) = s.strip_prefix("blob:") {
        return hex::decode(hex_bytes)
            .map(Value::Blob)
            .map_err(|e| format!("invalid blob: {}", e));
    }
    if let Some(digits) = s.strip_prefix("uint:") {
        return digits
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|e| format!("invalid uint '{}': {}", digits, e));
    }
    if let Some(literal) = s.strip_prefix("str:") {
        return Ok(Value::String(literal.to_string()));
    }
    Ok(Value::String(s.to_string()))
}

fn is_reserved(s: &str) -> bool {
    s == "null"
        || ["ptr:", "blob:", "uint:", "str:"]
            .iter()
            .any(|prefix| s.starts_with(prefix))
}

fn value_to_toml(value: &Value) -> toml::Value {
    match value {
        Value::Null => toml::Value::String("null".to_string()),
        Value::Bool(v) => toml::Value::Boolean(*v),
        Value::SInt(v) => toml::Value::Integer(*v),
        Value::UInt(v) => toml::Value::String(format!("uint:{}", v)),
        Value::Float(v) => toml::Value::Float(f64::from(*v)),
        Value::Double(v) => toml::Value::Float(*v),
        Value::String(s) if is_reserved(s) => toml::Value::String(format!("str:{}", s)),
        Value::String(s) => toml::Value::String(s.clone()),
        Value::Blob(bytes) => toml::Value::String(format!("blob:{}", hex::encode(bytes))),
        Value::Array(values) => toml::Value::Array(values.iter().map(value_to_toml).collect()),
        Value::Pointer(addr) => toml::Value::String(format!("ptr:0x{:x}", addr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_script() {
        let script = TraceScript::from_str(
            r#"
[[call]]
name = "glViewport"
args = [0, 0, 512, 300]

[[call]]
name = "glVertexPointer"
args = [3, 5126, 12, "null"]

[[call]]
name = "glColorPointer"
args = [4, 5121, 0, "ptr:0x40"]

[[call]]
name = "glFlush"
"#,
        )
        .unwrap();

        let records = script.into_records().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].name, "glViewport");
        assert_eq!(records[0].args[2], Value::SInt(512));
        assert_eq!(records[1].args[3], Value::Null);
        assert_eq!(records[2].args[3], Value::Pointer(0x40));
        assert!(records[3].args.is_empty());
    }

    #[test]
    fn test_special_strings() {
        assert_eq!(parse_special("blob:00ff").unwrap(), Value::Blob(vec![0, 255]));
        assert_eq!(
            parse_special("uint:18446744073709551615").unwrap(),
            Value::UInt(u64::MAX)
        );
        assert_eq!(
            parse_special("str:null").unwrap(),
            Value::String("null".into())
        );
        assert_eq!(
            parse_special("hello").unwrap(),
            Value::String("hello".into())
        );
        assert!(parse_special("ptr:1234").is_err());
        assert!(parse_special("blob:zz").is_err());
    }

    #[test]
    fn test_decompile_preserves_values() {
        let records = vec![
            CallRecord::new(
                "glBufferData",
                vec![
                    Value::UInt(0x8892),
                    Value::SInt(3),
                    Value::Blob(vec![7, 8, 9]),
                    Value::UInt(0x88E4),
                ],
            ),
            CallRecord::new(
                "glLabel",
                vec![
                    Value::String("ptr:looks-special".into()),
                    Value::Pointer(0xdead),
                    Value::Null,
                    Value::Float(0.5),
                    Value::Array(vec![Value::Bool(true), Value::SInt(-2)]),
                ],
            ),
        ];

        let text = TraceScript::from_records(&records).to_toml_string().unwrap();
        let parsed = TraceScript::from_str(&text).unwrap().into_records().unwrap();

        assert_eq!(parsed[0], records[0]);
        assert_eq!(parsed[1].args[0], records[1].args[0]);
        assert_eq!(parsed[1].args[1], records[1].args[1]);
        assert_eq!(parsed[1].args[2], Value::Null);
        // f32 widens to f64 in text form
        assert_eq!(parsed[1].args[3], Value::Double(0.5));
        assert_eq!(parsed[1].args[4], records[1].args[4]);
    }

    #[test]
    fn test_table_argument_rejected() {
        let script = TraceScript::from_str(
            r#"
[[call]]
name = "glEnable"
args = [{ cap = 1 }]
"#,
        )
        .unwrap();
        match script.into_records() {
            Err(ParseError::Script(message)) => assert!(message.contains("glEnable")),
            other => panic!("Expected script error, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            TraceScript::from_str("[[call]\nname ="),
            Err(ParseError::Script(_))
        ));
    }
}
