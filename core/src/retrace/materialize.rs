//! Argument materialization
//!
//! Turns serialized [`Value`]s into the native arguments a [`GlApi`] routine
//! receives. Each parameter of a call carries a [`ParamKind`] that selects the
//! conversion rule. Two rules deserve attention:
//!
//! - **Client pointers**: `Null` becomes the zero pointer, an integer or
//!   `Pointer` value is reinterpreted as an address-sized offset into the
//!   bound buffer object. Any other value, including a `Blob`, is rejected:
//!   the native call may keep the pointer long after the argument is gone.
//!   Memory is never dereferenced here.
//! - **Object names**: buffer, texture and display-list names recorded at
//!   capture time go through a [`HandleMap`] so they match the names the
//!   replay-time implementation handed out.
//!
//! [`GlApi`]: crate::gl::GlApi

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::error::MaterializationError;
use crate::trace::Value;

/// Kind of GL object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Buffer,
    Texture,
    List,
}

/// Conversion rule for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    UInt,
    /// `GLsizeiptr` / `GLintptr`
    Size,
    Float,
    Double,
    FloatArray,
    IntArray,
    /// Client memory pointer (vertex data, indices)
    ClientPointer,
    /// Array of client memory pointers
    PointerArray,
    /// Raw bytes uploaded by the call, or null
    Blob,
    Handle(HandleKind),
    Handles(HandleKind),
    /// Output array of names produced by a generator call
    GenNames(HandleKind),
}

/// Parameter descriptor attached to a call table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

/// Materialized native argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Size(isize),
    Float(f32),
    Double(f64),
    Pointer(usize),
    Floats(Vec<f32>),
    Ints(Vec<i32>),
    UInts(Vec<u32>),
    Pointers(Vec<usize>),
    Bytes(Option<Vec<u8>>),
}

impl Arg {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Arg::Bool(_) => "bool",
            Arg::Int(_) => "int",
            Arg::UInt(_) => "uint",
            Arg::Size(_) => "size",
            Arg::Float(_) => "float",
            Arg::Double(_) => "double",
            Arg::Pointer(_) => "pointer",
            Arg::Floats(_) => "float array",
            Arg::Ints(_) => "int array",
            Arg::UInts(_) => "uint array",
            Arg::Pointers(_) => "pointer array",
            Arg::Bytes(_) => "bytes",
        }
    }
}

/// Borrow a native parameter out of a materialized [`Arg`].
pub trait FromArg<'a>: Sized {
    fn from_arg(arg: &'a Arg) -> Option<Self>;
}

macro_rules! from_arg {
    ($ty:ty, $variant:ident) => {
        impl<'a> FromArg<'a> for $ty {
            fn from_arg(arg: &'a Arg) -> Option<Self> {
                match arg {
                    Arg::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

from_arg!(bool, Bool);
from_arg!(i32, Int);
from_arg!(u32, UInt);
from_arg!(isize, Size);
from_arg!(f32, Float);
from_arg!(f64, Double);

impl<'a> FromArg<'a> for usize {
    fn from_arg(arg: &'a Arg) -> Option<Self> {
        match arg {
            Arg::Pointer(addr) => Some(*addr),
            _ => None,
        }
    }
}

impl<'a> FromArg<'a> for &'a [f32] {
    fn from_arg(arg: &'a Arg) -> Option<Self> {
        match arg {
            Arg::Floats(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> FromArg<'a> for &'a [i32] {
    fn from_arg(arg: &'a Arg) -> Option<Self> {
        match arg {
            Arg::Ints(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> FromArg<'a> for &'a [u32] {
    fn from_arg(arg: &'a Arg) -> Option<Self> {
        match arg {
            Arg::UInts(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> FromArg<'a> for &'a [usize] {
    fn from_arg(arg: &'a Arg) -> Option<Self> {
        match arg {
            Arg::Pointers(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> FromArg<'a> for Option<&'a [u8]> {
    fn from_arg(arg: &'a Arg) -> Option<Self> {
        match arg {
            Arg::Bytes(bytes) => Some(bytes.as_deref()),
            _ => None,
        }
    }
}

/// Recorded-to-replay object name translation.
///
/// Unmapped names translate to themselves; name 0 is never remapped.
#[derive(Debug, Default, Clone)]
pub struct HandleMap {
    names: HashMap<(HandleKind, u32), u32>,
}

impl HandleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: HandleKind, recorded: u32, replay: u32) {
        if recorded != 0 {
            self.names.insert((kind, recorded), replay);
        }
    }

    pub fn get(&self, kind: HandleKind, recorded: u32) -> u32 {
        self.names
            .get(&(kind, recorded))
            .copied()
            .unwrap_or(recorded)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Scalar view of a numeric value.
enum Number {
    Int(i128),
    Float(f64),
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Bool(v) => Some(Number::Int(i128::from(*v))),
        Value::SInt(v) => Some(Number::Int(i128::from(*v))),
        Value::UInt(v) => Some(Number::Int(i128::from(*v))),
        Value::Float(v) => Some(Number::Float(f64::from(*v))),
        Value::Double(v) => Some(Number::Float(*v)),
        _ => None,
    }
}

/// Converts serialized arguments for one call at a time.
#[derive(Debug, Default)]
pub struct Materializer {
    handles: HandleMap,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> &HandleMap {
        &self.handles
    }

    /// Materialize every argument of a call.
    pub fn materialize_all(
        &self,
        call: &str,
        params: &[Param],
        values: &[Value],
    ) -> Result<SmallVec<[Arg; 8]>, MaterializationError> {
        if params.len() != values.len() {
            return Err(MaterializationError::Arity {
                call: call.to_string(),
                expected: params.len(),
                actual: values.len(),
            });
        }
        params
            .iter()
            .zip(values)
            .map(|(param, value)| self.materialize(call, param, value))
            .collect()
    }

    /// Materialize one argument.
    pub fn materialize(
        &self,
        call: &str,
        param: &Param,
        value: &Value,
    ) -> Result<Arg, MaterializationError> {
        let cx = Context { call, param };
        match param.kind {
            ParamKind::Bool => match value {
                Value::Bool(v) => Ok(Arg::Bool(*v)),
                Value::SInt(v) => Ok(Arg::Bool(*v != 0)),
                Value::UInt(v) => Ok(Arg::Bool(*v != 0)),
                other => Err(cx.mismatch(other)),
            },
            ParamKind::Int => cx.integer(value).map(Arg::Int),
            ParamKind::UInt => cx.integer(value).map(Arg::UInt),
            ParamKind::Size => match value {
                Value::Pointer(addr) => cx.convert(i128::from(*addr)).map(Arg::Size),
                other => cx.integer(other).map(Arg::Size),
            },
            ParamKind::Float => cx.float(value).map(|v| Arg::Float(v as f32)),
            ParamKind::Double => cx.float(value).map(Arg::Double),
            ParamKind::FloatArray => cx
                .elements(value, |v| cx.float(v).map(|f| f as f32))
                .map(Arg::Floats),
            ParamKind::IntArray => cx.elements(value, |v| cx.integer(v)).map(Arg::Ints),
            ParamKind::ClientPointer => cx.client_pointer(value).map(Arg::Pointer),
            ParamKind::PointerArray => cx
                .elements(value, |v| cx.client_pointer(v))
                .map(Arg::Pointers),
            ParamKind::Blob => match value {
                Value::Null => Ok(Arg::Bytes(None)),
                Value::Blob(bytes) => Ok(Arg::Bytes(Some(bytes.clone()))),
                Value::String(s) => Ok(Arg::Bytes(Some(s.as_bytes().to_vec()))),
                other => Err(cx.mismatch(other)),
            },
            ParamKind::Handle(kind) => cx
                .integer(value)
                .map(|name| Arg::UInt(self.handles.get(kind, name))),
            ParamKind::Handles(kind) => cx
                .elements(value, |v| {
                    cx.integer(v).map(|name| self.handles.get(kind, name))
                })
                .map(Arg::UInts),
            ParamKind::GenNames(_) => cx.elements(value, |v| cx.integer(v)).map(Arg::UInts),
        }
    }

    /// Record the names a generator call returned against the recorded ones.
    pub fn bind_generated(&mut self, params: &[Param], args: &[Arg], generated: &[u32]) {
        let recorded = params.iter().zip(args).find_map(|(param, arg)| match (param.kind, arg) {
            (ParamKind::GenNames(kind), Arg::UInts(names)) => Some((kind, names)),
            _ => None,
        });
        if let Some((kind, names)) = recorded {
            for (&old, &new) in names.iter().zip(generated) {
                self.handles.insert(kind, old, new);
            }
        }
    }
}

/// Call and parameter a conversion runs for, for error reporting.
struct Context<'a> {
    call: &'a str,
    param: &'a Param,
}

impl Context<'_> {
    fn mismatch(&self, value: &Value) -> MaterializationError {
        MaterializationError::TypeMismatch {
            call: self.call.to_string(),
            param: self.param.name,
            found: value.kind_name(),
        }
    }

    fn out_of_range(&self, value: impl ToString) -> MaterializationError {
        MaterializationError::OutOfRange {
            call: self.call.to_string(),
            param: self.param.name,
            value: value.to_string(),
        }
    }

    fn convert<T: TryFrom<i128>>(&self, value: i128) -> Result<T, MaterializationError> {
        T::try_from(value).map_err(|_| self.out_of_range(value))
    }

    /// Integral values, including floats with no fractional part.
    fn integer<T: TryFrom<i128>>(&self, value: &Value) -> Result<T, MaterializationError> {
        match number(value) {
            Some(Number::Int(v)) => self.convert(v),
            Some(Number::Float(v)) if v.fract() == 0.0 && v.abs() < 1e30 => {
                self.convert(v as i128)
            }
            Some(Number::Float(v)) => Err(self.out_of_range(v)),
            None => Err(self.mismatch(value)),
        }
    }

    fn float(&self, value: &Value) -> Result<f64, MaterializationError> {
        match number(value) {
            Some(Number::Int(v)) => Ok(v as f64),
            Some(Number::Float(v)) => Ok(v),
            None => Err(self.mismatch(value)),
        }
    }

    fn client_pointer(&self, value: &Value) -> Result<usize, MaterializationError> {
        match value {
            Value::Null => Ok(0),
            Value::Pointer(addr) => self.convert(i128::from(*addr)),
            Value::UInt(v) => self.convert(i128::from(*v)),
            Value::SInt(v) => self.convert(i128::from(*v)),
            other => Err(self.mismatch(other)),
        }
    }

    /// Arrays element-wise; null is an empty array.
    fn elements<T>(
        &self,
        value: &Value,
        convert: impl Fn(&Value) -> Result<T, MaterializationError>,
    ) -> Result<Vec<T>, MaterializationError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(values) => values.iter().map(convert).collect(),
            other => Err(self.mismatch(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(kind: ParamKind) -> Param {
        Param {
            name: "p",
            kind,
        }
    }

    fn one(kind: ParamKind, value: Value) -> Result<Arg, MaterializationError> {
        Materializer::new().materialize("glTest", &param(kind), &value)
    }

    #[test]
    fn test_client_pointer_rule() {
        assert_eq!(
            one(ParamKind::ClientPointer, Value::Null),
            Ok(Arg::Pointer(0))
        );
        assert_eq!(
            one(ParamKind::ClientPointer, Value::Pointer(0x40)),
            Ok(Arg::Pointer(0x40))
        );
        assert_eq!(
            one(ParamKind::ClientPointer, Value::UInt(12)),
            Ok(Arg::Pointer(12))
        );
        assert_eq!(
            one(ParamKind::ClientPointer, Value::SInt(16)),
            Ok(Arg::Pointer(16))
        );
        assert!(matches!(
            one(ParamKind::ClientPointer, Value::SInt(-1)),
            Err(MaterializationError::OutOfRange { .. })
        ));
        assert!(matches!(
            one(ParamKind::ClientPointer, Value::String("x".into())),
            Err(MaterializationError::TypeMismatch { found: "string", .. })
        ));
        assert!(matches!(
            one(ParamKind::ClientPointer, Value::Float(1.0)),
            Err(MaterializationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_blob_client_pointer_is_rejected() {
        assert!(matches!(
            one(ParamKind::ClientPointer, Value::Blob(vec![1, 2, 3])),
            Err(MaterializationError::TypeMismatch { found: "blob", .. })
        ));
        assert!(matches!(
            one(ParamKind::PointerArray, Value::Array(vec![Value::Blob(vec![0])])),
            Err(MaterializationError::TypeMismatch { .. })
        ));
        // Owned bytes never turn into an address
        assert_eq!(usize::from_arg(&Arg::Bytes(Some(vec![1]))), None);
        assert_eq!(usize::from_arg(&Arg::Bytes(None)), None);
    }

    #[test]
    fn test_numeric_pass_through() {
        assert_eq!(one(ParamKind::Int, Value::SInt(-5)), Ok(Arg::Int(-5)));
        assert_eq!(one(ParamKind::UInt, Value::SInt(0x8892)), Ok(Arg::UInt(0x8892)));
        assert_eq!(one(ParamKind::Float, Value::Double(0.5)), Ok(Arg::Float(0.5)));
        assert_eq!(one(ParamKind::Double, Value::SInt(2)), Ok(Arg::Double(2.0)));
        assert_eq!(one(ParamKind::Int, Value::Double(3.0)), Ok(Arg::Int(3)));
        assert_eq!(one(ParamKind::Bool, Value::SInt(1)), Ok(Arg::Bool(true)));
        assert_eq!(one(ParamKind::Size, Value::Pointer(8)), Ok(Arg::Size(8)));
    }

    #[test]
    fn test_numeric_range_checks() {
        assert!(matches!(
            one(ParamKind::UInt, Value::SInt(-1)),
            Err(MaterializationError::OutOfRange { .. })
        ));
        assert!(matches!(
            one(ParamKind::Int, Value::UInt(u64::MAX)),
            Err(MaterializationError::OutOfRange { .. })
        ));
        assert!(matches!(
            one(ParamKind::Int, Value::Double(1.5)),
            Err(MaterializationError::OutOfRange { .. })
        ));
        assert!(matches!(
            one(ParamKind::Float, Value::Null),
            Err(MaterializationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_arrays() {
        let floats = Value::Array(vec![Value::Double(1.0), Value::SInt(2)]);
        assert_eq!(
            one(ParamKind::FloatArray, floats),
            Ok(Arg::Floats(vec![1.0, 2.0]))
        );
        assert_eq!(one(ParamKind::IntArray, Value::Null), Ok(Arg::Ints(vec![])));
        let pointers = Value::Array(vec![Value::Null, Value::Pointer(24)]);
        assert_eq!(
            one(ParamKind::PointerArray, pointers),
            Ok(Arg::Pointers(vec![0, 24]))
        );
        assert!(matches!(
            one(ParamKind::FloatArray, Value::SInt(1)),
            Err(MaterializationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_blob_parameter() {
        assert_eq!(one(ParamKind::Blob, Value::Null), Ok(Arg::Bytes(None)));
        assert_eq!(
            one(ParamKind::Blob, Value::Blob(vec![9])),
            Ok(Arg::Bytes(Some(vec![9])))
        );
        assert!(one(ParamKind::Blob, Value::SInt(3)).is_err());
    }

    #[test]
    fn test_arity_mismatch() {
        let params = [param(ParamKind::Int), param(ParamKind::Int)];
        let result = Materializer::new().materialize_all("glTest", &params, &[Value::SInt(1)]);
        assert_eq!(
            result,
            Err(MaterializationError::Arity {
                call: "glTest".into(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_handle_remapping() {
        let mut materializer = Materializer::new();
        let params = [
            Param {
                name: "n",
                kind: ParamKind::Int,
            },
            Param {
                name: "buffers",
                kind: ParamKind::GenNames(HandleKind::Buffer),
            },
        ];
        let args = materializer
            .materialize_all(
                "glGenBuffers",
                &params,
                &[Value::SInt(2), Value::Array(vec![Value::UInt(7), Value::UInt(9)])],
            )
            .unwrap();
        materializer.bind_generated(&params, &args, &[1, 2]);

        let buffer = param(ParamKind::Handle(HandleKind::Buffer));
        assert_eq!(
            materializer.materialize("glBindBuffer", &buffer, &Value::UInt(9)),
            Ok(Arg::UInt(2))
        );
        // Unmapped names and other kinds pass through
        assert_eq!(
            materializer.materialize("glBindBuffer", &buffer, &Value::UInt(3)),
            Ok(Arg::UInt(3))
        );
        let texture = param(ParamKind::Handle(HandleKind::Texture));
        assert_eq!(
            materializer.materialize("glBindTexture", &texture, &Value::UInt(7)),
            Ok(Arg::UInt(7))
        );

        let handles = param(ParamKind::Handles(HandleKind::Buffer));
        assert_eq!(
            materializer.materialize(
                "glDeleteBuffers",
                &handles,
                &Value::Array(vec![Value::UInt(7), Value::UInt(0)])
            ),
            Ok(Arg::UInts(vec![1, 0]))
        );
        assert_eq!(materializer.handles().len(), 2);
    }
}
