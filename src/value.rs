//! Runtime values held by the variable store and packed into frames.
//!
//! [`Value`] is a closed set of variants; every variant maps to exactly one
//! [`FieldKind`], which carries the decode strategy and natural bit width for
//! a frame field. Numeric coercion between variants is range-checked.

use crate::errors::StoreError;

/// A typed value: the closed set of types a frame field can hold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
}

/// Width of an integer field kind, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> usize {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

/// Decode strategy and natural width of a frame field, fixed by the field's
/// default value at schema-build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    Bool,
    UInt(IntWidth),
    Int(IntWidth),
    Float32,
    Float64,
    Bytes,
}

impl FieldKind {
    /// Natural bit width of the kind, or `None` for byte arrays (whose width
    /// depends on the value length).
    pub fn natural_bits(self) -> Option<usize> {
        match self {
            FieldKind::Bool => Some(1),
            FieldKind::UInt(w) | FieldKind::Int(w) => Some(w.bits()),
            FieldKind::Float32 => Some(32),
            FieldKind::Float64 => Some(64),
            FieldKind::Bytes => None,
        }
    }

    /// Re-narrows a raw unsigned bit-field read to the kind's concrete width.
    /// Only meaningful for `UInt` kinds.
    pub(crate) fn narrow_unsigned(self, raw: u64) -> Value {
        match self {
            FieldKind::UInt(IntWidth::W8) => Value::U8(raw as u8),
            FieldKind::UInt(IntWidth::W16) => Value::U16(raw as u16),
            FieldKind::UInt(IntWidth::W32) => Value::U32(raw as u32),
            _ => Value::U64(raw),
        }
    }

    /// Re-narrows a sign-extended bit-field read to the kind's concrete width.
    /// Only meaningful for `Int` kinds.
    pub(crate) fn narrow_signed(self, raw: i64) -> Value {
        match self {
            FieldKind::Int(IntWidth::W8) => Value::I8(raw as i8),
            FieldKind::Int(IntWidth::W16) => Value::I16(raw as i16),
            FieldKind::Int(IntWidth::W32) => Value::I32(raw as i32),
            _ => Value::I64(raw),
        }
    }
}

impl Value {
    /// The field kind this value fixes.
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Bool(_) => FieldKind::Bool,
            Value::U8(_) => FieldKind::UInt(IntWidth::W8),
            Value::U16(_) => FieldKind::UInt(IntWidth::W16),
            Value::U32(_) => FieldKind::UInt(IntWidth::W32),
            Value::U64(_) => FieldKind::UInt(IntWidth::W64),
            Value::I8(_) => FieldKind::Int(IntWidth::W8),
            Value::I16(_) => FieldKind::Int(IntWidth::W16),
            Value::I32(_) => FieldKind::Int(IntWidth::W32),
            Value::I64(_) => FieldKind::Int(IntWidth::W64),
            Value::F32(_) => FieldKind::Float32,
            Value::F64(_) => FieldKind::Float64,
            Value::Bytes(_) => FieldKind::Bytes,
        }
    }

    /// Short type name used in coercion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bytes(_) => "bytes",
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::U8(v) => Some(v as i128),
            Value::U16(v) => Some(v as i128),
            Value::U32(v) => Some(v as i128),
            Value::U64(v) => Some(v as i128),
            Value::I8(v) => Some(v as i128),
            Value::I16(v) => Some(v as i128),
            Value::I32(v) => Some(v as i128),
            Value::I64(v) => Some(v as i128),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// Coerces this value to `kind`, range-checking integer conversions.
    ///
    /// Booleans and byte arrays only coerce to themselves; integers convert
    /// between widths and signedness when the value fits; floats convert
    /// between each other and accept integer sources.
    pub fn coerce_to(&self, kind: FieldKind) -> Result<Value, StoreError> {
        let fail = || StoreError::CoercionFailed {
            from: self.type_name(),
            to: kind_name(kind),
        };

        match kind {
            FieldKind::Bool => match self {
                Value::Bool(v) => Ok(Value::Bool(*v)),
                _ => Err(fail()),
            },
            FieldKind::Bytes => match self {
                Value::Bytes(v) => Ok(Value::Bytes(v.clone())),
                _ => Err(fail()),
            },
            FieldKind::UInt(w) => {
                let v = self.as_i128().ok_or_else(fail)?;
                let max = match w {
                    IntWidth::W8 => u8::MAX as i128,
                    IntWidth::W16 => u16::MAX as i128,
                    IntWidth::W32 => u32::MAX as i128,
                    IntWidth::W64 => u64::MAX as i128,
                };
                if v < 0 || v > max {
                    return Err(fail());
                }
                Ok(match w {
                    IntWidth::W8 => Value::U8(v as u8),
                    IntWidth::W16 => Value::U16(v as u16),
                    IntWidth::W32 => Value::U32(v as u32),
                    IntWidth::W64 => Value::U64(v as u64),
                })
            }
            FieldKind::Int(w) => {
                let v = self.as_i128().ok_or_else(fail)?;
                let (min, max) = match w {
                    IntWidth::W8 => (i8::MIN as i128, i8::MAX as i128),
                    IntWidth::W16 => (i16::MIN as i128, i16::MAX as i128),
                    IntWidth::W32 => (i32::MIN as i128, i32::MAX as i128),
                    IntWidth::W64 => (i64::MIN as i128, i64::MAX as i128),
                };
                if v < min || v > max {
                    return Err(fail());
                }
                Ok(match w {
                    IntWidth::W8 => Value::I8(v as i8),
                    IntWidth::W16 => Value::I16(v as i16),
                    IntWidth::W32 => Value::I32(v as i32),
                    IntWidth::W64 => Value::I64(v as i64),
                })
            }
            FieldKind::Float32 => Ok(Value::F32(self.as_f64().ok_or_else(fail)? as f32)),
            FieldKind::Float64 => Ok(Value::F64(self.as_f64().ok_or_else(fail)?)),
        }
    }
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Bool => "bool",
        FieldKind::UInt(IntWidth::W8) => "u8",
        FieldKind::UInt(IntWidth::W16) => "u16",
        FieldKind::UInt(IntWidth::W32) => "u32",
        FieldKind::UInt(IntWidth::W64) => "u64",
        FieldKind::Int(IntWidth::W8) => "i8",
        FieldKind::Int(IntWidth::W16) => "i16",
        FieldKind::Int(IntWidth::W32) => "i32",
        FieldKind::Int(IntWidth::W64) => "i64",
        FieldKind::Float32 => "f32",
        FieldKind::Float64 => "f64",
        FieldKind::Bytes => "bytes",
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Vec<u8> => Bytes,
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

macro_rules! value_try_into {
    ($($ty:ty => $kind:expr, $variant:ident);* $(;)?) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = StoreError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value.coerce_to($kind)? {
                        Value::$variant(v) => Ok(v),
                        _ => unreachable!(),
                    }
                }
            }
        )*
    };
}

value_try_into! {
    bool => FieldKind::Bool, Bool;
    u8 => FieldKind::UInt(IntWidth::W8), U8;
    u16 => FieldKind::UInt(IntWidth::W16), U16;
    u32 => FieldKind::UInt(IntWidth::W32), U32;
    u64 => FieldKind::UInt(IntWidth::W64), U64;
    i8 => FieldKind::Int(IntWidth::W8), I8;
    i16 => FieldKind::Int(IntWidth::W16), I16;
    i32 => FieldKind::Int(IntWidth::W32), I32;
    i64 => FieldKind::Int(IntWidth::W64), I64;
    f32 => FieldKind::Float32, F32;
    f64 => FieldKind::Float64, F64;
    Vec<u8> => FieldKind::Bytes, Bytes;
}
