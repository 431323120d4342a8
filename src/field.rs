//! Field descriptors and their compiled form with resolved size and offset.

use crate::{
    bits,
    errors::SchemaError,
    value::{FieldKind, Value},
};

/// Caller-facing description of one frame field.
///
/// `size` is the bit width; `None` infers it from the default value. The
/// default fixes the field's decode type and its value while unset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDesc {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub size: Option<usize>,
    pub default: Value,
}

impl FieldDesc {
    /// Field with an explicit bit width.
    pub fn sized(name: impl Into<String>, size: usize, default: impl Into<Value>) -> Self {
        FieldDesc {
            name: name.into(),
            size: Some(size),
            default: default.into(),
        }
    }

    /// Field whose bit width is inferred from the default value.
    pub fn inferred(name: impl Into<String>, default: impl Into<Value>) -> Self {
        FieldDesc {
            name: name.into(),
            size: None,
            default: default.into(),
        }
    }
}

/// A field bound into a frame: resolved kind, bit width, and bit offset.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) size: usize,
    pub(crate) offset: usize,
    pub(crate) default: Value,
}

impl Field {
    /// Resolves a descriptor at `offset`, fixing kind and bit width.
    ///
    /// Booleans are always 1 bit and floats always their IEEE width,
    /// overriding any explicit size. Byte arrays accept any positive explicit
    /// size or infer `len * 8` from the default. Other scalars infer their
    /// natural width and reject explicit sizes beyond it.
    pub(crate) fn resolve(desc: &FieldDesc, offset: usize) -> Result<Field, SchemaError> {
        let kind = desc.default.kind();

        let size = match kind {
            FieldKind::Bool => 1,
            FieldKind::Float32 => 32,
            FieldKind::Float64 => 64,
            FieldKind::Bytes => match desc.size {
                Some(0) => return Err(SchemaError::InvalidSize(desc.name.clone())),
                Some(size) => size,
                None => {
                    let Value::Bytes(default) = &desc.default else {
                        unreachable!()
                    };
                    if default.is_empty() {
                        return Err(SchemaError::UninferableSize(desc.name.clone()));
                    }
                    default.len() * 8
                }
            },
            FieldKind::UInt(w) | FieldKind::Int(w) => match desc.size {
                Some(0) => return Err(SchemaError::InvalidSize(desc.name.clone())),
                Some(size) if size > w.bits() => {
                    return Err(SchemaError::SizeOutOfBounds {
                        name: desc.name.clone(),
                        size,
                        max: w.bits(),
                    });
                }
                Some(size) => size,
                None => w.bits(),
            },
        };

        Ok(Field {
            name: desc.name.clone(),
            kind,
            size,
            offset,
            default: desc.default.clone(),
        })
    }

    /// Bytes needed to hold the field's bits.
    pub(crate) fn byte_width(&self) -> usize {
        bits::byte_len(self.size)
    }

    /// Snapshot of the field as a descriptor (explicit size, original default).
    pub(crate) fn desc(&self) -> FieldDesc {
        FieldDesc {
            name: self.name.clone(),
            size: Some(self.size),
            default: self.default.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_forces_one_bit() {
        let field = Field::resolve(&FieldDesc::sized("b", 9, false), 0).unwrap();
        assert_eq!(field.size, 1);
        assert_eq!(field.kind, FieldKind::Bool);
    }

    #[test]
    fn test_floats_force_ieee_width() {
        let f32_field = Field::resolve(&FieldDesc::inferred("f", 0.0f32), 0).unwrap();
        assert_eq!(f32_field.size, 32);
        let f64_field = Field::resolve(&FieldDesc::sized("d", 5, 0.0f64), 0).unwrap();
        assert_eq!(f64_field.size, 64);
    }

    #[test]
    fn test_bytes_size_from_default() {
        let field = Field::resolve(&FieldDesc::inferred("raw", vec![0u8, 0u8]), 0).unwrap();
        assert_eq!(field.size, 16);
    }

    #[test]
    fn test_bytes_explicit_size_unbounded() {
        let field = Field::resolve(&FieldDesc::sized("raw", 100, Vec::<u8>::new()), 0).unwrap();
        assert_eq!(field.size, 100);
    }

    #[test]
    fn test_empty_bytes_uninferable() {
        assert!(matches!(
            Field::resolve(&FieldDesc::inferred("raw", Vec::<u8>::new()), 0).unwrap_err(),
            SchemaError::UninferableSize(_)
        ));
    }

    #[test]
    fn test_scalar_natural_width() {
        let field = Field::resolve(&FieldDesc::inferred("n", 0u16), 0).unwrap();
        assert_eq!(field.size, 16);
    }

    #[test]
    fn test_scalar_size_out_of_bounds() {
        assert!(matches!(
            Field::resolve(&FieldDesc::sized("n", 9, 0u8), 0).unwrap_err(),
            SchemaError::SizeOutOfBounds { size: 9, max: 8, .. }
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Field::resolve(&FieldDesc::sized("n", 0, 0u8), 0).unwrap_err(),
            SchemaError::InvalidSize(_)
        ));
    }
}
