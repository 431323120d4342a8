//! Schema-driven frame codec: an ordered table of typed fields mapped onto
//! contiguous bit ranges of a [`BitBuffer`].
//!
//! A [`Frame`] owns a [`VarBank`] with one variable per field, holding the
//! live value between encodes. Encoding walks the table in offset order and
//! packs each field's current value; decoding is the exact inverse and writes
//! every decoded value back through the store, so observers fire the same way
//! they do for a manual set.
//!
//! The wire format is a packed big-endian bit stream with no header and no
//! self-description: producer and consumer must agree on an identical field
//! table out of band.

use std::collections::HashMap;

use tracing::trace;

use crate::{
    bits,
    buffer::BitBuffer,
    errors::{SchemaError, StoreError},
    field::{Field, FieldDesc},
    value::{FieldKind, Value},
    vars::{Observer, VarBank},
};

/// An ordered collection of typed fields packed into one bit-packed record.
#[derive(Debug, Default)]
pub struct Frame {
    vars: VarBank,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    bit_size: usize,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total packed size in bits.
    pub fn bit_size(&self) -> usize {
        self.bit_size
    }

    /// Total packed size in bytes.
    pub fn byte_size(&self) -> usize {
        bits::byte_len(self.bit_size)
    }

    /// Appends fields to the table, assigning each a contiguous bit offset
    /// from the running total. Repeated calls extend the table.
    ///
    /// Each field is registered in the variable store with its default as both
    /// initial and unset value. On failure the already-processed fields stay
    /// in place; discard the frame.
    pub fn add_fields(&mut self, descs: &[FieldDesc]) -> Result<(), SchemaError> {
        for desc in descs {
            if self.index.contains_key(&desc.name) {
                return Err(SchemaError::DuplicateField(desc.name.clone()));
            }

            self.vars
                .init_var(&desc.name, desc.default.clone(), HashMap::new());
            let field = Field::resolve(desc, self.bit_size)?;

            self.bit_size += field.size;
            self.index.insert(field.name.clone(), self.fields.len());
            self.fields.push(field);
        }
        Ok(())
    }

    /// Sets a field's current value. The value is coerced to the field's kind
    /// by the variable store; observers fire unless the coerced value equals
    /// the current one and the field is already set.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
        self.field(name)?;
        self.vars
            .set(name, value.into())
            .map_err(|source| wrap_store(name, source))
    }

    /// Sets a byte-array field from a string, zero-padded on the right to the
    /// field's byte width if shorter. A longer string is stored unmodified;
    /// the excess is only dropped when the frame is encoded, so reads before
    /// that see the un-truncated value.
    pub fn set_str(&self, name: &str, value: &str) -> Result<(), SchemaError> {
        let field = self.field(name)?;

        let mut buf = value.as_bytes().to_vec();
        let byte_width = field.byte_width();
        if buf.len() < byte_width {
            buf.resize(byte_width, 0);
        }
        self.vars
            .set(name, Value::Bytes(buf))
            .map_err(|source| wrap_store(name, source))
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Result<Value, SchemaError> {
        self.field(name)?;
        self.vars.get(name).map_err(|source| wrap_store(name, source))
    }

    /// Current value of a field, extracted into a concrete type.
    pub fn get_to<T>(&self, name: &str) -> Result<T, SchemaError>
    where
        T: TryFrom<Value, Error = StoreError>,
    {
        self.field(name)?;
        self.vars
            .get_to(name)
            .map_err(|source| wrap_store(name, source))
    }

    /// True iff `candidate` coerces to and equals the field's current value.
    pub fn same(&self, name: &str, candidate: &Value) -> Result<bool, SchemaError> {
        self.field(name)?;
        self.vars
            .same(name, candidate)
            .map_err(|source| wrap_store(name, source))
    }

    /// Whether a field has been explicitly set since the last reset.
    pub fn is_set(&self, name: &str) -> Result<bool, SchemaError> {
        self.field(name)?;
        self.vars
            .is_set(name)
            .map_err(|source| wrap_store(name, source))
    }

    /// Attaches a listener to a field, fired after every effective mutation,
    /// including the sets performed by [`decode`](Self::decode).
    pub fn observe(&self, name: &str, observer: Observer) -> Result<(), SchemaError> {
        self.field(name)?;
        self.vars
            .observe(name, observer)
            .map_err(|source| wrap_store(name, source))
    }

    /// Resets every field to its default, marking it unset.
    pub fn unset_all(&self) {
        self.vars.unset_all();
    }

    /// Stable snapshot of the field table in declaration order.
    pub fn fields_desc(&self) -> Vec<FieldDesc> {
        self.fields.iter().map(Field::desc).collect()
    }

    /// Independent deep copy: descriptors, values, and set-state are copied;
    /// observers are not. The copies share no mutable state.
    pub fn deep_copy(&self) -> Frame {
        Frame {
            vars: self.vars.deep_copy(),
            fields: self.fields.clone(),
            index: self.index.clone(),
            bit_size: self.bit_size,
        }
    }

    /// Packs every field's current value into a new byte vector of
    /// [`byte_size`](Self::byte_size) bytes.
    pub fn encode(&self) -> Result<Vec<u8>, SchemaError> {
        let mut buffer = BitBuffer::new(self.bit_size);
        self.encode_into(&mut buffer)?;
        Ok(buffer.into_raw())
    }

    /// Packs every field's current value into `out`. The whole slice is
    /// treated as writable; it must hold at least [`byte_size`](Self::byte_size)
    /// bytes.
    pub fn encode_to(&self, out: &mut [u8]) -> Result<(), SchemaError> {
        let mut buffer = BitBuffer::from_raw(out.to_vec());
        self.encode_into(&mut buffer)?;
        out.copy_from_slice(buffer.as_bytes());
        Ok(())
    }

    fn encode_into(&self, buffer: &mut BitBuffer) -> Result<(), SchemaError> {
        trace!(
            fields = self.fields.len(),
            bit_size = self.bit_size,
            "encoding frame"
        );

        for field in &self.fields {
            let value = self
                .vars
                .get(&field.name)
                .map_err(|source| wrap_store(&field.name, source))?;
            let offset = field.offset as isize;

            match value {
                Value::Bool(v) => buffer.set_bit(offset, v)?,
                Value::U8(v) => buffer.set_bits_from_u64(offset, v.into(), field.size)?,
                Value::U16(v) => buffer.set_bits_from_u64(offset, v.into(), field.size)?,
                Value::U32(v) => buffer.set_bits_from_u64(offset, v.into(), field.size)?,
                Value::U64(v) => buffer.set_bits_from_u64(offset, v, field.size)?,
                Value::I8(v) => buffer.set_bits_from_i64(offset, v.into(), field.size)?,
                Value::I16(v) => buffer.set_bits_from_i64(offset, v.into(), field.size)?,
                Value::I32(v) => buffer.set_bits_from_i64(offset, v.into(), field.size)?,
                Value::I64(v) => buffer.set_bits_from_i64(offset, v, field.size)?,
                Value::F32(v) => {
                    buffer.set_bits_from_raw(offset, &v.to_be_bytes(), field.size)?
                }
                Value::F64(v) => {
                    buffer.set_bits_from_raw(offset, &v.to_be_bytes(), field.size)?
                }
                Value::Bytes(mut v) => {
                    // Short values pad with zeros on the right up to the
                    // field's byte width; excess bits past the declared size
                    // are simply not written.
                    let byte_width = field.byte_width();
                    if v.len() < byte_width {
                        v.resize(byte_width, 0);
                    }
                    buffer.set_bits_from_raw(offset, &v, field.size)?;
                }
            }
        }
        Ok(())
    }

    /// Unpacks `input` into every field, in offset order. Each field is read
    /// with the strategy its kind fixes (there is no wire type tag) and
    /// written back through the variable store.
    pub fn decode(&self, input: &[u8]) -> Result<(), SchemaError> {
        let buffer = BitBuffer::from_raw_n(input.to_vec(), self.bit_size)?;
        trace!(
            fields = self.fields.len(),
            bit_size = self.bit_size,
            "decoding frame"
        );

        for field in &self.fields {
            let offset = field.offset as isize;

            let value = match field.kind {
                FieldKind::Bool => Value::Bool(buffer.get_bit(offset)?),
                FieldKind::UInt(_) => {
                    let raw = buffer.get_bits_to_u64(offset, field.size)?;
                    field.kind.narrow_unsigned(raw)
                }
                FieldKind::Int(_) => {
                    let raw = buffer.get_bits_to_i64(offset, field.size)?;
                    field.kind.narrow_signed(raw)
                }
                FieldKind::Float32 => {
                    Value::F32(f32::from_bits(buffer.get_bits_to_u64(offset, 32)? as u32))
                }
                FieldKind::Float64 => {
                    Value::F64(f64::from_bits(buffer.get_bits_to_u64(offset, 64)?))
                }
                FieldKind::Bytes => Value::Bytes(buffer.get_bits_to_raw(offset, field.size)?),
            };

            self.vars
                .set(&field.name, value)
                .map_err(|source| wrap_store(&field.name, source))?;
        }
        Ok(())
    }

    fn field(&self, name: &str) -> Result<&Field, SchemaError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()))
    }
}

fn wrap_store(name: &str, source: StoreError) -> SchemaError {
    SchemaError::Store {
        name: name.to_string(),
        source,
    }
}
