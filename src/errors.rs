//! Error types for buffer addressing, schema building, the variable store,
//! and bit transposition.

/// Errors produced by [`crate::buffer::BitBuffer`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// A negative index resolved to a position before the start of the buffer.
    #[error("invalid index (resolved before start of buffer)")]
    InvalidIndex,
    /// The addressed bit range extends past the logical end of the buffer.
    #[error("not enough bits from index (requested {requested} at bit {index})")]
    OutOfRange { index: usize, requested: usize },
    /// The source value or slice holds fewer bits than the requested width.
    #[error("not enough source bits (available {available}, requested {requested})")]
    InsufficientSourceBits { available: usize, requested: usize },
    /// The wrapped byte slice is too short for the declared valid-bit count.
    #[error("not enough bits in init buffer ({num_bits} bits need {needed} bytes, got {got})")]
    InsufficientBits {
        num_bits: usize,
        needed: usize,
        got: usize,
    },
    /// The input slice passed to an append holds fewer bits than requested.
    #[error("input buffer too small ({available} bits available, {requested} requested)")]
    InsufficientInputBits { available: usize, requested: usize },
    /// A multi-bit integer access requested 0 or more than 64 bits.
    #[error("invalid bit-field size {0} (must be 1..=64)")]
    InvalidSize(usize),
}

/// Errors produced when building a field table or encoding/decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// An explicit size of zero was given for a field that needs one.
    #[error("invalid size value for field '{0}' (must be >= 1)")]
    InvalidSize(String),
    /// An explicit size exceeds the natural width of the field's value type.
    #[error("size {size} for field '{name}' is out of bounds (max {max})")]
    SizeOutOfBounds {
        name: String,
        size: usize,
        max: usize,
    },
    /// The field's size was left implicit but cannot be derived from its default.
    #[error("unable to infer the size of field '{0}'")]
    UninferableSize(String),
    /// A field with the same name is already part of the frame.
    #[error("field '{0}' already exists")]
    DuplicateField(String),
    /// The named field is not part of the frame.
    #[error("field '{0}' does not exist")]
    UnknownField(String),
    /// The variable store rejected a read or write for this field.
    #[error("field '{name}': {source}")]
    Store {
        name: String,
        #[source]
        source: StoreError,
    },
    /// A buffer operation failed while encoding or decoding.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Errors produced by the [`crate::vars::VarBank`] variable store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No variable registered under this name.
    #[error("variable '{0}' does not exist")]
    UnknownVar(String),
    /// The candidate value cannot be coerced to the variable's current kind.
    #[error("cannot coerce {from} to {to}")]
    CoercionFailed {
        from: &'static str,
        to: &'static str,
    },
    /// No metadata entry registered under this key.
    #[error("variable '{name}' has no meta named '{key}'")]
    UnknownMeta { name: String, key: String },
}

/// Errors produced by [`crate::transpose::transpose_bits`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransposeError {
    /// The group width is zero.
    #[error("invalid group width (must be > 0)")]
    InvalidWidth,
    /// The buffer's bit size is not a multiple of the group width.
    #[error("bit size {bit_size} is not a multiple of group width {width}")]
    NotAligned { bit_size: usize, width: usize },
}
