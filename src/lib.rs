//! # bitframe
//!
//! Bit-precision binary buffers and a schema-driven frame codec for densely
//! bit-packed records, such as compact telemetry and control frames.
//!
//! Three pieces build on each other:
//! - [`buffer::BitBuffer`]: bit-addressable storage with arbitrary-width
//!   reads/writes, signed bit-field encoding with sign extension, negative
//!   (from-the-end) indexing, dynamic growth, and consuming reads.
//! - [`frame::Frame`]: an ordered table of named typed fields mapped onto
//!   contiguous bit ranges, encoded to and decoded from one packed byte
//!   string, with live values held in a [`vars::VarBank`].
//! - [`transpose::transpose_bits`]: a bit-level matrix transpose reordering a
//!   buffer's bits row-major to column-major.
//!
//! ## Example
//!
//! ```
//! use bitframe::field::FieldDesc;
//! use bitframe::frame::Frame;
//! use bitframe::value::Value;
//!
//! let mut frame = Frame::new();
//! frame
//!     .add_fields(&[
//!         FieldDesc::sized("id", 6, 0u8),
//!         FieldDesc::inferred("armed", false),
//!         FieldDesc::sized("temp", 9, 0i16),
//!     ])
//!     .unwrap();
//! frame.set("id", 42u8).unwrap();
//! frame.set("armed", true).unwrap();
//! frame.set("temp", -120i64).unwrap();
//!
//! let wire = frame.encode().unwrap();
//! assert_eq!(wire.len(), 2); // 16 bits, densely packed
//!
//! frame.decode(&wire).unwrap();
//! assert_eq!(frame.get("temp").unwrap(), Value::I16(-120));
//! ```

pub mod bits;
pub mod buffer;
pub mod errors;
pub mod field;
pub mod frame;
pub mod transpose;
pub mod value;
pub mod vars;
