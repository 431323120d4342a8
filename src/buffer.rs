//! Bit-addressable buffer with arbitrary-width reads and writes.
//!
//! A [`BitBuffer`] owns a byte vector plus an explicit logical bit length,
//! which may be smaller than `storage.len() * 8`. Bits are addressed MSB-first
//! within each byte. Negative indices address backward from the logical end,
//! so index `-1` always means "the last valid bit".

use crate::{bits, errors::BufferError};

/// Bit-addressable storage: a byte vector plus a logical valid-bit count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bit_size: usize,
    storage: Vec<u8>,
}

impl BitBuffer {
    /// Creates a zero-filled buffer holding `bit_size` valid bits.
    pub fn new(bit_size: usize) -> Self {
        BitBuffer {
            bit_size,
            storage: vec![0u8; bits::byte_len(bit_size)],
        }
    }

    /// Wraps `bytes`, treating every bit as valid.
    pub fn from_raw(bytes: Vec<u8>) -> Self {
        BitBuffer {
            bit_size: bytes.len() * 8,
            storage: bytes,
        }
    }

    /// Wraps `bytes` with only the first `num_bits` bits valid.
    ///
    /// Fails if `bytes` is too short to hold `num_bits` bits.
    pub fn from_raw_n(bytes: Vec<u8>, num_bits: usize) -> Result<Self, BufferError> {
        let needed = bits::byte_len(num_bits);
        if needed > bytes.len() {
            return Err(BufferError::InsufficientBits {
                num_bits,
                needed,
                got: bytes.len(),
            });
        }

        Ok(BitBuffer {
            bit_size: num_bits,
            storage: bytes,
        })
    }

    /// Wraps storage already known to hold at least `bit_size` bits.
    pub(crate) fn from_parts(storage: Vec<u8>, bit_size: usize) -> Self {
        debug_assert!(storage.len() >= bits::byte_len(bit_size));
        BitBuffer { bit_size, storage }
    }

    /// Logical number of valid bits.
    pub fn bit_size(&self) -> usize {
        self.bit_size
    }

    /// Number of bytes needed to hold the valid bits.
    pub fn byte_size(&self) -> usize {
        bits::byte_len(self.bit_size)
    }

    /// Zeroes the storage without changing the bit size.
    pub fn unset_all(&mut self) {
        self.storage.fill(0);
    }

    /// Borrowing view of the backing bytes. Any byte may carry trailing slack
    /// bits beyond [`bit_size`](Self::bit_size); the borrow ends before the
    /// next mutation, so the view can never observe a reallocation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    /// Independent snapshot of the backing bytes.
    pub fn to_raw_copy(&self) -> Vec<u8> {
        self.storage.clone()
    }

    /// Consumes the buffer, returning the backing bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.storage
    }

    /// Sets the bit at `index` (negative counts back from the end).
    pub fn set_bit(&mut self, index: isize, v: bool) -> Result<(), BufferError> {
        let idx = self.resolve_index(index, 1, None)?;
        bits::set_bit_at(&mut self.storage, idx, v);
        Ok(())
    }

    /// Reads the bit at `index` (negative counts back from the end).
    pub fn get_bit(&self, index: isize) -> Result<bool, BufferError> {
        let idx = self.resolve_index(index, 1, None)?;
        Ok(bits::get_bit_at(&self.storage, idx))
    }

    /// Packs the low `size` bits of `v` at `index`, MSB-first.
    pub fn set_bits_from_u64(
        &mut self,
        index: isize,
        v: u64,
        size: usize,
    ) -> Result<(), BufferError> {
        check_int_size(size)?;
        let idx = self.resolve_index(index, size, Some(64))?;

        for i in 0..size {
            let bit = (v >> (size - 1 - i)) & 1 != 0;
            bits::set_bit_at(&mut self.storage, idx + i, bit);
        }
        Ok(())
    }

    /// Unpacks `size` bits at `index` as an unsigned value, MSB-first.
    pub fn get_bits_to_u64(&self, index: isize, size: usize) -> Result<u64, BufferError> {
        check_int_size(size)?;
        let idx = self.resolve_index(index, size, Some(64))?;

        let mut v = 0u64;
        for i in 0..size {
            v = (v << 1) | bits::get_bit_at(&self.storage, idx + i) as u64;
        }
        Ok(v)
    }

    /// Packs the low `size` bits of `v` at `index`. Shares the unsigned write
    /// path; the sign lands in the field's top bit.
    pub fn set_bits_from_i64(
        &mut self,
        index: isize,
        v: i64,
        size: usize,
    ) -> Result<(), BufferError> {
        self.set_bits_from_u64(index, v as u64, size)
    }

    /// Unpacks `size` bits at `index` as a signed value, sign-extending the
    /// field's top bit into the full 64-bit result.
    pub fn get_bits_to_i64(&self, index: isize, size: usize) -> Result<i64, BufferError> {
        let raw = self.get_bits_to_u64(index, size)?;
        Ok(bits::sign_extend(raw, size))
    }

    /// Copies the first `size` bits of `src` (MSB-first) to `index`.
    pub fn set_bits_from_raw(
        &mut self,
        index: isize,
        src: &[u8],
        size: usize,
    ) -> Result<(), BufferError> {
        let idx = self.resolve_index(index, size, Some(src.len() * 8))?;

        for i in 0..size {
            bits::set_bit_at(&mut self.storage, idx + i, bits::get_bit_at(src, i));
        }
        Ok(())
    }

    /// Extracts `size` bits at `index` into a newly allocated byte vector of
    /// `ceil(size / 8)` bytes. Trailing pad bits are zero.
    pub fn get_bits_to_raw(&self, index: isize, size: usize) -> Result<Vec<u8>, BufferError> {
        let idx = self.resolve_index(index, size, None)?;

        let mut out = vec![0u8; bits::byte_len(size)];
        for i in 0..size {
            if bits::get_bit_at(&self.storage, idx + i) {
                bits::set_bit_at(&mut out, i, true);
            }
        }
        Ok(out)
    }

    /// Appends the first `num_bits` bits of `input` at the logical end,
    /// growing the storage by exactly the bytes needed beyond current slack.
    pub fn write(&mut self, input: &[u8], num_bits: usize) -> Result<(), BufferError> {
        let available = input.len() * 8;
        if available < num_bits {
            return Err(BufferError::InsufficientInputBits {
                available,
                requested: num_bits,
            });
        }

        let free_bits = self.storage.len() * 8 - self.bit_size;
        if free_bits < num_bits {
            let extra_bytes = bits::byte_len(num_bits - free_bits);
            tracing::trace!(extra_bytes, bit_size = self.bit_size, "growing bit buffer");
            self.storage
                .resize(self.storage.len() + extra_bytes, 0u8);
        }

        let original_bit_size = self.bit_size;
        self.bit_size += num_bits;
        self.set_bits_from_raw(original_bit_size as isize, input, num_bits)
    }

    /// Consumes the first `num_bits` bits (clamped to the bit size) into a new
    /// buffer. The remainder shifts to the front and the storage shrinks to
    /// the minimal byte count for the reduced size.
    pub fn read(&mut self, num_bits: usize) -> Result<BitBuffer, BufferError> {
        let num_bits = num_bits.min(self.bit_size);
        let out_raw = self.get_bits_to_raw(0, num_bits)?;
        let out = BitBuffer::from_raw_n(out_raw, num_bits)?;

        let new_bit_size = self.bit_size - num_bits;
        let full_bytes = num_bits / 8;
        let pad = num_bits % 8;

        let mut remainder = vec![0u8; bits::byte_len(new_bit_size)];
        for (i, b) in remainder.iter_mut().enumerate() {
            *b = self.storage[i + full_bytes] << pad;
            if pad != 0 && i + full_bytes + 1 < self.storage.len() {
                *b |= self.storage[i + full_bytes + 1] >> (8 - pad);
            }
        }

        self.storage = remainder;
        self.bit_size = new_bit_size;
        Ok(out)
    }

    /// Consumes the trailing `num_bits` bits (clamped to the bit size) into a
    /// new buffer. Unlike [`read`](Self::read), the storage is not shrunk: the
    /// vacated tail stays as slack for later appends, since no bits move.
    pub fn read_end(&mut self, num_bits: usize) -> Result<BitBuffer, BufferError> {
        let num_bits = num_bits.min(self.bit_size);
        let out_raw = self.get_bits_to_raw((self.bit_size - num_bits) as isize, num_bits)?;
        let out = BitBuffer::from_raw_n(out_raw, num_bits)?;

        self.bit_size -= num_bits;
        Ok(out)
    }

    /// Resolves a possibly-negative bit index against the current bit size.
    ///
    /// A negative index addresses backward from the end: the resolved index is
    /// `bit_size + index - required_size + 1`, so index `-1` addresses the
    /// last `required_size` bits. `source_bits`, when given, bounds the number
    /// of bits the counterpart value can supply.
    fn resolve_index(
        &self,
        index: isize,
        required_size: usize,
        source_bits: Option<usize>,
    ) -> Result<usize, BufferError> {
        let actual = if index < 0 {
            let actual = self.bit_size as isize + index - required_size as isize + 1;
            if actual < 0 {
                return Err(BufferError::InvalidIndex);
            }
            actual as usize
        } else {
            index as usize
        };

        if let Some(available) = source_bits
            && available < required_size
        {
            return Err(BufferError::InsufficientSourceBits {
                available,
                requested: required_size,
            });
        }

        if self.bit_size < actual + required_size {
            return Err(BufferError::OutOfRange {
                index: actual,
                requested: required_size,
            });
        }

        Ok(actual)
    }
}

fn check_int_size(size: usize) -> Result<(), BufferError> {
    if size == 0 || size > 64 {
        return Err(BufferError::InvalidSize(size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_grows_from_empty() {
        let mut buf = BitBuffer::default();
        buf.write(&[0x55, 0x44, 0x3f], 20).unwrap();
        assert_eq!(buf.to_raw_copy(), vec![0x55, 0x44, 0x30]);
        assert_eq!(buf.bit_size(), 20);

        buf.write(&[0x32, 0x21, 0x10, 0x0f], 28).unwrap();
        assert_eq!(buf.to_raw_copy(), vec![0x55, 0x44, 0x33, 0x22, 0x11, 0x00]);
        assert_eq!(buf.bit_size(), 48);
    }

    #[test]
    fn test_write_input_too_small() {
        let mut buf = BitBuffer::default();
        assert_eq!(
            buf.write(&[0x55], 9).unwrap_err(),
            BufferError::InsufficientInputBits {
                available: 8,
                requested: 9
            }
        );
    }

    #[test]
    fn test_set_bit_out_of_bounds() {
        let mut buf = BitBuffer::new(64);
        assert!(buf.set_bit(64, false).is_err());
    }

    #[test]
    fn test_set_last_bit_true() {
        let mut buf = BitBuffer::new(64);
        buf.set_bit(63, true).unwrap();
        assert!(buf.get_bit(63).unwrap());
        assert!(buf.get_bit(-1).unwrap());
    }

    #[test]
    fn test_negative_index_on_byte() {
        let mut buf = BitBuffer::new(8);
        buf.set_bit(-1, true).unwrap();
        assert!(buf.get_bit(7).unwrap());
    }

    #[test]
    fn test_set_last_bit_false() {
        let mut buf = BitBuffer::new(64);
        buf.set_bit(63, true).unwrap();
        buf.set_bit(62, true).unwrap();
        buf.set_bit(63, false).unwrap();
        assert!(!buf.get_bit(63).unwrap());
        assert!(buf.get_bit(62).unwrap());
        assert!(buf.get_bit(-2).unwrap());
        buf.set_bit(-2, false).unwrap();
        assert!(!buf.get_bit(-2).unwrap());
    }

    #[test]
    fn test_unset_all() {
        let mut buf = BitBuffer::new(64);
        buf.set_bit(63, true).unwrap();
        buf.unset_all();
        assert!(!buf.get_bit(63).unwrap());
        assert_eq!(buf.bit_size(), 64);
    }

    #[test]
    fn test_get_bits_unaligned() {
        let buf = BitBuffer::from_raw(vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(buf.get_bits_to_u64(4, 8).unwrap(), 0x23);
        assert_eq!(buf.get_bits_to_u64(24, 4).unwrap(), 0x07);
    }

    #[test]
    fn test_get_bits_crossing_byte_boundary() {
        let buf = BitBuffer::from_raw(vec![0x12, 0b0000_0010, 0b1000_0000, 0x78]);
        assert_eq!(buf.get_bits_to_u64(14, 4).unwrap(), 0b1010);
    }

    #[test]
    fn test_get_bits_right_bound_error() {
        let buf = BitBuffer::from_raw(vec![0x12, 0x34, 0x56, 0x78]);
        assert!(buf.get_bits_to_u64(25, 8).is_err());
    }

    #[test]
    fn test_get_bits_negative_index() {
        let buf = BitBuffer::from_raw(vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(buf.get_bits_to_u64(-5, 8).unwrap(), 0x67);
    }

    #[test]
    fn test_invalid_int_size() {
        let buf = BitBuffer::new(64);
        assert_eq!(
            buf.get_bits_to_u64(0, 0).unwrap_err(),
            BufferError::InvalidSize(0)
        );
        assert_eq!(
            buf.get_bits_to_u64(0, 65).unwrap_err(),
            BufferError::InvalidSize(65)
        );
    }

    #[test]
    fn test_set_3bit_signed_int() {
        let mut buf = BitBuffer::from_raw(vec![0x00, 0x00, 0x00, 0x00]);
        buf.set_bits_from_i64(0, -2, 3).unwrap();
        assert_eq!(buf.to_raw_copy(), vec![0b1100_0000, 0, 0, 0]);
        assert_eq!(buf.get_bits_to_i64(0, 3).unwrap(), -2);
    }

    #[test]
    fn test_set_bits_from_raw() {
        let mut buf = BitBuffer::from_raw(vec![0x00, 0x00, 0x00, 0x00]);
        buf.set_bits_from_raw(4, &[0x55, 0x44, 0x0f], 20).unwrap();
        assert_eq!(buf.to_raw_copy(), vec![0x05, 0x54, 0x40, 0x00]);
    }

    #[test]
    fn test_set_bits_from_raw_source_too_small() {
        let mut buf = BitBuffer::new(64);
        assert_eq!(
            buf.set_bits_from_raw(0, &[0x55], 9).unwrap_err(),
            BufferError::InsufficientSourceBits {
                available: 8,
                requested: 9
            }
        );
    }

    #[test]
    fn test_get_bits_to_raw() {
        let buf = BitBuffer::from_raw(vec![0x05, 0x54, 0x43, 0x32, 0x2f]);
        assert_eq!(
            buf.get_bits_to_raw(4, 28).unwrap(),
            vec![0x55, 0x44, 0x33, 0x20]
        );
    }

    #[test]
    fn test_resolve_index() {
        let buf = BitBuffer::new(10);

        assert!(buf.resolve_index(-11, 10, Some(10)).is_err());
        assert_eq!(buf.resolve_index(-10, 1, Some(1)).unwrap(), 0);
        assert!(buf.resolve_index(-10, 2, Some(2)).is_err());
        assert!(buf.resolve_index(-10, 11, Some(11)).is_err());
        assert!(buf.resolve_index(-10, 10, Some(9)).is_err());
        assert_eq!(buf.resolve_index(0, 10, Some(10)).unwrap(), 0);
        assert!(buf.resolve_index(1, 10, Some(10)).is_err());
        assert!(buf.resolve_index(9, 2, Some(2)).is_err());
        assert!(buf.resolve_index(10, 1, Some(1)).is_err());
    }

    #[test]
    fn test_from_raw_n_too_short() {
        assert_eq!(
            BitBuffer::from_raw_n(vec![0x11], 9).unwrap_err(),
            BufferError::InsufficientBits {
                num_bits: 9,
                needed: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_read_4() {
        let mut buf = BitBuffer::from_raw_n(vec![0x11, 0x22, 0x33, 0x4f], 28).unwrap();
        let out = buf.read(4).unwrap();
        assert_eq!(out.as_bytes(), &[0x10]);
        assert_eq!(out.bit_size(), 4);
        assert_eq!(buf.bit_size(), 24);
    }

    #[test]
    fn test_read_8() {
        let mut buf = BitBuffer::from_raw_n(vec![0x11, 0x22, 0x33, 0x4f], 28).unwrap();
        let out = buf.read(8).unwrap();
        assert_eq!(out.as_bytes(), &[0x11]);
        assert_eq!(buf.as_bytes(), &[0x22, 0x33, 0x4f]);
    }

    #[test]
    fn test_read_12() {
        let mut buf = BitBuffer::from_raw_n(vec![0x11, 0x22, 0x33, 0x4f], 28).unwrap();
        let out = buf.read(12).unwrap();
        assert_eq!(out.as_bytes(), &[0x11, 0x20]);
        assert_eq!(out.bit_size(), 12);

        // Remainder shifted to the front, storage shrunk to 2 bytes.
        assert_eq!(buf.bit_size(), 16);
        assert_eq!(buf.as_bytes(), &[0x23, 0x34]);
    }

    #[test]
    fn test_read_clamps_to_bit_size() {
        let mut buf = BitBuffer::from_raw_n(vec![0x11, 0x22], 12).unwrap();
        let out = buf.read(100).unwrap();
        assert_eq!(out.bit_size(), 12);
        assert_eq!(out.as_bytes(), &[0x11, 0x20]);
        assert_eq!(buf.bit_size(), 0);
        assert_eq!(buf.as_bytes().len(), 0);
    }

    #[test]
    fn test_read_end_8() {
        let mut buf = BitBuffer::from_raw_n(vec![0x11, 0x22, 0x33, 0x4f], 28).unwrap();
        let out = buf.read_end(8).unwrap();
        assert_eq!(out.as_bytes(), &[0x34]);
        assert_eq!(buf.bit_size(), 20);
        // Storage keeps its length; the tail becomes slack.
        assert_eq!(buf.as_bytes().len(), 4);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut buf = BitBuffer::new(16);
        let copy = buf.clone();
        buf.set_bit(0, true).unwrap();
        assert!(!copy.get_bit(0).unwrap());
    }

    proptest::proptest! {
        #[test]
        fn prop_u64_bit_field_round_trip(
            v in proptest::prelude::any::<u64>(),
            size in 1usize..=64,
            offset in 0usize..64,
        ) {
            let mut buf = BitBuffer::new(128);
            buf.set_bits_from_u64(offset as isize, v, size).unwrap();
            let read = buf.get_bits_to_u64(offset as isize, size).unwrap();
            let mask = if size == 64 { u64::MAX } else { (1u64 << size) - 1 };
            proptest::prop_assert_eq!(read, v & mask);
        }

        #[test]
        fn prop_i64_sign_round_trip(
            v in -1024i64..1024,
            offset in 0usize..64,
        ) {
            let mut buf = BitBuffer::new(128);
            buf.set_bits_from_i64(offset as isize, v, 11).unwrap();
            proptest::prop_assert_eq!(buf.get_bits_to_i64(offset as isize, 11).unwrap(), v);
        }

        #[test]
        fn prop_front_drain_preserves_tail(
            bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 2..16),
            take in 1usize..64,
        ) {
            let bit_size = bytes.len() * 8;
            proptest::prop_assume!(take < bit_size);

            let original = BitBuffer::from_raw(bytes);
            let mut buf = original.clone();
            let head = buf.read(take).unwrap();

            proptest::prop_assert_eq!(head.bit_size(), take);
            proptest::prop_assert_eq!(buf.bit_size(), bit_size - take);
            for i in 0..(bit_size - take) {
                proptest::prop_assert_eq!(
                    buf.get_bit(i as isize).unwrap(),
                    original.get_bit((take + i) as isize).unwrap()
                );
            }
        }
    }
}
