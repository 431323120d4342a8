//! Low-level bit manipulation helpers for byte slices.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first byte.

/// Number of bytes needed to hold `num_bits` bits.
pub fn byte_len(num_bits: usize) -> usize {
    num_bits.div_ceil(8)
}

/// Reads the bit at `bit_pos` (0 = MSB of first byte).
///
/// Callers bound-check `bit_pos` against the slice length.
pub fn get_bit_at(data: &[u8], bit_pos: usize) -> bool {
    let byte_pos = bit_pos / 8;
    let bit_in_byte = bit_pos % 8;

    (data[byte_pos] & (0x80 >> bit_in_byte)) != 0
}

/// Sets or clears the bit at `bit_pos` (0 = MSB of first byte).
pub fn set_bit_at(data: &mut [u8], bit_pos: usize, v: bool) {
    let byte_pos = bit_pos / 8;
    let bit_in_byte = bit_pos % 8;

    if v {
        data[byte_pos] |= 0x80 >> bit_in_byte;
    } else {
        data[byte_pos] &= !(0x80 >> bit_in_byte);
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}
