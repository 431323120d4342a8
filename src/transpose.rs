//! Bit-level matrix transpose of a [`BitBuffer`].
//!
//! The buffer's bits are read as a row-major matrix of `group_width` columns
//! and emitted column-major, interleaving the groups. Transposing with width
//! `w` and then with the first result's row count restores the original.

use crate::{bits, buffer::BitBuffer, errors::TransposeError};

/// Reorders `input` as a `bit_size / group_width` by `group_width` matrix read
/// out column-major: output bit `col * num_rows + row` is input bit
/// `row * group_width + col`.
pub fn transpose_bits(
    input: &BitBuffer,
    group_width: usize,
) -> Result<BitBuffer, TransposeError> {
    if group_width == 0 {
        return Err(TransposeError::InvalidWidth);
    }
    let bit_size = input.bit_size();
    if bit_size % group_width != 0 {
        return Err(TransposeError::NotAligned {
            bit_size,
            width: group_width,
        });
    }

    let num_rows = bit_size / group_width;
    let src = input.as_bytes();
    let mut out = vec![0u8; bits::byte_len(bit_size)];

    let mut dst_bit = 0;
    for col in 0..group_width {
        for row in 0..num_rows {
            if bits::get_bit_at(src, row * group_width + col) {
                bits::set_bit_at(&mut out, dst_bit, true);
            }
            dst_bit += 1;
        }
    }
    Ok(BitBuffer::from_parts(out, bit_size))
}
