//! XOR row helpers
//!
//! Every OKVS decode is an XOR of storage rows, optionally selected by a
//! dense bit vector (the inner product with the right-hand rows).

use rand::{CryptoRng, RngCore};

/// XOR src into dst in place
#[inline]
pub fn xor_into(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// XOR the rows at the given indices together
pub fn xor_rows<'a, I>(rows: &[Vec<u8>], indices: I, byte_l: usize) -> Vec<u8>
where
    I: IntoIterator<Item = &'a usize>,
{
    let mut result = vec![0u8; byte_l];
    for &idx in indices {
        xor_into(&mut result, &rows[idx]);
    }
    result
}

/// Read bit `i` of a big-endian packed bit vector
#[inline]
pub fn get_bit(bits: &[u8], i: usize) -> bool {
    (bits[i / 8] >> (7 - (i % 8))) & 1 == 1
}

/// Inner product of a bit vector with rows: XOR of `rows[i]` for every set bit `i`
pub fn inner_product(rows: &[Vec<u8>], bits: &[u8], byte_l: usize) -> Vec<u8> {
    let mut result = vec![0u8; byte_l];
    for (i, row) in rows.iter().enumerate() {
        if get_bit(bits, i) {
            xor_into(&mut result, row);
        }
    }
    result
}

/// Fresh random row of `byte_l` bytes
pub fn random_row<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, byte_l: usize) -> Vec<u8> {
    let mut row = vec![0u8; byte_l];
    rng.fill_bytes(&mut row);
    row
}
